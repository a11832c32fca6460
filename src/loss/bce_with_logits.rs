//! Binary Cross-Entropy with Logits Loss
//!
//! Combines a sigmoid activation with binary cross-entropy loss.
//!
//! # Formula
//!
//! Numerically stable computation:
//! ```text
//! L_i = w_i * (max(x_i, 0) - x_i * t_i + log(1 + exp(-|x_i|)))
//! L = mean(L_i) over all i
//! ```
//!
//! Gradient: `∂L/∂x_i = w_i * (σ(x_i) - t_i) / N`

use super::mse::assert_same_len;
use super::traits::scalar_loss;
use super::LossFn;
use crate::autograd::{sigmoid_scalar, Tensor};
use ndarray::Array1;

/// Binary Cross-Entropy with Logits Loss, optionally rescaled per element.
///
/// A single-entry `weight` rescales every element; one of the full prediction
/// length is applied element by element. Any other length panics.
///
/// # Example
///
/// ```
/// use widedeep::loss::{BCEWithLogitsLoss, LossFn};
/// use widedeep::Tensor;
///
/// let loss_fn = BCEWithLogitsLoss::new();
/// let logits = Tensor::from_vec(vec![2.0, -1.0, 0.5], true);
/// let targets = Tensor::from_vec(vec![1.0, 0.0, 1.0], false);
///
/// let loss = loss_fn.forward(&logits, &targets);
/// assert!(loss.data()[0] > 0.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BCEWithLogitsLoss {
    weight: Option<Array1<f32>>,
}

impl BCEWithLogitsLoss {
    /// Unweighted loss
    pub fn new() -> Self {
        Self { weight: None }
    }

    /// Loss rescaled by `weight`
    pub fn with_weight(weight: Option<Vec<f32>>) -> Self {
        Self { weight: weight.map(Array1::from) }
    }

    pub fn weight(&self) -> Option<&Array1<f32>> {
        self.weight.as_ref()
    }

    /// Numerically stable BCE: max(x, 0) - x*t + log(1 + exp(-|x|))
    fn stable_bce(logit: f32, target: f32) -> f32 {
        let relu = logit.max(0.0);
        relu - logit * target + (-logit.abs()).exp().ln_1p()
    }

    fn element_weights(&self, n: usize) -> Array1<f32> {
        match &self.weight {
            None => Array1::ones(n),
            Some(w) => {
                assert!(
                    w.len() == 1 || w.len() == n,
                    "weight of length {} must have 1 entry or one per prediction ({n})",
                    w.len()
                );
                if w.len() == 1 {
                    Array1::from_elem(n, w[0])
                } else {
                    w.clone()
                }
            }
        }
    }
}

impl LossFn for BCEWithLogitsLoss {
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor {
        assert_same_len(predictions, targets);

        let n = predictions.len();
        let weights = self.element_weights(n);

        let total: f32 = predictions
            .data()
            .iter()
            .zip(targets.data().iter())
            .zip(weights.iter())
            .map(|((&logit, &target), &w)| w * Self::stable_bce(logit, target))
            .sum();
        let loss = total / n as f32;

        let sigmoid = predictions.data().mapv(sigmoid_scalar);
        let grad = (&sigmoid - targets.data()) * &weights / n as f32;

        scalar_loss(loss, predictions, grad)
    }

    fn name(&self) -> &'static str {
        "BCEWithLogits"
    }
}
