//! Focal loss for binary and multiclass classification
//!
//! See Lin et al., "Focal Loss for Dense Object Detection" (2017).
//!
//! ```text
//! p      = σ(x)                      (element-wise, also for C > 1 columns)
//! pt     = p·t + (1 - p)·(1 - t)
//! w      = (α·t + (1 - α)·(1 - t)) · (1 - pt)^γ      (no gradient)
//! L      = mean(w · BCE(p, t))
//! ```
//!
//! Single-column logits are expanded to `[1 - σ(x), σ(x)]` so the binary case
//! runs through the same two-class computation.
//!
//! Multiclass columns are squashed with an element-wise sigmoid rather than a
//! softmax: each class is scored as an independent binary decision.

use super::cross_entropy::{class_index, infer_classes};
use super::traits::scalar_loss;
use super::LossFn;
use crate::autograd::{sigmoid_scalar, Tensor};
use ndarray::Array1;

/// Floor applied to log terms, matching the usual BCE primitive
const LOG_FLOOR: f32 = -100.0;

/// Focal Loss
///
/// Predictions are `(batch, C)` logits (`C == 1` for binary), targets are
/// `batch` class indices.
///
/// # Example
///
/// ```
/// use widedeep::loss::{FocalLoss, LossFn};
/// use widedeep::Tensor;
///
/// let loss_fn = FocalLoss::default();
/// let logits = Tensor::from_vec(vec![0.6, 0.7, 0.3, 0.8], true);
/// let labels = Tensor::from_vec(vec![0.0, 1.0, 0.0, 1.0], false);
///
/// let loss = loss_fn.forward(&logits, &labels);
/// assert!((loss.data()[0] - 0.1762).abs() < 1e-4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocalLoss {
    alpha: f32,
    gamma: f32,
}

impl FocalLoss {
    pub const DEFAULT_ALPHA: f32 = 0.25;
    pub const DEFAULT_GAMMA: f32 = 1.0;

    pub fn new(alpha: f32, gamma: f32) -> Self {
        Self { alpha, gamma }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    /// Per-element modulating weight. Callers treat it as a constant.
    fn modulating_weight(&self, probs: &Array1<f32>, onehot: &Array1<f32>) -> Array1<f32> {
        let (alpha, gamma) = (self.alpha, self.gamma);
        probs
            .iter()
            .zip(onehot.iter())
            .map(|(&p, &t)| {
                let pt = p * t + (1.0 - p) * (1.0 - t);
                let alpha_t = alpha * t + (1.0 - alpha) * (1.0 - t);
                alpha_t * (1.0 - pt).powf(gamma)
            })
            .collect()
    }

    /// Probabilities laid out as `(batch, classes)`, plus the class count
    fn probabilities(predictions: &Tensor, columns: usize) -> (Array1<f32>, usize) {
        if columns == 1 {
            let probs = predictions
                .data()
                .iter()
                .flat_map(|&x| {
                    let p = sigmoid_scalar(x);
                    [1.0 - p, p]
                })
                .collect();
            (probs, 2)
        } else {
            (predictions.data().mapv(sigmoid_scalar), columns)
        }
    }

    fn one_hot(targets: &Tensor, classes: usize) -> Array1<f32> {
        let mut onehot = Array1::zeros(targets.len() * classes);
        for (row, &label) in targets.data().iter().enumerate() {
            onehot[row * classes + class_index(label, classes)] = 1.0;
        }
        onehot
    }

    fn bce(p: f32, t: f32) -> f32 {
        -(t * p.ln().max(LOG_FLOOR) + (1.0 - t) * (1.0 - p).ln().max(LOG_FLOOR))
    }
}

impl Default for FocalLoss {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ALPHA, Self::DEFAULT_GAMMA)
    }
}

impl LossFn for FocalLoss {
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor {
        let columns = infer_classes(predictions, targets);
        let (probs, classes) = Self::probabilities(predictions, columns);
        let onehot = Self::one_hot(targets, classes);
        let weight = self.modulating_weight(&probs, &onehot);

        let n = probs.len() as f32;
        let total: f32 = probs
            .iter()
            .zip(onehot.iter())
            .zip(weight.iter())
            .map(|((&p, &t), &w)| w * Self::bce(p, t))
            .sum();
        let loss = total / n;

        // ∂BCE(σ(x), t)/∂x = σ(x) - t; the weight is held constant
        let elem_grad = (&probs - &onehot) * &weight / n;
        let grad = if columns == 1 {
            // p1 = σ(x) contributes +, p0 = 1 - σ(x) contributes -
            Array1::from_shape_fn(predictions.len(), |row| {
                elem_grad[row * 2 + 1] - elem_grad[row * 2]
            })
        } else {
            elem_grad
        };

        scalar_loss(loss, predictions, grad)
    }

    fn name(&self) -> &'static str {
        "Focal"
    }
}
