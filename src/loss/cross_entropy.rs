//! Cross Entropy Loss for multiclass classification

use super::traits::scalar_loss;
use super::LossFn;
use crate::autograd::Tensor;
use ndarray::{Array1, ArrayView1};

/// Number of classes implied by `(batch, C)` logits and `batch` labels
pub(crate) fn infer_classes(predictions: &Tensor, targets: &Tensor) -> usize {
    assert!(!targets.is_empty(), "targets must not be empty");
    assert_eq!(
        predictions.len() % targets.len(),
        0,
        "Predictions ({}) must hold one row of logits per target ({})",
        predictions.len(),
        targets.len()
    );
    predictions.len() / targets.len()
}

/// Class index stored as `f32`
pub(crate) fn class_index(label: f32, num_classes: usize) -> usize {
    let idx = label as usize;
    assert!(
        label >= 0.0 && idx < num_classes,
        "class label {label} is out of range for {num_classes} classes"
    );
    idx
}

/// Cross Entropy Loss over softmax probabilities
///
/// Predictions are `(batch, C)` logits, targets are `batch` class indices.
/// With a per-class `weight`, the reduction is the weighted mean
/// `Σ w[y_i] * nll_i / Σ w[y_i]`.
///
/// # Example
///
/// ```
/// use widedeep::loss::{CrossEntropyLoss, LossFn};
/// use widedeep::Tensor;
///
/// let loss_fn = CrossEntropyLoss::new();
/// let logits = Tensor::from_vec(vec![2.0, 1.0, 0.5, 0.1, 0.2, 3.0], true);
/// let labels = Tensor::from_vec(vec![0.0, 2.0], false);
///
/// let loss = loss_fn.forward(&logits, &labels);
/// assert!(loss.data()[0] > 0.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CrossEntropyLoss {
    weight: Option<Array1<f32>>,
}

impl CrossEntropyLoss {
    pub fn new() -> Self {
        Self { weight: None }
    }

    /// Loss with per-class rescaling weights
    pub fn with_weight(weight: Option<Vec<f32>>) -> Self {
        Self { weight: weight.map(Array1::from) }
    }

    pub fn weight(&self) -> Option<&Array1<f32>> {
        self.weight.as_ref()
    }

    /// Compute softmax: exp(x_i) / sum(exp(x_j))
    pub(crate) fn softmax(x: ArrayView1<'_, f32>) -> Array1<f32> {
        let max = x.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        let exp_x: Array1<f32> = x.mapv(|v| (v - max).exp());
        let sum: f32 = exp_x.sum();
        exp_x / sum
    }
}

impl LossFn for CrossEntropyLoss {
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor {
        let num_classes = infer_classes(predictions, targets);
        if let Some(w) = &self.weight {
            assert_eq!(w.len(), num_classes, "weight must have one entry per class");
        }

        let mut grad = Array1::<f32>::zeros(predictions.len());
        let mut total = 0.0f32;
        let mut norm = 0.0f32;

        for (row, &label) in targets.data().iter().enumerate() {
            let class = class_index(label, num_classes);
            let start = row * num_classes;
            let logits = predictions.data().slice(ndarray::s![start..start + num_classes]);
            let probs = Self::softmax(logits);
            let w = self.weight.as_ref().map_or(1.0, |w| w[class]);

            total += -w * probs[class].max(f32::MIN_POSITIVE).ln();
            norm += w;

            // w * (softmax - onehot), normalized below
            for (c, &p) in probs.iter().enumerate() {
                let onehot = if c == class { 1.0 } else { 0.0 };
                grad[start + c] = w * (p - onehot);
            }
        }

        let loss = if norm > 0.0 { total / norm } else { f32::NAN };
        let grad = if norm > 0.0 { grad / norm } else { grad };

        scalar_loss(loss, predictions, grad)
    }

    fn name(&self) -> &'static str {
        "CrossEntropy"
    }
}
