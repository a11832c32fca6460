//! Loss function trait

use crate::autograd::{BackwardOp, Tensor};
use crate::trace::{TraceStep, TRACER};
use ndarray::Array1;
use std::rc::Rc;

/// Trait for loss functions
pub trait LossFn {
    /// Compute loss given predictions and targets
    ///
    /// Returns a one-element tensor wired into the tape: calling
    /// [`crate::autograd::backward`] on it pushes gradients into `predictions`
    /// and on through whatever produced them.
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor;

    /// Name of the loss function
    fn name(&self) -> &str;

    /// [`forward`](Self::forward) recorded as a [`TraceStep::Loss`] span
    fn forward_traced(&self, predictions: &Tensor, targets: &Tensor) -> Tensor {
        TRACER.span(TraceStep::Loss, self.name(), || self.forward(predictions, targets))
    }
}

/// Gradient of a scalar loss w.r.t. its predictions, precomputed in forward
struct LossBackward {
    predictions: Tensor,
    result_grad: crate::autograd::GradCell,
    grad: Array1<f32>,
}

impl BackwardOp for LossBackward {
    fn inputs(&self) -> Vec<&Tensor> {
        vec![&self.predictions]
    }

    fn backward(&self) {
        // Upstream scale (1.0 when the loss is the root)
        let upstream = self.result_grad.borrow().as_ref().map_or(1.0, |g| g[0]);
        self.predictions.accumulate_grad(&self.grad * upstream);
    }
}

/// Wrap a loss value into a tensor carrying `∂loss/∂predictions`
pub(crate) fn scalar_loss(value: f32, predictions: &Tensor, grad: Array1<f32>) -> Tensor {
    let mut loss = Tensor::from_vec(vec![value], predictions.requires_grad());

    if predictions.requires_grad() {
        loss.set_backward_op(Rc::new(LossBackward {
            predictions: predictions.clone(),
            result_grad: loss.grad_cell(),
            grad,
        }));
    }

    loss
}
