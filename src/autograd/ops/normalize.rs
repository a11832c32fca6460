//! Normalization autograd operations: batch_norm
//!
//! Inputs are `(rows, cols)` row-major matrices; statistics are per column.

use crate::autograd::{BackwardOp, GradCell, Tensor};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use std::rc::Rc;

/// Per-column batch statistics produced by [`batch_norm`]
#[derive(Debug, Clone)]
pub struct BatchStats {
    /// Column means
    pub mean: Array1<f32>,
    /// Biased column variances
    pub var: Array1<f32>,
}

fn view(x: &Tensor, rows: usize, cols: usize) -> ArrayView2<'_, f32> {
    ArrayView2::from_shape((rows, cols), x.data().as_slice().expect("tensor data must be contiguous"))
        .expect("batch_norm: input shape mismatch")
}

/// Batch normalization with batch statistics
///
/// y = gamma * (x - mean_batch) / sqrt(var_batch + eps) + beta
pub fn batch_norm(
    x: &Tensor,
    gamma: &Tensor,
    beta: &Tensor,
    rows: usize,
    cols: usize,
    eps: f32,
) -> (Tensor, BatchStats) {
    assert_eq!(x.len(), rows * cols, "batch_norm: input is not {rows}x{cols}");
    assert_eq!(gamma.len(), cols, "batch_norm: gamma must have {cols} entries");
    assert_eq!(beta.len(), cols, "batch_norm: beta must have {cols} entries");

    let x2 = view(x, rows, cols);
    let mean = x2.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(cols));
    let centered = &x2 - &mean;
    let var = centered.mapv(|v| v * v).mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(cols));
    let inv_std = var.mapv(|v| 1.0 / (v + eps).sqrt());
    let normalized = &centered * &inv_std;
    let out = &normalized * gamma.data() + beta.data();

    let requires_grad = x.requires_grad() || gamma.requires_grad() || beta.requires_grad();
    let mut result = Tensor::new(Array1::from_iter(out.into_iter()), requires_grad);

    if requires_grad {
        let backward_op = Rc::new(BatchNormBackward {
            x: x.clone(),
            gamma: gamma.clone(),
            beta: beta.clone(),
            normalized,
            inv_std,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    (result, BatchStats { mean, var })
}

struct BatchNormBackward {
    x: Tensor,
    gamma: Tensor,
    beta: Tensor,
    normalized: Array2<f32>,
    inv_std: Array1<f32>,
    result_grad: GradCell,
}

impl BackwardOp for BatchNormBackward {
    fn inputs(&self) -> Vec<&Tensor> {
        vec![&self.x, &self.gamma, &self.beta]
    }

    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            let (rows, cols) = self.normalized.dim();
            let Ok(dy) = ArrayView2::from_shape((rows, cols), grad.as_slice().unwrap_or(&[])) else {
                return;
            };

            if self.beta.requires_grad() {
                self.beta.accumulate_grad(dy.sum_axis(Axis(0)));
            }
            if self.gamma.requires_grad() {
                self.gamma.accumulate_grad((&dy * &self.normalized).sum_axis(Axis(0)));
            }
            if self.x.requires_grad() {
                // dx = inv_std / N * (N * dx̂ - Σdx̂ - x̂ * Σ(dx̂ * x̂))
                let n = rows as f32;
                let dxhat = &dy * self.gamma.data();
                let sum_dxhat = dxhat.sum_axis(Axis(0));
                let sum_dxhat_xhat = (&dxhat * &self.normalized).sum_axis(Axis(0));
                let dx = (&dxhat * n - &sum_dxhat - &self.normalized * &sum_dxhat_xhat)
                    * &(&self.inv_std / n);
                self.x.accumulate_grad(Array1::from_iter(dx.into_iter()));
            }
        }
    }
}

/// Batch normalization with fixed (running) statistics
///
/// Used in evaluation mode: an affine transform per column.
pub fn batch_norm_inference(
    x: &Tensor,
    gamma: &Tensor,
    beta: &Tensor,
    stats: &BatchStats,
    rows: usize,
    cols: usize,
    eps: f32,
) -> Tensor {
    assert_eq!(x.len(), rows * cols, "batch_norm: input is not {rows}x{cols}");

    let x2 = view(x, rows, cols);
    let inv_std = stats.var.mapv(|v| 1.0 / (v + eps).sqrt());
    let normalized = (&x2 - &stats.mean) * &inv_std;
    let out = &normalized * gamma.data() + beta.data();

    let requires_grad = x.requires_grad() || gamma.requires_grad() || beta.requires_grad();
    let mut result = Tensor::new(Array1::from_iter(out.into_iter()), requires_grad);

    if requires_grad {
        let backward_op = Rc::new(AffineNormBackward {
            x: x.clone(),
            gamma: gamma.clone(),
            beta: beta.clone(),
            normalized,
            inv_std,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct AffineNormBackward {
    x: Tensor,
    gamma: Tensor,
    beta: Tensor,
    normalized: Array2<f32>,
    inv_std: Array1<f32>,
    result_grad: GradCell,
}

impl BackwardOp for AffineNormBackward {
    fn inputs(&self) -> Vec<&Tensor> {
        vec![&self.x, &self.gamma, &self.beta]
    }

    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            let (rows, cols) = self.normalized.dim();
            let Ok(dy) = ArrayView2::from_shape((rows, cols), grad.as_slice().unwrap_or(&[])) else {
                return;
            };

            if self.beta.requires_grad() {
                self.beta.accumulate_grad(dy.sum_axis(Axis(0)));
            }
            if self.gamma.requires_grad() {
                self.gamma.accumulate_grad((&dy * &self.normalized).sum_axis(Axis(0)));
            }
            if self.x.requires_grad() {
                let scale = &self.inv_std * self.gamma.data();
                let dx = &dy * &scale;
                self.x.accumulate_grad(Array1::from_iter(dx.into_iter()));
            }
        }
    }
}
