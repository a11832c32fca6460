//! Wide (linear) component
//!
//! A generalized linear model over sparse categorical features, implemented
//! as an embedding lookup: each input column holds a feature index and the
//! prediction is the sum of the indexed rows plus a bias.
//!
//! ```text
//! x      [batch, n_features]   (feature indices, 0 = padding)
//! table  [input_dim + 1, pred_dim]
//! out[b] = Σ_j table[x[b, j]] + bias
//! ```

use super::ModelComponent;
use crate::autograd::{BackwardOp, GradCell, Tensor};
use ndarray::{s, Array1, Array2};
use std::rc::Rc;

/// Linear model over one-hot encoded features
pub struct Wide {
    /// Embedding table ((input_dim + 1) x pred_dim); row 0 is padding
    pub weight: Tensor,
    /// Bias (pred_dim)
    pub bias: Tensor,
    input_dim: usize,
    pred_dim: usize,
}

impl Wide {
    /// `input_dim` is the number of distinct feature values (indices
    /// `1..=input_dim`); `pred_dim` is the prediction width.
    pub fn new(input_dim: usize, pred_dim: usize) -> Self {
        // Uniform(-1/sqrt(fan_in), 1/sqrt(fan_in)) envelope, deterministic
        let bound = 1.0 / (input_dim.max(1) as f32).sqrt();
        let weight = (0..(input_dim + 1) * pred_dim)
            .map(|i| if i < pred_dim { 0.0 } else { (i as f32 * 0.111).sin() * bound })
            .collect();
        Self {
            weight: Tensor::from_vec(weight, true),
            bias: Tensor::zeros(pred_dim, true),
            input_dim,
            pred_dim,
        }
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn pred_dim(&self) -> usize {
        self.pred_dim
    }

    /// Row of the table addressed by a feature value, `None` for padding and
    /// out-of-range indices
    fn row(&self, value: f32) -> Option<usize> {
        if !(value >= 1.0) || value.fract() != 0.0 {
            return None;
        }
        let idx = value as usize;
        (idx <= self.input_dim).then_some(idx)
    }
}

impl ModelComponent for Wide {
    fn forward(&self, x: &Tensor, batch_size: usize) -> Tensor {
        assert!(batch_size > 0, "wide: batch_size must be > 0");
        assert_eq!(
            x.len() % batch_size,
            0,
            "wide: input of {} values is not {batch_size} rows",
            x.len()
        );
        let n_features = x.len() / batch_size;
        let table = self.weight.data();

        let mut out = Array2::<f32>::zeros((batch_size, self.pred_dim));
        let mut rows = Vec::with_capacity(x.len());
        let mut out_of_range = 0usize;

        for (i, &value) in x.data().iter().enumerate() {
            let row = self.row(value);
            if row.is_none() && value != 0.0 {
                out_of_range += 1;
            }
            if let Some(r) = row {
                let start = r * self.pred_dim;
                let mut dst = out.row_mut(i / n_features);
                dst += &table.slice(s![start..start + self.pred_dim]);
            }
            rows.push(row);
        }
        if out_of_range > 0 {
            tracing::warn!(
                out_of_range,
                input_dim = self.input_dim,
                "wide input contains feature indices outside the embedding table; they contribute zeros"
            );
        }

        out += self.bias.data();
        let requires_grad = self.weight.requires_grad() || self.bias.requires_grad();
        let mut result = Tensor::new(Array1::from_iter(out), requires_grad);

        if requires_grad {
            let backward_op = Rc::new(WideBackward {
                weight: self.weight.clone(),
                bias: self.bias.clone(),
                rows,
                n_features,
                pred_dim: self.pred_dim,
                result_grad: result.grad_cell(),
            });
            result.set_backward_op(backward_op);
        }

        result
    }

    fn output_dim(&self) -> Option<usize> {
        Some(self.pred_dim)
    }

    fn input_dim(&self) -> Option<usize> {
        Some(self.input_dim)
    }

    fn parameters(&self) -> Vec<&Tensor> {
        vec![&self.weight, &self.bias]
    }
}

struct WideBackward {
    weight: Tensor,
    bias: Tensor,
    /// Table row looked up for each input value, in input order
    rows: Vec<Option<usize>>,
    n_features: usize,
    pred_dim: usize,
    result_grad: GradCell,
}

impl BackwardOp for WideBackward {
    fn inputs(&self) -> Vec<&Tensor> {
        vec![&self.weight, &self.bias]
    }

    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            let d = self.pred_dim;

            if self.weight.requires_grad() {
                // Scatter-add into the looked-up rows; padding stays at zero
                let mut grad_table = Array1::<f32>::zeros(self.weight.len());
                for (i, row) in self.rows.iter().enumerate() {
                    if let Some(r) = row {
                        let b = i / self.n_features;
                        let mut dst = grad_table.slice_mut(s![r * d..(r + 1) * d]);
                        dst += &grad.slice(s![b * d..(b + 1) * d]);
                    }
                }
                self.weight.accumulate_grad(grad_table);
            }

            if self.bias.requires_grad() {
                let mut grad_bias = Array1::<f32>::zeros(d);
                for chunk in grad.exact_chunks(d) {
                    grad_bias += &chunk;
                }
                self.bias.accumulate_grad(grad_bias);
            }
        }
    }
}
