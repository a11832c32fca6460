//! Fully connected layer

use super::ModelComponent;
use crate::autograd::{add_row_bias, matmul, Tensor};

/// Fully connected layer: `y = x @ W + b`
pub struct Linear {
    /// Weight (in_features x out_features)
    pub weight: Tensor,
    /// Bias (out_features), absent when a normalization layer follows
    pub bias: Option<Tensor>,
    in_features: usize,
    out_features: usize,
}

impl Linear {
    /// Create a layer with deterministic Xavier-scaled weights and zero bias
    pub fn new(in_features: usize, out_features: usize) -> Self {
        let mut layer = Self::without_bias(in_features, out_features);
        layer.bias = Some(Tensor::zeros(out_features, true));
        layer
    }

    /// Create a layer with no bias term
    pub fn without_bias(in_features: usize, out_features: usize) -> Self {
        let scale = (2.0 / (in_features + out_features) as f32).sqrt();
        // Phase depends on the shape so stacked layers do not start identical
        let phase = (in_features * 31 + out_features * 17) as f32 * 0.013;
        Self {
            weight: Tensor::from_vec(
                (0..in_features * out_features)
                    .map(|i| (i as f32 * 0.567 + phase).sin() * scale)
                    .collect(),
                true,
            ),
            bias: None,
            in_features,
            out_features,
        }
    }

    pub fn in_features(&self) -> usize {
        self.in_features
    }

    pub fn out_features(&self) -> usize {
        self.out_features
    }
}

impl ModelComponent for Linear {
    /// `(batch, in_features) -> (batch, out_features)`
    fn forward(&self, x: &Tensor, batch_size: usize) -> Tensor {
        let out = matmul(x, &self.weight, batch_size, self.in_features, self.out_features);
        match &self.bias {
            Some(bias) => add_row_bias(&out, bias, batch_size, self.out_features),
            None => out,
        }
    }

    fn output_dim(&self) -> Option<usize> {
        Some(self.out_features)
    }

    fn input_dim(&self) -> Option<usize> {
        Some(self.in_features)
    }

    fn parameters(&self) -> Vec<&Tensor> {
        let mut params = vec![&self.weight];
        params.extend(self.bias.as_ref());
        params
    }
}
