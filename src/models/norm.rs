//! Batch normalization layer

use super::ModelComponent;
use crate::autograd::{batch_norm, batch_norm_inference, BatchStats, Tensor};
use ndarray::Array1;
use std::cell::RefCell;

/// Batch normalization over the feature axis of a `(batch, features)` input
///
/// In training mode each forward normalizes with the batch statistics and
/// folds them into the running estimates; in evaluation mode the running
/// estimates are used and nothing is updated.
pub struct BatchNorm1d {
    /// Scale parameter (features)
    pub gamma: Tensor,
    /// Shift parameter (features)
    pub beta: Tensor,
    running: RefCell<BatchStats>,
    num_features: usize,
    momentum: f32,
    eps: f32,
    training: bool,
}

impl BatchNorm1d {
    pub const DEFAULT_MOMENTUM: f32 = 0.1;
    pub const DEFAULT_EPS: f32 = 1e-5;

    pub fn new(num_features: usize) -> Self {
        Self {
            gamma: Tensor::ones(num_features, true),
            beta: Tensor::zeros(num_features, true),
            running: RefCell::new(BatchStats {
                mean: Array1::zeros(num_features),
                var: Array1::ones(num_features),
            }),
            num_features,
            momentum: Self::DEFAULT_MOMENTUM,
            eps: Self::DEFAULT_EPS,
            training: true,
        }
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn is_training(&self) -> bool {
        self.training
    }

    /// Snapshot of the running estimates
    pub fn running_stats(&self) -> BatchStats {
        self.running.borrow().clone()
    }

    fn update_running(&self, batch: &BatchStats, batch_size: usize) {
        // Running variance tracks the unbiased estimate
        let correction = if batch_size > 1 {
            batch_size as f32 / (batch_size - 1) as f32
        } else {
            1.0
        };
        let m = self.momentum;
        let mut running = self.running.borrow_mut();
        running.mean = &running.mean * (1.0 - m) + &batch.mean * m;
        running.var = &running.var * (1.0 - m) + &batch.var * (m * correction);
    }
}

impl ModelComponent for BatchNorm1d {
    fn forward(&self, x: &Tensor, batch_size: usize) -> Tensor {
        let cols = self.num_features;
        if self.training {
            let (out, stats) = batch_norm(x, &self.gamma, &self.beta, batch_size, cols, self.eps);
            self.update_running(&stats, batch_size);
            out
        } else {
            let running = self.running.borrow();
            batch_norm_inference(x, &self.gamma, &self.beta, &running, batch_size, cols, self.eps)
        }
    }

    fn output_dim(&self) -> Option<usize> {
        Some(self.num_features)
    }

    fn input_dim(&self) -> Option<usize> {
        Some(self.num_features)
    }

    fn parameters(&self) -> Vec<&Tensor> {
        vec![&self.gamma, &self.beta]
    }

    fn set_training(&mut self, training: bool) {
        self.training = training;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_training_normalizes_columns() {
        let bn = BatchNorm1d::new(2);
        let x = Tensor::from_vec(vec![1.0, 10.0, 3.0, 20.0], false);
        let y = bn.forward(&x, 2);
        let d = y.data();
        assert_relative_eq!(d[0] + d[2], 0.0, epsilon = 1e-5);
        assert_relative_eq!(d[0], -1.0, epsilon = 1e-3);
        assert_relative_eq!(d[3], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_running_stats_update() {
        let bn = BatchNorm1d::new(1);
        bn.forward(&Tensor::from_vec(vec![2.0, 4.0], false), 2);
        let stats = bn.running_stats();
        // mean: 0.9 * 0 + 0.1 * 3; var: 0.9 * 1 + 0.1 * (1 * 2/1)
        assert_relative_eq!(stats.mean[0], 0.3, epsilon = 1e-6);
        assert_relative_eq!(stats.var[0], 1.1, epsilon = 1e-6);
    }

    #[test]
    fn test_eval_uses_running_stats_and_is_stable() {
        let mut bn = BatchNorm1d::new(1);
        bn.set_training(false);
        assert!(!bn.is_training());

        let x = Tensor::from_vec(vec![2.0, 4.0], false);
        let first = bn.forward(&x, 2);
        let second = bn.forward(&x, 2);
        assert_eq!(first.data(), second.data());
        // fresh running stats: mean 0, var 1
        assert_relative_eq!(first.data()[0], 2.0 / (1.0f32 + 1e-5).sqrt(), epsilon = 1e-6);
        assert_eq!(bn.running_stats().mean[0], 0.0);
    }
}
