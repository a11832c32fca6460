//! Mean Squared Error and Mean Absolute Error losses

use super::traits::scalar_loss;
use super::LossFn;
use crate::autograd::Tensor;
use ndarray::Array1;

/// Mean of squared differences: the primitive shared by every squared-error loss
pub(crate) fn mean_squared_error(predictions: &Array1<f32>, targets: &Array1<f32>) -> f32 {
    let diff = predictions - targets;
    (&diff * &diff).mean().unwrap_or(0.0)
}

pub(crate) fn assert_same_len(predictions: &Tensor, targets: &Tensor) {
    assert_eq!(
        predictions.len(),
        targets.len(),
        "Predictions and targets must have same length"
    );
}

/// Mean Squared Error Loss
///
/// L = mean((predictions - targets)^2)
///
/// # Example
///
/// ```
/// use widedeep::loss::{LossFn, MSELoss};
/// use widedeep::Tensor;
///
/// let loss_fn = MSELoss;
/// let pred = Tensor::from_vec(vec![1.0, 2.0, 3.0], true);
/// let target = Tensor::from_vec(vec![1.5, 2.5, 3.5], false);
///
/// let loss = loss_fn.forward(&pred, &target);
/// assert!((loss.data()[0] - 0.25).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MSELoss;

impl LossFn for MSELoss {
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor {
        assert_same_len(predictions, targets);

        let mse = mean_squared_error(predictions.data(), targets.data());

        // d(MSE)/d(pred) = 2 * (pred - target) / n
        let n = predictions.len() as f32;
        let grad = (predictions.data() - targets.data()) * (2.0 / n);

        scalar_loss(mse, predictions, grad)
    }

    fn name(&self) -> &'static str {
        "MSE"
    }
}

/// L1 Loss (Mean Absolute Error)
///
/// L = mean(|predictions - targets|)
///
/// More robust to outliers than MSE, but has non-smooth gradient at zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct L1Loss;

impl LossFn for L1Loss {
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor {
        assert_same_len(predictions, targets);

        let diff = predictions.data() - targets.data();
        let mae = diff.mapv(f32::abs).mean().unwrap_or(0.0);

        // sign(pred - target) / n, zero at exact agreement
        let n = predictions.len() as f32;
        let grad = diff.mapv(|d| if d == 0.0 { 0.0 } else { d.signum() / n });

        scalar_loss(mae, predictions, grad)
    }

    fn name(&self) -> &'static str {
        "L1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::backward;
    use approx::assert_relative_eq;

    #[test]
    fn test_mse_value_and_gradient() {
        let pred = Tensor::from_vec(vec![1.0, 2.0, 3.0], true);
        let target = Tensor::from_vec(vec![1.0, 2.0, 5.0], false);

        let mut loss = MSELoss.forward(&pred, &target);
        assert_relative_eq!(loss.data()[0], 4.0 / 3.0, epsilon = 1e-6);

        backward(&mut loss, None);
        let grad = pred.grad().unwrap();
        assert_relative_eq!(grad[0], 0.0);
        assert_relative_eq!(grad[2], 2.0 * -2.0 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_mse_perfect_prediction() {
        let pred = Tensor::from_vec(vec![0.5, -1.0], true);
        let loss = MSELoss.forward(&pred, &pred.detach());
        assert_eq!(loss.data()[0], 0.0);
    }

    #[test]
    fn test_l1_value_and_gradient() {
        let pred = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], true);
        let target = Tensor::from_vec(vec![2.0, 2.0, 1.0, 4.5], false);

        let mut loss = L1Loss.forward(&pred, &target);
        assert_relative_eq!(loss.data()[0], (1.0 + 0.0 + 2.0 + 0.5) / 4.0);

        backward(&mut loss, None);
        assert_eq!(pred.grad().unwrap().to_vec(), vec![-0.25, 0.0, 0.25, -0.25]);
    }

    #[test]
    fn test_no_grad_predictions_give_leaf_loss() {
        let pred = Tensor::from_vec(vec![1.0], false);
        let target = Tensor::from_vec(vec![0.0], false);
        let loss = MSELoss.forward(&pred, &target);
        assert!(loss.is_leaf());
        assert!(!loss.requires_grad());
    }

    #[test]
    #[should_panic(expected = "must have same length")]
    fn test_mse_mismatched_lengths() {
        let pred = Tensor::from_vec(vec![1.0, 2.0], true);
        let target = Tensor::from_vec(vec![1.0, 2.0, 3.0], false);
        MSELoss.forward(&pred, &target);
    }
}
