//! Log-space and root regression losses: MSLE, RMSE, RMSLE
//!
//! All three reuse the mean-squared-error primitive, so
//! `MSLE(p, t) == MSE(ln(p + 1), ln(t + 1))` and `RMSE² == MSE` hold by
//! construction. Inputs below -1 are not rejected: the logarithm yields NaN
//! and the loss propagates it.

use super::mse::{assert_same_len, mean_squared_error};
use super::traits::scalar_loss;
use super::LossFn;
use crate::autograd::Tensor;
use ndarray::Array1;

fn log1p(x: &Array1<f32>) -> Array1<f32> {
    x.mapv(|v| (v + 1.0).ln())
}

/// `∂ sqrt(m) / ∂ pred = ∂m/∂pred / (2 sqrt(m))`, zero when the root is zero
fn root_grad(inner_grad: Array1<f32>, root: f32) -> Array1<f32> {
    if root > 0.0 {
        inner_grad / (2.0 * root)
    } else {
        Array1::zeros(inner_grad.len())
    }
}

/// Mean Squared Logarithmic Error
///
/// L = mean((ln(pred + 1) - ln(target + 1))^2)
#[derive(Debug, Clone, Copy, Default)]
pub struct MSLELoss;

impl MSLELoss {
    /// Returns (loss, ∂loss/∂pred)
    fn value_and_grad(predictions: &Tensor, targets: &Tensor) -> (f32, Array1<f32>) {
        assert_same_len(predictions, targets);

        let log_pred = log1p(predictions.data());
        let log_target = log1p(targets.data());
        let msle = mean_squared_error(&log_pred, &log_target);

        // 2 (ln(p+1) - ln(t+1)) / (n (p+1))
        let n = predictions.len() as f32;
        let grad = (&log_pred - &log_target) * (2.0 / n) / &predictions.data().mapv(|p| p + 1.0);

        (msle, grad)
    }
}

impl LossFn for MSLELoss {
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor {
        let (msle, grad) = Self::value_and_grad(predictions, targets);
        scalar_loss(msle, predictions, grad)
    }

    fn name(&self) -> &'static str {
        "MSLE"
    }
}

/// Root Mean Squared Error
///
/// L = sqrt(mean((pred - target)^2))
#[derive(Debug, Clone, Copy, Default)]
pub struct RMSELoss;

impl LossFn for RMSELoss {
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor {
        assert_same_len(predictions, targets);

        let rmse = mean_squared_error(predictions.data(), targets.data()).sqrt();

        let n = predictions.len() as f32;
        let mse_grad = (predictions.data() - targets.data()) * (2.0 / n);

        scalar_loss(rmse, predictions, root_grad(mse_grad, rmse))
    }

    fn name(&self) -> &'static str {
        "RMSE"
    }
}

/// Root Mean Squared Logarithmic Error
///
/// L = sqrt(MSLE(pred, target))
#[derive(Debug, Clone, Copy, Default)]
pub struct RMSLELoss;

impl LossFn for RMSLELoss {
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor {
        let (msle, msle_grad) = MSLELoss::value_and_grad(predictions, targets);
        let rmsle = msle.sqrt();
        scalar_loss(rmsle, predictions, root_grad(msle_grad, rmsle))
    }

    fn name(&self) -> &'static str {
        "RMSLE"
    }
}
