//! Loss functions and the objective registry
//!
//! - [`MSELoss`] - Mean Squared Error for regression
//! - [`L1Loss`] - Mean Absolute Error (more robust to outliers)
//! - [`MSLELoss`] / [`RMSLELoss`] - Squared error in log space, and its root
//! - [`RMSELoss`] - Root Mean Squared Error
//! - [`BCEWithLogitsLoss`] - Binary classification (sigmoid per output)
//! - [`CrossEntropyLoss`] - Single-label multiclass classification
//! - [`FocalLoss`] - Class-imbalance aware binary/multiclass loss
//!
//! [`get_loss_function`] resolves an objective name such as `"rmse"` or
//! `"binary_focal_loss"` into one of the above.

mod bce_with_logits;
mod cross_entropy;
mod focal;
mod mse;
mod msle;
pub mod registry;
mod traits;

pub use bce_with_logits::BCEWithLogitsLoss;
pub use cross_entropy::CrossEntropyLoss;
pub use focal::FocalLoss;
pub use mse::{L1Loss, MSELoss};
pub use msle::{MSLELoss, RMSELoss, RMSLELoss};
pub use registry::{
    get_loss_function, objective_family, supported_objectives, LossConfig, TaskFamily,
};
pub use traits::LossFn;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loss_names() {
        assert_eq!(MSELoss.name(), "MSE");
        assert_eq!(L1Loss.name(), "L1");
        assert_eq!(MSLELoss.name(), "MSLE");
        assert_eq!(RMSELoss.name(), "RMSE");
        assert_eq!(RMSLELoss.name(), "RMSLE");
        assert_eq!(CrossEntropyLoss::new().name(), "CrossEntropy");
        assert_eq!(BCEWithLogitsLoss::new().name(), "BCEWithLogits");
        assert_eq!(FocalLoss::default().name(), "Focal");
    }
}
