//! Objective registry
//!
//! Maps user-facing objective names (and their aliases) onto concrete
//! [`LossFn`] implementations. The alias table is static; resolution is an
//! exact, case-sensitive membership test, with a single substring fallback
//! for focal-loss objectives.

use super::{
    BCEWithLogitsLoss, CrossEntropyLoss, FocalLoss, L1Loss, LossFn, MSELoss, MSLELoss, RMSELoss,
    RMSLELoss,
};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Task family an objective belongs to. The training driver uses it to pick
/// the output activation and the metric set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFamily {
    Binary,
    Multiclass,
    Regression,
}

impl fmt::Display for TaskFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Binary => "binary",
            Self::Multiclass => "multiclass",
            Self::Regression => "regression",
        };
        f.write_str(name)
    }
}

/// Every accepted objective, grouped by family. Order is the order reported
/// in [`Error::UnsupportedObjective`].
const OBJECTIVES: [(TaskFamily, &[&str]); 3] = [
    (
        TaskFamily::Binary,
        &["binary", "logistic", "binary_logloss", "binary_cross_entropy", "binary_focal_loss"],
    ),
    (
        TaskFamily::Multiclass,
        &[
            "multiclass",
            "multi_logloss",
            "cross_entropy",
            "categorical_cross_entropy",
            "multiclass_focal_loss",
        ],
    ),
    (
        TaskFamily::Regression,
        &[
            "regression",
            "mse",
            "l2",
            "mean_squared_error",
            "mean_absolute_error",
            "mae",
            "l1",
            "mean_squared_log_error",
            "msle",
            "root_mean_squared_error",
            "rmse",
            "root_mean_squared_log_error",
            "rmsle",
        ],
    ),
];

// Alias groups, one per concrete loss
const BINARY_LOSS: &[&str] = &["binary", "logistic", "binary_logloss", "binary_cross_entropy"];
const MULTICLASS_LOSS: &[&str] =
    &["multiclass", "multi_logloss", "cross_entropy", "categorical_cross_entropy"];
const MSE_LOSS: &[&str] = &["regression", "mse", "l2", "mean_squared_error"];
const MAE_LOSS: &[&str] = &["mean_absolute_error", "mae", "l1"];
const MSLE_LOSS: &[&str] = &["mean_squared_log_error", "msle"];
const RMSE_LOSS: &[&str] = &["root_mean_squared_error", "rmse"];
const RMSLE_LOSS: &[&str] = &["root_mean_squared_log_error", "rmsle"];

static FAMILY_BY_OBJECTIVE: LazyLock<HashMap<&'static str, TaskFamily>> = LazyLock::new(|| {
    OBJECTIVES
        .iter()
        .flat_map(|(family, names)| names.iter().map(move |name| (*name, *family)))
        .collect()
});

/// Family of a supported objective, `None` for unknown names
pub fn objective_family(name: &str) -> Option<TaskFamily> {
    FAMILY_BY_OBJECTIVE.get(name).copied()
}

/// All supported objective names, grouped by family
pub fn supported_objectives() -> Vec<&'static str> {
    OBJECTIVES.iter().flat_map(|(_, names)| names.iter().copied()).collect()
}

/// Task-specific loss options
///
/// `weight` is forwarded to the binary and multiclass losses; `alpha` and
/// `gamma` to the focal losses. Options that do not apply to the resolved
/// objective are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LossConfig {
    pub weight: Option<Vec<f32>>,
    pub alpha: Option<f32>,
    pub gamma: Option<f32>,
}

impl LossConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weight(mut self, weight: Vec<f32>) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = Some(gamma);
        self
    }
}

/// Resolve an objective name into a fresh loss function
///
/// # Errors
///
/// Returns [`Error::UnsupportedObjective`] listing every valid name when
/// `name` is not a known objective.
///
/// # Example
///
/// ```
/// use widedeep::loss::{get_loss_function, LossConfig};
///
/// let loss = get_loss_function("rmse", &LossConfig::default()).unwrap();
/// assert_eq!(loss.name(), "RMSE");
/// assert!(get_loss_function("hinge", &LossConfig::default()).is_err());
/// ```
pub fn get_loss_function(name: &str, config: &LossConfig) -> Result<Box<dyn LossFn>> {
    if objective_family(name).is_none() {
        return Err(Error::UnsupportedObjective {
            name: name.to_string(),
            supported: supported_objectives(),
        });
    }

    let loss: Box<dyn LossFn> = if BINARY_LOSS.contains(&name) {
        Box::new(BCEWithLogitsLoss::with_weight(config.weight.clone()))
    } else if MULTICLASS_LOSS.contains(&name) {
        Box::new(CrossEntropyLoss::with_weight(config.weight.clone()))
    } else if MSE_LOSS.contains(&name) {
        Box::new(MSELoss)
    } else if MAE_LOSS.contains(&name) {
        Box::new(L1Loss)
    } else if MSLE_LOSS.contains(&name) {
        Box::new(MSLELoss)
    } else if RMSE_LOSS.contains(&name) {
        Box::new(RMSELoss)
    } else if RMSLE_LOSS.contains(&name) {
        Box::new(RMSLELoss)
    } else if name.contains("focal_loss") {
        Box::new(FocalLoss::new(
            config.alpha.unwrap_or(FocalLoss::DEFAULT_ALPHA),
            config.gamma.unwrap_or(FocalLoss::DEFAULT_GAMMA),
        ))
    } else {
        // every objective in the table belongs to an alias group above
        unreachable!("objective '{name}' has no loss mapping")
    };

    tracing::debug!(objective = name, loss = loss.name(), "resolved objective");
    Ok(loss)
}
