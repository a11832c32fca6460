//! YAML configuration for the composed model and its objective
//!
//! ```yaml
//! model:
//!   pred_dim: 3
//!   head:
//!     layers: [64, 32]
//!     activation: relu
//!     dropout: [0.2, 0.1]
//!     batchnorm: true
//! objective:
//!   objective: multiclass_focal_loss
//!   alpha: 0.5
//!   gamma: 2.0
//! ```

use crate::error::{Error, Result};
use crate::loss::{
    get_loss_function, objective_family, supported_objectives, LossConfig, LossFn, TaskFamily,
};
use crate::models::{Activation, Dropout};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_pred_dim() -> usize {
    1
}

fn default_activation() -> String {
    "relu".to_string()
}

/// Declarative fusion head
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeadConfig {
    /// Hidden layer widths, e.g. `[128, 64]`
    pub layers: Vec<usize>,

    #[serde(default = "default_activation")]
    pub activation: String,

    /// A single probability or one per layer
    #[serde(default)]
    pub dropout: Dropout,

    #[serde(default)]
    pub batchnorm: bool,

    #[serde(default)]
    pub batchnorm_last: bool,

    /// `true`: Linear -> Act -> BN -> Dropout; `false`: BN -> Dropout -> Linear -> Act
    #[serde(default)]
    pub linear_first: bool,
}

impl HeadConfig {
    pub fn new(layers: Vec<usize>) -> Self {
        Self {
            layers,
            activation: default_activation(),
            dropout: Dropout::default(),
            batchnorm: false,
            batchnorm_last: false,
            linear_first: false,
        }
    }
}

/// Shape of the composed model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Prediction width: 1 for regression and binary, the class count for multiclass
    #[serde(default = "default_pred_dim")]
    pub pred_dim: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<HeadConfig>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self { pred_dim: default_pred_dim(), head: None }
    }
}

/// Objective name plus its loss options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveConfig {
    pub objective: String,

    #[serde(flatten)]
    pub loss: LossConfig,
}

impl ObjectiveConfig {
    pub fn new(objective: impl Into<String>) -> Self {
        Self { objective: objective.into(), loss: LossConfig::default() }
    }

    /// Build the loss function this objective names
    pub fn resolve(&self) -> Result<Box<dyn LossFn>> {
        get_loss_function(&self.objective, &self.loss)
    }

    pub fn family(&self) -> Option<TaskFamily> {
        objective_family(&self.objective)
    }
}

/// Model and objective in one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WideDeepConfig {
    #[serde(default)]
    pub model: ModelConfig,
    pub objective: ObjectiveConfig,
}

impl WideDeepConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path)
            .map_err(|e| Error::io(format!("reading config file {}", path.display()), e))?;
        Self::from_yaml_str(&yaml)
    }

    /// Checks that do not need the branch components
    ///
    /// The objective name must be known, `pred_dim` positive, head widths
    /// positive, and the objective family consistent with `pred_dim`
    /// (multiclass needs at least two outputs). A binary or multiclass
    /// `weight` must fit the output width.
    pub fn validate(&self) -> Result<()> {
        let Some(family) = self.objective.family() else {
            return Err(Error::UnsupportedObjective {
                name: self.objective.objective.clone(),
                supported: supported_objectives(),
            });
        };

        if self.model.pred_dim == 0 {
            return Err(Error::ConfigParse("model.pred_dim must be > 0".into()));
        }
        if family == TaskFamily::Multiclass && self.model.pred_dim < 2 {
            return Err(Error::ConfigParse(format!(
                "objective '{}' is multiclass but model.pred_dim is {}; set it to the number of classes",
                self.objective.objective, self.model.pred_dim
            )));
        }
        if let Some(weight) = &self.objective.loss.weight {
            self.validate_weight(family, weight.len())?;
        }
        if let Some(head) = &self.model.head {
            if head.layers.contains(&0) {
                return Err(Error::ConfigParse("model.head.layers widths must be > 0".into()));
            }
            head.activation.parse::<Activation>()?;
        }
        Ok(())
    }

    /// Binary weights rescale the single output column; multiclass weights
    /// carry one entry per class. Focal and regression objectives ignore them.
    fn validate_weight(&self, family: TaskFamily, len: usize) -> Result<()> {
        if self.objective.objective.contains("focal_loss") {
            return Ok(());
        }
        let pred_dim = self.model.pred_dim;
        let valid = match family {
            TaskFamily::Binary => pred_dim == 1 && len == 1,
            TaskFamily::Multiclass => len == pred_dim,
            TaskFamily::Regression => true,
        };
        if valid {
            return Ok(());
        }
        Err(Error::ConfigParse(format!(
            "objective.weight has {len} entries but objective '{}' with model.pred_dim = {pred_dim} needs {}",
            self.objective.objective,
            if family == TaskFamily::Binary { 1 } else { pred_dim }
        )))
    }
}
