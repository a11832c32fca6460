//! Error types with actionable diagnostics.
//!
//! Every composer validation failure is raised at build time, before any
//! forward pass runs. Numerical degeneracies (log of a negative value, a zero
//! root) are never errors; they surface as non-finite values.

use thiserror::Error;

/// Result type alias for widedeep operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the objective registry, the model composer and the
/// configuration loader.
#[derive(Error, Debug)]
pub enum Error {
    /// Objective name is not in the alias vocabulary.
    #[error(
        "objective or loss function '{name}' is not supported\n  → Pass a custom LossFn or use one of the supported objectives: {}",
        supported.join(", ")
    )]
    UnsupportedObjective { name: String, supported: Vec<&'static str> },

    /// A deep component does not advertise the width of its activations.
    #[error("{component} component must expose an 'output_dim'\n  → Implement ModelComponent::output_dim so the composer can size the projection")]
    MissingOutputDim { component: &'static str },

    /// The wide component and the model disagree on the prediction width.
    #[error("the output width of the wide component ({wide}) must be equal to the 'pred_dim' of the deep side and of the model itself ({pred_dim})")]
    WideOutputMismatch { wide: usize, pred_dim: usize },

    /// Both a custom head and declarative head layers were supplied.
    #[error("both a custom head and 'head_layers' were supplied\n  → Use one or the other, but not both")]
    ConflictingHead,

    /// Declarative head layers were supplied without any deep component.
    #[error("'head_layers' is set but no deep component (tabular, text or image) was supplied\n  → Add at least one deep component or drop the head")]
    HeadWithoutDeepComponent,

    /// A custom head does not advertise its input width.
    #[error("custom head must expose an 'input_dim'\n  → Implement ModelComponent::input_dim on the head")]
    MissingHeadInputDim,

    /// A custom head's input width does not match the concatenated deep output.
    #[error("custom head input features ({head_input}) must be equal to the output features of the deep components ({deep_output})")]
    HeadInputMismatch { head_input: usize, deep_output: usize },

    /// Neither a wide nor a deep component was supplied.
    #[error("no model component was supplied\n  → Supply at least one of wide, tabular, text or image")]
    EmptyModel,

    /// Head activation name is not recognized.
    #[error("invalid activation '{0}'\n  → Supported activations: relu, leaky_relu, tanh, gelu")]
    InvalidActivation(String),

    /// Per-layer dropout list does not match the number of dense layers.
    #[error("dropout list has {got} entries but the head has {expected} dense layers")]
    InvalidDropout { expected: usize, got: usize },

    /// Dropout probability outside `[0, 1)`.
    #[error("dropout probability {0} must be in [0, 1)")]
    InvalidDropoutProbability(f32),

    /// Configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    ConfigParse(String),

    /// IO error with context.
    #[error("IO error: {context}\n  Cause: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }

    /// Check if this error comes from composer validation.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::MissingOutputDim { .. }
                | Self::WideOutputMismatch { .. }
                | Self::ConflictingHead
                | Self::HeadWithoutDeepComponent
                | Self::MissingHeadInputDim
                | Self::HeadInputMismatch { .. }
                | Self::EmptyModel
                | Self::InvalidActivation(_)
                | Self::InvalidDropout { .. }
                | Self::InvalidDropoutProbability(_)
        )
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::ConfigParse(err.to_string())
    }
}
