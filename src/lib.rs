//! # widedeep
//!
//! Wide & Deep model composition for tabular, text and image inputs, plus an
//! objective registry of classification and regression losses, on a small
//! tape-based autograd.
//!
//! ## Modules
//!
//! - [`autograd`] - tensors and differentiable operations
//! - [`loss`] - loss functions and the objective name registry
//! - [`models`] - branch components and the [`WideDeep`](models::WideDeep) composer
//! - [`config`] - YAML configuration
//! - [`trace`] - opt-in timing of forward, head and loss steps
//!
//! ## Example
//!
//! ```
//! use widedeep::autograd::backward;
//! use widedeep::loss::{get_loss_function, LossConfig};
//! use widedeep::models::{Linear, ModelInput, Wide, WideDeep};
//! use widedeep::Tensor;
//!
//! let model = WideDeep::builder()
//!     .wide(Wide::new(20, 1))
//!     .tabular(Linear::new(4, 8))
//!     .head_layers(vec![8])
//!     .build()?;
//! let loss_fn = get_loss_function("binary", &LossConfig::default())?;
//!
//! let input = ModelInput::new(2)
//!     .with_wide(Tensor::from_vec(vec![3.0, 7.0, 1.0, 0.0], false))
//!     .with_tabular(Tensor::from_vec(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8], false));
//! let target = Tensor::from_vec(vec![1.0, 0.0], false);
//!
//! let mut loss = loss_fn.forward(&model.forward(&input), &target);
//! backward(&mut loss, None);
//! assert!(model.parameters().iter().all(|p| p.grad().is_some()));
//! # Ok::<(), widedeep::Error>(())
//! ```

pub mod autograd;
pub mod config;
pub mod error;
pub mod loss;
pub mod models;
pub mod trace;

pub use autograd::Tensor;
pub use config::{HeadConfig, ModelConfig, ObjectiveConfig, WideDeepConfig};
pub use error::{Error, Result};
