//! Model components and the Wide & Deep composer
//!
//! - [`ModelComponent`] - capability contract every branch implements
//! - [`Wide`] - linear model over categorical feature indices
//! - [`Linear`], [`BatchNorm1d`] - building blocks
//! - [`Mlp`] / [`MlpBuilder`] - dense stack used as the fusion head
//! - [`WideDeep`] / [`WideDeepBuilder`] - validated composition of the branches

mod component;
mod linear;
mod mlp;
mod norm;
mod wide;
mod wide_deep;

pub use component::{ModelComponent, ModelInput};
pub use linear::Linear;
pub use mlp::{Activation, Dropout, Mlp, MlpBuilder};
pub use norm::BatchNorm1d;
pub use wide::Wide;
pub use wide_deep::{WideDeep, WideDeepBuilder};
