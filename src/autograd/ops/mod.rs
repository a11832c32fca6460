//! Autograd operations with backward passes
//!
//! This module provides differentiable operations for automatic differentiation.

mod activations;
mod basic;
mod dropout;
mod matmul;
mod normalize;

pub use activations::{
    gelu, gelu_scalar, leaky_relu, relu, sigmoid, sigmoid_scalar, tanh, LEAKY_RELU_SLOPE,
};
pub use basic::{add, add_row_bias, concat_columns, mean, mul, scale, sum};
pub use dropout::dropout;
pub use matmul::{matmul, matmul_compute, transpose};
pub use normalize::{batch_norm, batch_norm_inference, BatchStats};
