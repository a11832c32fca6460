//! Multi-layer perceptron used as the fusion head
//!
//! Each dense layer is one of
//!
//! ```text
//! linear_first = true :  Linear -> Activation -> BatchNorm? -> Dropout?
//! linear_first = false:  BatchNorm? -> Dropout? -> Linear -> Activation
//! ```
//!
//! Linear layers adjacent to a batch normalization carry no bias.

use super::{BatchNorm1d, Linear, ModelComponent};
use crate::autograd::{dropout, gelu, leaky_relu, relu, tanh, Tensor};
use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::str::FromStr;

/// Hidden-layer activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Relu,
    LeakyRelu,
    Tanh,
    Gelu,
}

impl Activation {
    pub fn apply(self, x: &Tensor) -> Tensor {
        match self {
            Self::Relu => relu(x),
            Self::LeakyRelu => leaky_relu(x),
            Self::Tanh => tanh(x),
            Self::Gelu => gelu(x),
        }
    }
}

impl FromStr for Activation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "relu" => Ok(Self::Relu),
            "leaky_relu" => Ok(Self::LeakyRelu),
            "tanh" => Ok(Self::Tanh),
            "gelu" => Ok(Self::Gelu),
            other => Err(Error::InvalidActivation(other.to_string())),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Relu => "relu",
            Self::LeakyRelu => "leaky_relu",
            Self::Tanh => "tanh",
            Self::Gelu => "gelu",
        };
        f.write_str(name)
    }
}

/// Dropout probability for the dense layers
///
/// Deserializes from either a number or a list of numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dropout {
    /// Same probability after every layer
    Uniform(f32),
    /// One probability per layer
    PerLayer(Vec<f32>),
}

impl Default for Dropout {
    fn default() -> Self {
        Self::Uniform(0.0)
    }
}

impl Dropout {
    /// Expand to one probability per layer, validating count and range
    fn per_layer(&self, n_layers: usize) -> Result<Vec<f32>> {
        let probs = match self {
            Self::Uniform(p) => vec![*p; n_layers],
            Self::PerLayer(ps) if ps.len() == n_layers => ps.clone(),
            Self::PerLayer(ps) => {
                return Err(Error::InvalidDropout { expected: n_layers, got: ps.len() })
            }
        };
        match probs.iter().find(|p| !(0.0..1.0).contains(*p)) {
            Some(&p) => Err(Error::InvalidDropoutProbability(p)),
            None => Ok(probs),
        }
    }
}

/// Inverted dropout with its own RNG; identity in evaluation mode
struct DropoutLayer {
    p: f32,
    rng: RefCell<StdRng>,
    training: bool,
}

impl DropoutLayer {
    fn new(p: f32, seed: u64) -> Self {
        Self { p, rng: RefCell::new(StdRng::seed_from_u64(seed)), training: true }
    }

    fn forward(&self, x: &Tensor) -> Tensor {
        if self.training {
            dropout(x, self.p, &mut *self.rng.borrow_mut())
        } else {
            x.clone()
        }
    }
}

struct DenseLayer {
    linear: Linear,
    activation: Activation,
    batchnorm: Option<BatchNorm1d>,
    dropout: Option<DropoutLayer>,
    linear_first: bool,
}

impl DenseLayer {
    fn forward(&self, x: &Tensor, batch_size: usize) -> Tensor {
        if self.linear_first {
            let h = self.activation.apply(&self.linear.forward(x, batch_size));
            let h = self.normalize(h, batch_size);
            self.drop(h)
        } else {
            let h = self.normalize(x.clone(), batch_size);
            let h = self.drop(h);
            self.activation.apply(&self.linear.forward(&h, batch_size))
        }
    }

    fn normalize(&self, h: Tensor, batch_size: usize) -> Tensor {
        match &self.batchnorm {
            Some(bn) => bn.forward(&h, batch_size),
            None => h,
        }
    }

    fn drop(&self, h: Tensor) -> Tensor {
        match &self.dropout {
            Some(dp) => dp.forward(&h),
            None => h,
        }
    }

    fn parameters(&self) -> Vec<&Tensor> {
        let mut params = self.linear.parameters();
        if let Some(bn) = &self.batchnorm {
            params.extend(bn.parameters());
        }
        params
    }

    fn set_training(&mut self, training: bool) {
        if let Some(bn) = &mut self.batchnorm {
            bn.set_training(training);
        }
        if let Some(dp) = &mut self.dropout {
            dp.training = training;
        }
    }
}

/// Stack of dense layers, built by [`MlpBuilder`]
pub struct Mlp {
    layers: Vec<DenseLayer>,
    dims: Vec<usize>,
}

impl Mlp {
    /// Layer widths, input first
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Whether dense layer `i` is followed (or preceded) by batch normalization
    pub fn has_batchnorm(&self, i: usize) -> bool {
        self.layers.get(i).is_some_and(|l| l.batchnorm.is_some())
    }

    /// Dropout probability of dense layer `i` (0 when it has none)
    pub fn dropout_at(&self, i: usize) -> f32 {
        self.layers.get(i).and_then(|l| l.dropout.as_ref()).map_or(0.0, |d| d.p)
    }
}

impl ModelComponent for Mlp {
    fn forward(&self, x: &Tensor, batch_size: usize) -> Tensor {
        let mut h = x.clone();
        for layer in &self.layers {
            h = layer.forward(&h, batch_size);
        }
        h
    }

    fn output_dim(&self) -> Option<usize> {
        self.dims.last().copied()
    }

    fn input_dim(&self) -> Option<usize> {
        self.dims.first().copied()
    }

    fn parameters(&self) -> Vec<&Tensor> {
        self.layers.iter().flat_map(DenseLayer::parameters).collect()
    }

    fn set_training(&mut self, training: bool) {
        for layer in &mut self.layers {
            layer.set_training(training);
        }
    }
}

/// Builder for [`Mlp`]
///
/// # Example
///
/// ```
/// use widedeep::models::{Activation, Dropout, MlpBuilder, ModelComponent};
///
/// let mlp = MlpBuilder::new(16, vec![8, 4])
///     .activation(Activation::Gelu)
///     .dropout(Dropout::PerLayer(vec![0.2, 0.0]))
///     .batchnorm(true)
///     .linear_first(true)
///     .build()
///     .unwrap();
/// assert_eq!(mlp.output_dim(), Some(4));
/// ```
#[derive(Debug, Clone)]
pub struct MlpBuilder {
    dims: Vec<usize>,
    activation: Activation,
    dropout: Dropout,
    batchnorm: bool,
    batchnorm_last: bool,
    linear_first: bool,
    seed: u64,
}

impl MlpBuilder {
    pub fn new(input_dim: usize, hidden_dims: Vec<usize>) -> Self {
        let mut dims = Vec::with_capacity(hidden_dims.len() + 1);
        dims.push(input_dim);
        dims.extend(hidden_dims);
        Self {
            dims,
            activation: Activation::default(),
            dropout: Dropout::default(),
            batchnorm: false,
            batchnorm_last: false,
            linear_first: false,
            seed: 42,
        }
    }

    pub fn activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    pub fn dropout(mut self, dropout: Dropout) -> Self {
        self.dropout = dropout;
        self
    }

    pub fn batchnorm(mut self, batchnorm: bool) -> Self {
        self.batchnorm = batchnorm;
        self
    }

    /// Also normalize the last dense layer (only meaningful with `batchnorm`)
    pub fn batchnorm_last(mut self, batchnorm_last: bool) -> Self {
        self.batchnorm_last = batchnorm_last;
        self
    }

    pub fn linear_first(mut self, linear_first: bool) -> Self {
        self.linear_first = linear_first;
        self
    }

    /// Seed for the dropout masks
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(self) -> Result<Mlp> {
        let n_layers = self.dims.len() - 1;
        let probs = self.dropout.per_layer(n_layers)?;

        let layers = self
            .dims
            .windows(2)
            .zip(probs)
            .enumerate()
            .map(|(i, (w, p))| {
                let (inp, out) = (w[0], w[1]);
                let is_last = i + 1 == n_layers;
                let bn = self.batchnorm && (!is_last || self.batchnorm_last);
                DenseLayer {
                    linear: if bn { Linear::without_bias(inp, out) } else { Linear::new(inp, out) },
                    activation: self.activation,
                    batchnorm: bn.then(|| BatchNorm1d::new(if self.linear_first { out } else { inp })),
                    dropout: (p > 0.0).then(|| DropoutLayer::new(p, self.seed.wrapping_add(i as u64))),
                    linear_first: self.linear_first,
                }
            })
            .collect();

        Ok(Mlp { layers, dims: self.dims })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::{backward, sum};

    #[test]
    fn test_activation_parsing() {
        assert_eq!("relu".parse::<Activation>().unwrap(), Activation::Relu);
        assert_eq!("leaky_relu".parse::<Activation>().unwrap(), Activation::LeakyRelu);
        assert_eq!("gelu".parse::<Activation>().unwrap(), Activation::Gelu);
        assert_eq!(Activation::Tanh.to_string(), "tanh");
        let err = "swish".parse::<Activation>().unwrap_err();
        assert!(matches!(err, Error::InvalidActivation(ref s) if s == "swish"));
    }

    #[test]
    fn test_dropout_deserializes_untagged() {
        let uniform: Dropout = serde_yaml::from_str("0.25").unwrap();
        assert_eq!(uniform, Dropout::Uniform(0.25));
        let per_layer: Dropout = serde_yaml::from_str("[0.1, 0.0]").unwrap();
        assert_eq!(per_layer, Dropout::PerLayer(vec![0.1, 0.0]));
    }

    #[test]
    fn test_batchnorm_skips_last_layer_by_default() {
        let mlp = MlpBuilder::new(6, vec![4, 3, 2]).batchnorm(true).build().unwrap();
        assert_eq!(mlp.num_layers(), 3);
        assert!(mlp.has_batchnorm(0));
        assert!(mlp.has_batchnorm(1));
        assert!(!mlp.has_batchnorm(2));

        let all = MlpBuilder::new(6, vec![4, 3, 2]).batchnorm(true).batchnorm_last(true).build().unwrap();
        assert!(all.has_batchnorm(2));
    }

    #[test]
    fn test_batchnorm_last_alone_adds_nothing() {
        let mlp = MlpBuilder::new(6, vec![4]).batchnorm_last(true).build().unwrap();
        assert!(!mlp.has_batchnorm(0));
    }

    #[test]
    fn test_bias_dropped_next_to_batchnorm() {
        // linear + bias = 2 tensors; linear (no bias) + gamma + beta = 3
        let plain = MlpBuilder::new(4, vec![3]).build().unwrap();
        assert_eq!(plain.parameters().len(), 2);
        let normed = MlpBuilder::new(4, vec![3]).batchnorm(true).batchnorm_last(true).build().unwrap();
        assert_eq!(normed.parameters().len(), 3);
    }

    #[test]
    fn test_batchnorm_width_follows_order() {
        let x = Tensor::from_vec((0..2 * 5).map(|i| i as f32 * 0.1).collect(), false);
        for linear_first in [true, false] {
            let mlp = MlpBuilder::new(5, vec![3])
                .batchnorm(true)
                .batchnorm_last(true)
                .linear_first(linear_first)
                .build()
                .unwrap();
            // panics inside batch_norm if the width were wrong
            assert_eq!(mlp.forward(&x, 2).len(), 2 * 3);
        }
    }

    #[test]
    fn test_dropout_expansion() {
        let mlp = MlpBuilder::new(4, vec![3, 2]).dropout(Dropout::Uniform(0.5)).build().unwrap();
        assert_eq!(mlp.dropout_at(0), 0.5);
        assert_eq!(mlp.dropout_at(1), 0.5);

        let mlp = MlpBuilder::new(4, vec![3, 2])
            .dropout(Dropout::PerLayer(vec![0.0, 0.3]))
            .build()
            .unwrap();
        assert_eq!(mlp.dropout_at(0), 0.0);
        assert_eq!(mlp.dropout_at(1), 0.3);
    }

    #[test]
    fn test_invalid_dropout() {
        let err = MlpBuilder::new(4, vec![3, 2]).dropout(Dropout::PerLayer(vec![0.1])).build();
        assert!(matches!(err, Err(Error::InvalidDropout { expected: 2, got: 1 })));

        let err = MlpBuilder::new(4, vec![3]).dropout(Dropout::Uniform(1.0)).build();
        assert!(matches!(err, Err(Error::InvalidDropoutProbability(_))));
    }

    #[test]
    fn test_empty_hidden_is_identity() {
        let mlp = MlpBuilder::new(3, vec![]).build().unwrap();
        let x = Tensor::from_vec(vec![1.0, -2.0, 3.0], false);
        assert_eq!(mlp.forward(&x, 1).data(), x.data());
        assert_eq!(mlp.output_dim(), Some(3));
    }

    #[test]
    fn test_eval_mode_is_deterministic() {
        let mut mlp = MlpBuilder::new(4, vec![8, 3])
            .dropout(Dropout::Uniform(0.5))
            .batchnorm(true)
            .build()
            .unwrap();
        mlp.set_training(false);
        let x = Tensor::from_vec((0..3 * 4).map(|i| (i as f32).sin()).collect(), false);
        let a = mlp.forward(&x, 3);
        let b = mlp.forward(&x, 3);
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn test_gradients_reach_every_parameter() {
        let mlp = MlpBuilder::new(4, vec![5, 3])
            .activation(Activation::Tanh)
            .batchnorm(true)
            .linear_first(true)
            .build()
            .unwrap();
        let x = Tensor::from_vec((0..4 * 4).map(|i| (i as f32 * 0.7).cos()).collect(), false);
        let mut loss = sum(&mlp.forward(&x, 4));
        backward(&mut loss, None);
        for p in mlp.parameters() {
            assert!(p.grad().is_some());
        }
    }
}
