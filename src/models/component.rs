//! Branch component contract and the per-branch batch mapping

use crate::autograd::Tensor;

/// A network that maps a `(batch, in)` tensor to `(batch, output_dim)`
/// activations.
///
/// The composer only ever talks to branches through this trait. A deep branch
/// (tabular, text, image) must report its `output_dim`; a custom fusion head
/// must also report its `input_dim`.
pub trait ModelComponent {
    /// Forward pass over a row-major batch of `batch_size` rows
    fn forward(&self, x: &Tensor, batch_size: usize) -> Tensor;

    /// Width of the activations produced per row, if the component declares it
    fn output_dim(&self) -> Option<usize>;

    /// Width of the features consumed per row, if the component declares it
    fn input_dim(&self) -> Option<usize> {
        None
    }

    /// Trainable tensors
    fn parameters(&self) -> Vec<&Tensor>;

    /// Switch between training and evaluation behavior
    fn set_training(&mut self, _training: bool) {}
}

impl<T: ModelComponent + ?Sized> ModelComponent for Box<T> {
    fn forward(&self, x: &Tensor, batch_size: usize) -> Tensor {
        (**self).forward(x, batch_size)
    }

    fn output_dim(&self) -> Option<usize> {
        (**self).output_dim()
    }

    fn input_dim(&self) -> Option<usize> {
        (**self).input_dim()
    }

    fn parameters(&self) -> Vec<&Tensor> {
        (**self).parameters()
    }

    fn set_training(&mut self, training: bool) {
        (**self).set_training(training);
    }
}

/// One batch, keyed by branch
///
/// Slots for branches the model does not have are never read.
#[derive(Debug, Clone, Default)]
pub struct ModelInput {
    pub batch_size: usize,
    pub wide: Option<Tensor>,
    pub tabular: Option<Tensor>,
    pub text: Option<Tensor>,
    pub image: Option<Tensor>,
}

impl ModelInput {
    pub fn new(batch_size: usize) -> Self {
        Self { batch_size, ..Self::default() }
    }

    pub fn with_wide(mut self, x: Tensor) -> Self {
        self.wide = Some(x);
        self
    }

    pub fn with_tabular(mut self, x: Tensor) -> Self {
        self.tabular = Some(x);
        self
    }

    pub fn with_text(mut self, x: Tensor) -> Self {
        self.text = Some(x);
        self
    }

    pub fn with_image(mut self, x: Tensor) -> Self {
        self.image = Some(x);
        self
    }
}
