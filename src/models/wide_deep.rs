//! Wide & Deep model composer
//!
//! Combines up to four branches and an optional fusion head into one
//! prediction of width `pred_dim`:
//!
//! ```text
//! no head:    out = wide(x_wide) + Σ proj_i(deep_i(x_i))
//! with head:  out = wide(x_wide) + proj(head(concat[tabular, text, image]))
//! ```
//!
//! A missing wide branch contributes zeros. Every structural check runs in
//! [`WideDeepBuilder::build`]; a built model never fails a forward pass for
//! configuration reasons.

use super::{Activation, Dropout, Linear, MlpBuilder, ModelComponent, ModelInput};
use crate::autograd::{add, concat_columns, Tensor};
use crate::config::ModelConfig;
use crate::error::{Error, Result};
use crate::trace::{TraceStep, TRACER};

/// A deep branch plus, in no-head mode, its own projection to `pred_dim`
struct DeepBranch {
    net: Box<dyn ModelComponent>,
    output_dim: usize,
    projection: Option<Linear>,
}

impl DeepBranch {
    fn forward(&self, x: &Tensor, batch_size: usize) -> Tensor {
        let h = self.net.forward(x, batch_size);
        match &self.projection {
            Some(proj) => proj.forward(&h, batch_size),
            None => h,
        }
    }

    fn parameters(&self) -> Vec<&Tensor> {
        let mut params = self.net.parameters();
        if let Some(proj) = &self.projection {
            params.extend(proj.parameters());
        }
        params
    }
}

/// Fusion head followed by the projection to `pred_dim`
///
/// For a declared head the projection is the final layer of the stack; for
/// a custom head it is created at build time from the head's `output_dim`.
struct FusionHead {
    net: Box<dyn ModelComponent>,
    projection: Linear,
    declared: bool,
}

impl FusionHead {
    fn forward(&self, x: &Tensor, batch_size: usize) -> Tensor {
        let h = self.net.forward(x, batch_size);
        self.projection.forward(&h, batch_size)
    }
}

/// The composed model
pub struct WideDeep {
    wide: Option<Box<dyn ModelComponent>>,
    tabular: Option<DeepBranch>,
    text: Option<DeepBranch>,
    image: Option<DeepBranch>,
    head: Option<FusionHead>,
    pred_dim: usize,
    training: bool,
}

impl WideDeep {
    pub fn builder() -> WideDeepBuilder {
        WideDeepBuilder::new()
    }

    pub fn pred_dim(&self) -> usize {
        self.pred_dim
    }

    pub fn tabular_output_dim(&self) -> Option<usize> {
        self.tabular.as_ref().map(|b| b.output_dim)
    }

    pub fn text_output_dim(&self) -> Option<usize> {
        self.text.as_ref().map(|b| b.output_dim)
    }

    pub fn image_output_dim(&self) -> Option<usize> {
        self.image.as_ref().map(|b| b.output_dim)
    }

    /// Concatenated width of the deep branches
    pub fn deep_output_dim(&self) -> usize {
        self.deep_branches().map(|(_, b)| b.output_dim).sum()
    }

    pub fn has_wide(&self) -> bool {
        self.wide.is_some()
    }

    pub fn has_head(&self) -> bool {
        self.head.is_some()
    }

    /// True for a head built from `head_layers`, false for a custom one
    pub fn has_declared_head(&self) -> bool {
        self.head.as_ref().is_some_and(|h| h.declared)
    }

    pub fn is_training(&self) -> bool {
        self.training
    }

    /// Training mode: dropout active, batch statistics updated
    pub fn train(&mut self) {
        self.set_training(true);
    }

    /// Evaluation mode: repeated forward calls are deterministic
    pub fn eval(&mut self) {
        self.set_training(false);
    }

    fn set_training(&mut self, training: bool) {
        self.training = training;
        if let Some(wide) = &mut self.wide {
            wide.set_training(training);
        }
        for branch in [&mut self.tabular, &mut self.text, &mut self.image].into_iter().flatten() {
            branch.net.set_training(training);
        }
        if let Some(head) = &mut self.head {
            head.net.set_training(training);
        }
    }

    /// Every trainable tensor, branches first, head last
    pub fn parameters(&self) -> Vec<&Tensor> {
        let mut params = Vec::new();
        if let Some(wide) = &self.wide {
            params.extend(wide.parameters());
        }
        for (_, branch) in self.deep_branches() {
            params.extend(branch.parameters());
        }
        if let Some(head) = &self.head {
            params.extend(head.net.parameters());
            params.extend(head.projection.parameters());
        }
        params
    }

    /// Present deep branches in concatenation order
    fn deep_branches(&self) -> impl Iterator<Item = (&'static str, &DeepBranch)> {
        [("tabular", &self.tabular), ("text", &self.text), ("image", &self.image)]
            .into_iter()
            .filter_map(|(name, branch)| branch.as_ref().map(|b| (name, b)))
    }

    /// Predictions `(batch_size, pred_dim)` for one batch
    ///
    /// # Panics
    ///
    /// If the input lacks the slot of a branch the model has, or a branch
    /// returns a tensor of the wrong size.
    pub fn forward(&self, input: &ModelInput) -> Tensor {
        TRACER.span(TraceStep::Forward, format!("batch={}", input.batch_size), || {
            self.forward_inner(input)
        })
    }

    fn forward_inner(&self, input: &ModelInput) -> Tensor {
        let batch_size = input.batch_size;
        let wide_out = match &self.wide {
            Some(wide) => wide.forward(slot(&input.wide, "wide"), batch_size),
            None => Tensor::zeros(batch_size * self.pred_dim, false),
        };

        match &self.head {
            Some(head) => {
                let activations: Vec<(Tensor, usize)> = self
                    .deep_branches()
                    .map(|(name, b)| (b.forward(deep_slot(input, name), batch_size), b.output_dim))
                    .collect();
                let parts: Vec<(&Tensor, usize)> =
                    activations.iter().map(|(t, width)| (t, *width)).collect();
                let deep = concat_columns(&parts, batch_size);

                let fused = TRACER.span(TraceStep::Head, format!("in={}", deep.len()), || {
                    head.forward(&deep, batch_size)
                });
                add(&wide_out, &fused)
            }
            None => self.deep_branches().fold(wide_out, |out, (name, b)| {
                add(&out, &b.forward(deep_slot(input, name), batch_size))
            }),
        }
    }
}

fn slot<'a>(tensor: &'a Option<Tensor>, name: &str) -> &'a Tensor {
    tensor
        .as_ref()
        .unwrap_or_else(|| panic!("model has a {name} component but the input has no '{name}' tensor"))
}

fn deep_slot<'a>(input: &'a ModelInput, name: &str) -> &'a Tensor {
    match name {
        "tabular" => slot(&input.tabular, name),
        "text" => slot(&input.text, name),
        _ => slot(&input.image, name),
    }
}

/// Builder for [`WideDeep`]
///
/// # Example
///
/// ```
/// use widedeep::models::{Linear, ModelInput, Wide, WideDeep};
/// use widedeep::Tensor;
///
/// let model = WideDeep::builder()
///     .wide(Wide::new(10, 1))
///     .tabular(Linear::new(4, 8))
///     .head_layers(vec![16])
///     .build()
///     .unwrap();
///
/// let input = ModelInput::new(2)
///     .with_wide(Tensor::from_vec(vec![1.0, 4.0, 2.0, 9.0], false))
///     .with_tabular(Tensor::from_vec(vec![0.5; 8], false));
/// assert_eq!(model.forward(&input).len(), 2);
/// ```
pub struct WideDeepBuilder {
    wide: Option<Box<dyn ModelComponent>>,
    tabular: Option<Box<dyn ModelComponent>>,
    text: Option<Box<dyn ModelComponent>>,
    image: Option<Box<dyn ModelComponent>>,
    head: Option<Box<dyn ModelComponent>>,
    head_layers: Option<Vec<usize>>,
    head_activation: String,
    head_dropout: Dropout,
    head_batchnorm: bool,
    head_batchnorm_last: bool,
    head_linear_first: bool,
    pred_dim: usize,
    seed: u64,
}

impl Default for WideDeepBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WideDeepBuilder {
    pub fn new() -> Self {
        Self {
            wide: None,
            tabular: None,
            text: None,
            image: None,
            head: None,
            head_layers: None,
            head_activation: Activation::default().to_string(),
            head_dropout: Dropout::default(),
            head_batchnorm: false,
            head_batchnorm_last: false,
            head_linear_first: false,
            pred_dim: 1,
            seed: 42,
        }
    }

    pub fn wide(mut self, wide: impl ModelComponent + 'static) -> Self {
        self.wide = Some(Box::new(wide));
        self
    }

    pub fn tabular(mut self, tabular: impl ModelComponent + 'static) -> Self {
        self.tabular = Some(Box::new(tabular));
        self
    }

    pub fn text(mut self, text: impl ModelComponent + 'static) -> Self {
        self.text = Some(Box::new(text));
        self
    }

    pub fn image(mut self, image: impl ModelComponent + 'static) -> Self {
        self.image = Some(Box::new(image));
        self
    }

    /// Custom fusion head; must declare `input_dim` and `output_dim`
    pub fn head(mut self, head: impl ModelComponent + 'static) -> Self {
        self.head = Some(Box::new(head));
        self
    }

    /// Hidden widths of a declarative fusion head
    pub fn head_layers(mut self, layers: Vec<usize>) -> Self {
        self.head_layers = Some(layers);
        self
    }

    /// One of `relu`, `leaky_relu`, `tanh`, `gelu`; checked in `build`
    pub fn head_activation(mut self, activation: impl Into<String>) -> Self {
        self.head_activation = activation.into();
        self
    }

    pub fn head_dropout(mut self, dropout: Dropout) -> Self {
        self.head_dropout = dropout;
        self
    }

    pub fn head_batchnorm(mut self, batchnorm: bool) -> Self {
        self.head_batchnorm = batchnorm;
        self
    }

    pub fn head_batchnorm_last(mut self, batchnorm_last: bool) -> Self {
        self.head_batchnorm_last = batchnorm_last;
        self
    }

    pub fn head_linear_first(mut self, linear_first: bool) -> Self {
        self.head_linear_first = linear_first;
        self
    }

    pub fn pred_dim(mut self, pred_dim: usize) -> Self {
        self.pred_dim = pred_dim;
        self
    }

    /// Seed for the head's dropout masks
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Apply `pred_dim` and the declarative head settings from a config
    pub fn with_config(mut self, config: &ModelConfig) -> Self {
        self.pred_dim = config.pred_dim;
        if let Some(head) = &config.head {
            self.head_layers = Some(head.layers.clone());
            self.head_activation = head.activation.clone();
            self.head_dropout = head.dropout.clone();
            self.head_batchnorm = head.batchnorm;
            self.head_batchnorm_last = head.batchnorm_last;
            self.head_linear_first = head.linear_first;
        }
        self
    }

    /// Validate the components and assemble the model
    ///
    /// # Errors
    ///
    /// Checked in order:
    /// 1. [`Error::WideOutputMismatch`]: wide output width differs from `pred_dim`
    /// 2. [`Error::MissingOutputDim`]: a deep branch does not declare `output_dim`
    /// 3. [`Error::ConflictingHead`]: both `head` and `head_layers` were given
    /// 4. [`Error::HeadWithoutDeepComponent`]: `head_layers` without a deep branch
    /// 5. [`Error::MissingHeadInputDim`] / [`Error::HeadInputMismatch`]: custom
    ///    head input width differs from the concatenated deep width
    ///
    /// followed by [`Error::EmptyModel`] and head construction errors.
    pub fn build(self) -> Result<WideDeep> {
        let pred_dim = self.pred_dim;

        if let Some(wide) = &self.wide {
            let width = wide.output_dim().ok_or(Error::MissingOutputDim { component: "wide" })?;
            if width != pred_dim {
                return Err(Error::WideOutputMismatch { wide: width, pred_dim });
            }
        }

        let mut deep_dims = [0usize; 3];
        for (i, (name, branch)) in
            [("tabular", &self.tabular), ("text", &self.text), ("image", &self.image)]
                .into_iter()
                .enumerate()
        {
            if let Some(branch) = branch {
                deep_dims[i] =
                    branch.output_dim().ok_or(Error::MissingOutputDim { component: name })?;
            }
        }
        let deep_dim: usize = deep_dims.iter().sum();
        let has_deep = self.tabular.is_some() || self.text.is_some() || self.image.is_some();

        if self.head.is_some() && self.head_layers.is_some() {
            return Err(Error::ConflictingHead);
        }
        if self.head_layers.is_some() && !has_deep {
            return Err(Error::HeadWithoutDeepComponent);
        }
        if let Some(head) = &self.head {
            let head_input = head.input_dim().ok_or(Error::MissingHeadInputDim)?;
            if head_input != deep_dim {
                return Err(Error::HeadInputMismatch { head_input, deep_output: deep_dim });
            }
        }
        if self.wide.is_none() && !has_deep {
            return Err(Error::EmptyModel);
        }

        let head = if let Some(layers) = self.head_layers {
            let mlp = MlpBuilder::new(deep_dim, layers)
                .activation(self.head_activation.parse()?)
                .dropout(self.head_dropout)
                .batchnorm(self.head_batchnorm)
                .batchnorm_last(self.head_batchnorm_last)
                .linear_first(self.head_linear_first)
                .seed(self.seed)
                .build()?;
            let last = mlp.dims().last().copied().unwrap_or(deep_dim);
            Some(FusionHead {
                net: Box::new(mlp),
                projection: Linear::new(last, pred_dim),
                declared: true,
            })
        } else if let Some(head) = self.head {
            let out = head.output_dim().ok_or(Error::MissingOutputDim { component: "head" })?;
            Some(FusionHead { net: head, projection: Linear::new(out, pred_dim), declared: false })
        } else {
            None
        };

        // Without a head each deep branch projects itself to pred_dim
        let project = head.is_none();
        let branch = |net: Option<Box<dyn ModelComponent>>, output_dim: usize| {
            net.map(|net| DeepBranch {
                net,
                output_dim,
                projection: project.then(|| Linear::new(output_dim, pred_dim)),
            })
        };

        let model = WideDeep {
            wide: self.wide,
            tabular: branch(self.tabular, deep_dims[0]),
            text: branch(self.text, deep_dims[1]),
            image: branch(self.image, deep_dims[2]),
            head,
            pred_dim,
            training: true,
        };

        tracing::debug!(
            pred_dim,
            deep_dim,
            wide = model.has_wide(),
            head = match &model.head {
                None => "none",
                Some(h) if h.declared => "declared",
                Some(_) => "custom",
            },
            "composed wide & deep model"
        );

        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::{backward, sum};
    use crate::models::{Mlp, Wide};

    /// Branch that does not declare its output width
    struct Opaque;

    impl ModelComponent for Opaque {
        fn forward(&self, x: &Tensor, _batch_size: usize) -> Tensor {
            x.clone()
        }

        fn output_dim(&self) -> Option<usize> {
            None
        }

        fn parameters(&self) -> Vec<&Tensor> {
            Vec::new()
        }
    }

    fn input(batch: usize) -> ModelInput {
        let fill = |n: usize| {
            Tensor::from_vec((0..n).map(|i| ((i as f32) * 0.37).sin()).collect(), false)
        };
        ModelInput::new(batch)
            .with_wide(Tensor::from_vec(
                (0..batch * 2).map(|i| (i % 5 + 1) as f32).collect(),
                false,
            ))
            .with_tabular(fill(batch * 4))
            .with_text(fill(batch * 6))
            .with_image(fill(batch * 3))
    }

    fn err(builder: WideDeepBuilder) -> Error {
        match builder.build() {
            Err(e) => e,
            Ok(_) => panic!("expected build to fail"),
        }
    }

    #[test]
    fn test_wide_width_must_match_pred_dim() {
        let e = err(WideDeep::builder().wide(Wide::new(5, 2)).pred_dim(1));
        assert!(matches!(e, Error::WideOutputMismatch { wide: 2, pred_dim: 1 }));
        assert!(e.is_configuration_error());
    }

    #[test]
    fn test_missing_output_dim_names_branch() {
        for (builder, expected) in [
            (WideDeep::builder().tabular(Opaque), "tabular"),
            (WideDeep::builder().text(Opaque), "text"),
            (WideDeep::builder().tabular(Linear::new(4, 2)).image(Opaque), "image"),
        ] {
            match err(builder) {
                Error::MissingOutputDim { component } => assert_eq!(component, expected),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_head_and_head_layers_conflict() {
        let e = err(WideDeep::builder()
            .tabular(Linear::new(4, 3))
            .head(Linear::new(3, 2))
            .head_layers(vec![8]));
        assert!(matches!(e, Error::ConflictingHead));
    }

    #[test]
    fn test_head_layers_need_deep_branch() {
        let e = err(WideDeep::builder().wide(Wide::new(5, 1)).head_layers(vec![8]));
        assert!(matches!(e, Error::HeadWithoutDeepComponent));
    }

    #[test]
    fn test_custom_head_input_must_match() {
        let e = err(WideDeep::builder()
            .tabular(Linear::new(4, 3))
            .text(Linear::new(6, 5))
            .head(Linear::new(7, 2)));
        assert!(matches!(e, Error::HeadInputMismatch { head_input: 7, deep_output: 8 }));

        let e = err(WideDeep::builder().tabular(Linear::new(4, 3)).head(Opaque));
        assert!(matches!(e, Error::MissingHeadInputDim));
    }

    #[test]
    fn test_validation_order() {
        // wide mismatch is reported before the missing output_dim
        let e = err(WideDeep::builder().wide(Wide::new(5, 3)).tabular(Opaque));
        assert!(matches!(e, Error::WideOutputMismatch { .. }));
        // missing output_dim is reported before the head conflict
        let e = err(WideDeep::builder().tabular(Opaque).head(Opaque).head_layers(vec![2]));
        assert!(matches!(e, Error::MissingOutputDim { .. }));
    }

    #[test]
    fn test_empty_model_rejected() {
        assert!(matches!(err(WideDeep::builder()), Error::EmptyModel));
    }

    #[test]
    fn test_invalid_activation_rejected() {
        let e = err(WideDeep::builder()
            .tabular(Linear::new(4, 3))
            .head_layers(vec![8])
            .head_activation("softsign"));
        assert!(matches!(e, Error::InvalidActivation(ref s) if s == "softsign"));
    }

    #[test]
    fn test_wide_only_equals_wide() {
        let model = WideDeep::builder().wide(Wide::new(5, 2)).pred_dim(2).build().unwrap();
        let batch = input(3);
        let expected = Wide::new(5, 2).forward(batch.wide.as_ref().unwrap(), 3);
        assert_eq!(model.forward(&batch).data(), expected.data());
    }

    #[test]
    fn test_single_deep_branch_equals_its_projection() {
        let model = WideDeep::builder().tabular(Linear::new(4, 3)).pred_dim(2).build().unwrap();
        let batch = input(3);

        let branch = model.tabular.as_ref().unwrap();
        let projection = branch.projection.as_ref().unwrap();
        let x = batch.tabular.as_ref().unwrap();
        let expected = projection.forward(&branch.net.forward(x, 3), 3);

        assert_eq!(model.forward(&batch).data(), expected.data());
        assert_eq!(model.forward(&batch).len(), 3 * 2);
    }

    #[test]
    fn test_no_head_sums_branch_projections() {
        let model = WideDeep::builder()
            .wide(Wide::new(5, 1))
            .tabular(Linear::new(4, 2))
            .image(Linear::new(3, 5))
            .build()
            .unwrap();
        let batch = input(2);

        let w = model.wide.as_ref().unwrap().forward(batch.wide.as_ref().unwrap(), 2);
        let t = model.tabular.as_ref().unwrap().forward(batch.tabular.as_ref().unwrap(), 2);
        let i = model.image.as_ref().unwrap().forward(batch.image.as_ref().unwrap(), 2);
        let expected = w.data() + t.data() + i.data();

        assert_eq!(model.forward(&batch).data(), &expected);
    }

    #[test]
    fn test_head_sees_branches_in_fixed_order() {
        // identity head exposes the concatenation to the projection
        let mut identity = Linear::without_bias(2 + 3, 2 + 3);
        identity.weight = Tensor::from_vec(
            (0..25).map(|i| if i % 6 == 0 { 1.0 } else { 0.0 }).collect(),
            false,
        );
        let model = WideDeep::builder()
            .image(Linear::new(3, 3))
            .tabular(Linear::new(4, 2))
            .head(identity)
            .pred_dim(1)
            .build()
            .unwrap();
        assert!(model.has_head());
        assert!(!model.has_declared_head());

        let batch = input(2);
        let tab = model.tabular.as_ref().unwrap().net.forward(batch.tabular.as_ref().unwrap(), 2);
        let img = model.image.as_ref().unwrap().net.forward(batch.image.as_ref().unwrap(), 2);
        let concat = concat_columns(&[(&tab, 2), (&img, 3)], 2);
        let head = model.head.as_ref().unwrap();
        let expected = head.projection.forward(&concat, 2);

        assert_eq!(model.forward(&batch).data(), expected.data());
    }

    #[test]
    fn test_declared_head_shapes() {
        let model = WideDeep::builder()
            .wide(Wide::new(5, 3))
            .tabular(Linear::new(4, 4))
            .text(Linear::new(6, 2))
            .head_layers(vec![8, 4])
            .head_batchnorm(true)
            .pred_dim(3)
            .build()
            .unwrap();

        assert!(model.has_declared_head());
        assert_eq!(model.deep_output_dim(), 6);
        assert_eq!(model.tabular_output_dim(), Some(4));
        assert_eq!(model.text_output_dim(), Some(2));
        assert_eq!(model.image_output_dim(), None);
        assert!(model.tabular.as_ref().unwrap().projection.is_none());

        let head = model.head.as_ref().unwrap();
        assert_eq!(head.net.input_dim(), Some(6));
        assert_eq!(head.projection.out_features(), 3);
        assert_eq!(model.forward(&input(4)).len(), 4 * 3);
    }

    #[test]
    fn test_custom_head_projection_is_fixed() {
        let model = WideDeep::builder()
            .tabular(Linear::new(4, 3))
            .head(Linear::new(3, 7))
            .pred_dim(2)
            .build()
            .unwrap();
        let batch = input(2);
        let a = model.forward(&batch);
        let b = model.forward(&batch);
        assert_eq!(a.data(), b.data());
        assert_eq!(a.len(), 2 * 2);
    }

    #[test]
    fn test_eval_forward_is_idempotent() {
        let mut model = WideDeep::builder()
            .wide(Wide::new(5, 1))
            .tabular(Linear::new(4, 8))
            .text(Linear::new(6, 8))
            .head_layers(vec![16, 8])
            .head_dropout(Dropout::Uniform(0.5))
            .head_batchnorm(true)
            .build()
            .unwrap();
        model.eval();
        assert!(!model.is_training());

        let batch = input(4);
        let a = model.forward(&batch);
        let b = model.forward(&batch);
        assert_eq!(a.data(), b.data());

        model.train();
        assert!(model.is_training());
    }

    #[test]
    fn test_gradients_reach_all_parameters() {
        let model = WideDeep::builder()
            .wide(Wide::new(5, 1))
            .tabular(Linear::new(4, 3))
            .text(Linear::new(6, 2))
            .head_layers(vec![4])
            .build()
            .unwrap();
        let mut loss = sum(&model.forward(&input(3)));
        backward(&mut loss, None);

        let params = model.parameters();
        // wide 2, tabular 2, text 2, head linear 2, projection 2
        assert_eq!(params.len(), 10);
        for p in params {
            assert!(p.grad().is_some());
        }
    }

    #[test]
    fn test_with_config() {
        let config: ModelConfig =
            serde_yaml::from_str("pred_dim: 2\nhead:\n  layers: [5]\n  activation: tanh\n").unwrap();
        let model = WideDeep::builder()
            .tabular(Linear::new(4, 3))
            .with_config(&config)
            .build()
            .unwrap();
        assert_eq!(model.pred_dim(), 2);
        assert!(model.has_declared_head());
        assert_eq!(model.forward(&input(2)).len(), 2 * 2);
    }

    #[test]
    #[should_panic(expected = "no 'text' tensor")]
    fn test_missing_slot_panics() {
        let model = WideDeep::builder().text(Linear::new(6, 2)).build().unwrap();
        model.forward(&ModelInput::new(2));
    }

    #[test]
    fn test_mlp_is_a_valid_custom_head() {
        let head: Mlp = MlpBuilder::new(3, vec![4]).build().unwrap();
        let model = WideDeep::builder().tabular(Linear::new(4, 3)).head(head).build().unwrap();
        assert_eq!(model.forward(&input(2)).len(), 2);
    }
}
