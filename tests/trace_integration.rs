//! Timing spans recorded by a full forward + loss step

use widedeep::loss::{get_loss_function, LossConfig, LossFn};
use widedeep::models::{Linear, ModelInput, Wide, WideDeep};
use widedeep::trace::{TraceStep, TRACER};
use widedeep::Tensor;

#[test]
fn test_forward_and_loss_are_traced() {
    let model = WideDeep::builder()
        .wide(Wide::new(4, 1))
        .tabular(Linear::new(3, 4))
        .text(Linear::new(2, 2))
        .head_layers(vec![4])
        .build()
        .unwrap();
    let loss_fn = get_loss_function("binary", &LossConfig::default()).unwrap();

    let input = ModelInput::new(2)
        .with_wide(Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], false))
        .with_tabular(Tensor::from_vec(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6], false))
        .with_text(Tensor::from_vec(vec![1.0, 0.0, 0.0, 1.0], false));
    let target = Tensor::from_vec(vec![1.0, 0.0], false);

    TRACER.clear();
    TRACER.enable();
    let logits = model.forward(&input);
    let loss = loss_fn.forward_traced(&logits, &target);
    TRACER.disable();

    assert!(loss.data()[0].is_finite());

    let steps: Vec<TraceStep> = TRACER.measurements().iter().map(|m| m.step).collect();
    for expected in
        [TraceStep::Forward, TraceStep::Head, TraceStep::Concat, TraceStep::Matmul, TraceStep::Loss]
    {
        assert!(steps.contains(&expected), "{expected} missing from {steps:?}");
    }

    let report = TRACER.report();
    assert!(report.contains("Forward"));
    assert!(report.contains("Loss"));
    TRACER.clear();
}
