//! Inverted dropout

use crate::autograd::{BackwardOp, GradCell, Tensor};
use ndarray::Array1;
use rand::Rng;
use std::rc::Rc;

/// Zero each element with probability `p` and scale survivors by `1 / (1 - p)`
///
/// `p == 0` returns the input unchanged (same tape node).
pub fn dropout<R: Rng + ?Sized>(x: &Tensor, p: f32, rng: &mut R) -> Tensor {
    assert!((0.0..1.0).contains(&p), "dropout probability must be in [0, 1), got {p}");
    if p == 0.0 {
        return x.clone();
    }

    let keep = 1.0 / (1.0 - p);
    let mask: Array1<f32> =
        (0..x.len()).map(|_| if rng.random::<f32>() < p { 0.0 } else { keep }).collect();
    let data = x.data() * &mask;
    let requires_grad = x.requires_grad();

    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let backward_op =
            Rc::new(DropoutBackward { x: x.clone(), mask, result_grad: result.grad_cell() });
        result.set_backward_op(backward_op);
    }

    result
}

struct DropoutBackward {
    x: Tensor,
    mask: Array1<f32>,
    result_grad: GradCell,
}

impl BackwardOp for DropoutBackward {
    fn inputs(&self) -> Vec<&Tensor> {
        vec![&self.x]
    }

    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.x.requires_grad() {
                self.x.accumulate_grad(grad * &self.mask);
            }
        }
    }
}
