//! Activation function autograd operations: relu, leaky_relu, tanh, gelu, sigmoid

use crate::autograd::{BackwardOp, GradCell, Tensor};
use ndarray::Array1;
use std::rc::Rc;

/// Negative slope used by [`leaky_relu`]
pub const LEAKY_RELU_SLOPE: f32 = 0.01;

/// Numerically stable logistic function
#[inline]
pub fn sigmoid_scalar(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Tanh approximation of GELU
#[inline]
pub fn gelu_scalar(x: f32) -> f32 {
    const SQRT_2_OVER_PI: f32 = 0.797_884_6;
    const COEFF: f32 = 0.044_715;
    0.5 * x * (1.0 + (SQRT_2_OVER_PI * (x + COEFF * x * x * x)).tanh())
}

/// Element-wise op whose local derivative depends on the input and output values
fn unary(a: &Tensor, f: fn(f32) -> f32, df: fn(f32, f32) -> f32) -> Tensor {
    let data = a.data().mapv(f);
    let requires_grad = a.requires_grad();

    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(UnaryBackward {
            a: a.clone(),
            output: result.data().clone(),
            df,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct UnaryBackward {
    a: Tensor,
    output: Array1<f32>,
    df: fn(f32, f32) -> f32,
    result_grad: GradCell,
}

impl BackwardOp for UnaryBackward {
    fn inputs(&self) -> Vec<&Tensor> {
        vec![&self.a]
    }

    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                let grad_a: Array1<f32> = self
                    .a
                    .data()
                    .iter()
                    .zip(self.output.iter())
                    .zip(grad.iter())
                    .map(|((&x, &y), &g)| g * (self.df)(x, y))
                    .collect();
                self.a.accumulate_grad(grad_a);
            }
        }
    }
}

/// ReLU activation
pub fn relu(a: &Tensor) -> Tensor {
    unary(a, |x| x.max(0.0), |x, _| if x > 0.0 { 1.0 } else { 0.0 })
}

/// Leaky ReLU with slope [`LEAKY_RELU_SLOPE`] for negative inputs
pub fn leaky_relu(a: &Tensor) -> Tensor {
    unary(
        a,
        |x| if x > 0.0 { x } else { LEAKY_RELU_SLOPE * x },
        |x, _| if x > 0.0 { 1.0 } else { LEAKY_RELU_SLOPE },
    )
}

/// Hyperbolic tangent
pub fn tanh(a: &Tensor) -> Tensor {
    // ∂tanh/∂x = 1 - tanh²(x)
    unary(a, f32::tanh, |_, y| 1.0 - y * y)
}

/// Logistic sigmoid
pub fn sigmoid(a: &Tensor) -> Tensor {
    // ∂σ/∂x = σ(x)(1 - σ(x))
    unary(a, sigmoid_scalar, |_, y| y * (1.0 - y))
}

/// GELU activation (Gaussian Error Linear Unit)
///
/// GELU(x) ≈ 0.5 * x * (1 + tanh(√(2/π) * (x + 0.044715 * x³)))
pub fn gelu(a: &Tensor) -> Tensor {
    unary(a, gelu_scalar, |x, _| {
        const SQRT_2_OVER_PI: f32 = 0.797_884_6;
        const COEFF: f32 = 0.044_715;

        // ∂GELU/∂x = 0.5 * (1 + tanh(z)) + 0.5 * x * sech²(z) * dz/dx
        let x2 = x * x;
        let z = SQRT_2_OVER_PI * (x + COEFF * x2 * x);
        let tanh_z = z.tanh();
        let sech2_z = 1.0 - tanh_z * tanh_z;
        let dz_dx = SQRT_2_OVER_PI * (1.0 + 3.0 * COEFF * x2);
        0.5 * (1.0 + tanh_z) + 0.5 * x * sech2_z * dz_dx
    })
}
