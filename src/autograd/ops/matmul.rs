//! Matrix multiplication autograd operations
//!
//! Row-major GEMM through ndarray; the backward pass reuses the same kernel
//! on transposed views.

use crate::autograd::{BackwardOp, GradCell, Tensor};
use crate::trace::{TraceStep, TRACER};
use ndarray::{Array1, ArrayView2};
use std::rc::Rc;

/// Transpose a row-major matrix (rows x cols) to (cols x rows)
pub fn transpose(data: &[f32], rows: usize, cols: usize) -> Vec<f32> {
    let mut transposed = vec![0.0f32; rows * cols];
    for r in 0..rows {
        for c in 0..cols {
            transposed[c * rows + r] = data[r * cols + c];
        }
    }
    transposed
}

/// Compute `(m, k) @ (k, n)` on row-major slices
pub fn matmul_compute(a: &[f32], b: &[f32], m: usize, k: usize, n: usize) -> Vec<f32> {
    TRACER.start(TraceStep::Matmul);
    let (Ok(a), Ok(b)) = (ArrayView2::from_shape((m, k), a), ArrayView2::from_shape((k, n), b))
    else {
        panic!("matmul: operands do not match {m}x{k} @ {k}x{n}");
    };
    let c = a.dot(&b);
    TRACER.end(TraceStep::Matmul, format!("{m}x{k}x{n}"));
    c.into_iter().collect()
}

/// Matrix multiplication `(m, k) @ (k, n) -> (m, n)`
pub fn matmul(a: &Tensor, b: &Tensor, m: usize, k: usize, n: usize) -> Tensor {
    assert_eq!(a.len(), m * k, "matmul: left operand is not {m}x{k}");
    assert_eq!(b.len(), k * n, "matmul: right operand is not {k}x{n}");

    let data = matmul_compute(as_slice(a), as_slice(b), m, k, n);
    let requires_grad = a.requires_grad() || b.requires_grad();

    let mut result = Tensor::from_vec(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(MatmulBackward {
            a: a.clone(),
            b: b.clone(),
            m,
            k,
            n,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

fn as_slice(t: &Tensor) -> &[f32] {
    t.data().as_slice().expect("tensor data must be contiguous")
}

struct MatmulBackward {
    a: Tensor,
    b: Tensor,
    m: usize,
    k: usize,
    n: usize,
    result_grad: GradCell,
}

impl BackwardOp for MatmulBackward {
    fn inputs(&self) -> Vec<&Tensor> {
        vec![&self.a, &self.b]
    }

    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            let grad = grad.as_slice().expect("gradient must be contiguous");
            let (m, k, n) = (self.m, self.k, self.n);

            if self.a.requires_grad() {
                // ∂L/∂A = ∂L/∂C @ Bᵀ
                let b_t = transpose(as_slice(&self.b), k, n);
                let grad_a = matmul_compute(grad, &b_t, m, n, k);
                self.a.accumulate_grad(Array1::from(grad_a));
            }
            if self.b.requires_grad() {
                // ∂L/∂B = Aᵀ @ ∂L/∂C
                let a_t = transpose(as_slice(&self.a), m, k);
                let grad_b = matmul_compute(&a_t, grad, k, m, n);
                self.b.accumulate_grad(Array1::from(grad_b));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::backward;

    #[test]
    fn test_transpose_roundtrip() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let t = transpose(&data, 2, 3);
        assert_eq!(t, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert_eq!(transpose(&t, 3, 2), data);
    }

    #[test]
    fn test_matmul_forward() {
        // [1 2; 3 4] @ [5; 6] = [17; 39]
        let a = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], false);
        let b = Tensor::from_vec(vec![5.0, 6.0], false);
        let c = matmul(&a, &b, 2, 2, 1);
        assert_eq!(c.data().to_vec(), vec![17.0, 39.0]);
    }

    #[test]
    fn test_matmul_backward_shapes() {
        let a = Tensor::from_vec(vec![1.0; 6], true);
        let b = Tensor::from_vec(vec![1.0; 12], true);
        let mut c = matmul(&a, &b, 2, 3, 4);
        backward(&mut c, None);
        assert_eq!(a.grad().unwrap().len(), 6);
        assert_eq!(b.grad().unwrap().len(), 12);
        // every a entry feeds four outputs with weight 1
        assert!(a.grad().unwrap().iter().all(|&g| g == 4.0));
        // every b entry sees two rows of ones
        assert!(b.grad().unwrap().iter().all(|&g| g == 2.0));
    }
}
