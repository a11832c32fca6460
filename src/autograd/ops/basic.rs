//! Basic autograd operations: add, mul, scale, sum, mean, row bias, column concat

use crate::autograd::{BackwardOp, GradCell, Tensor};
use crate::trace::{TraceStep, TRACER};
use ndarray::{s, Array1, Array2, ArrayView2, Axis};
use std::rc::Rc;

/// Add two tensors
pub fn add(a: &Tensor, b: &Tensor) -> Tensor {
    assert_eq!(a.len(), b.len(), "add: operands must have same length");
    let data = a.data() + b.data();
    let requires_grad = a.requires_grad() || b.requires_grad();

    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(AddBackward {
            a: a.clone(),
            b: b.clone(),
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct AddBackward {
    a: Tensor,
    b: Tensor,
    result_grad: GradCell,
}

impl BackwardOp for AddBackward {
    fn inputs(&self) -> Vec<&Tensor> {
        vec![&self.a, &self.b]
    }

    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                self.a.accumulate_grad(grad.clone());
            }
            if self.b.requires_grad() {
                self.b.accumulate_grad(grad.clone());
            }
        }
    }
}

/// Multiply two tensors element-wise
pub fn mul(a: &Tensor, b: &Tensor) -> Tensor {
    assert_eq!(a.len(), b.len(), "mul: operands must have same length");
    let data = a.data() * b.data();
    let requires_grad = a.requires_grad() || b.requires_grad();

    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(MulBackward {
            a: a.clone(),
            b: b.clone(),
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct MulBackward {
    a: Tensor,
    b: Tensor,
    result_grad: GradCell,
}

impl BackwardOp for MulBackward {
    fn inputs(&self) -> Vec<&Tensor> {
        vec![&self.a, &self.b]
    }

    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                // ∂L/∂a = ∂L/∂out * b
                self.a.accumulate_grad(grad * self.b.data());
            }
            if self.b.requires_grad() {
                // ∂L/∂b = ∂L/∂out * a
                self.b.accumulate_grad(grad * self.a.data());
            }
        }
    }
}

/// Scale tensor by a scalar
pub fn scale(a: &Tensor, factor: f32) -> Tensor {
    let data = a.data() * factor;
    let requires_grad = a.requires_grad();

    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let backward_op =
            Rc::new(ScaleBackward { a: a.clone(), factor, result_grad: result.grad_cell() });
        result.set_backward_op(backward_op);
    }

    result
}

struct ScaleBackward {
    a: Tensor,
    factor: f32,
    result_grad: GradCell,
}

impl BackwardOp for ScaleBackward {
    fn inputs(&self) -> Vec<&Tensor> {
        vec![&self.a]
    }

    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                self.a.accumulate_grad(grad * self.factor);
            }
        }
    }
}

/// Sum all elements
pub fn sum(a: &Tensor) -> Tensor {
    reduce(a, 1.0)
}

/// Mean of all elements
pub fn mean(a: &Tensor) -> Tensor {
    let n = a.len().max(1) as f32;
    reduce(a, 1.0 / n)
}

fn reduce(a: &Tensor, factor: f32) -> Tensor {
    let data = Array1::from(vec![a.data().sum() * factor]);
    let requires_grad = a.requires_grad();

    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let backward_op =
            Rc::new(ReduceBackward { a: a.clone(), factor, result_grad: result.grad_cell() });
        result.set_backward_op(backward_op);
    }

    result
}

struct ReduceBackward {
    a: Tensor,
    factor: f32,
    result_grad: GradCell,
}

impl BackwardOp for ReduceBackward {
    fn inputs(&self) -> Vec<&Tensor> {
        vec![&self.a]
    }

    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                // broadcast the scalar gradient
                self.a.accumulate_grad(Array1::from_elem(self.a.len(), grad[0] * self.factor));
            }
        }
    }
}

/// Add a `cols`-wide bias to every row of a `(rows, cols)` matrix
pub fn add_row_bias(x: &Tensor, bias: &Tensor, rows: usize, cols: usize) -> Tensor {
    assert_eq!(x.len(), rows * cols, "add_row_bias: input is not {rows}x{cols}");
    assert_eq!(bias.len(), cols, "add_row_bias: bias must have {cols} entries");

    let mut data = x.data().clone();
    for (i, v) in data.iter_mut().enumerate() {
        *v += bias.data()[i % cols];
    }

    let requires_grad = x.requires_grad() || bias.requires_grad();
    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(RowBiasBackward {
            x: x.clone(),
            bias: bias.clone(),
            rows,
            cols,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct RowBiasBackward {
    x: Tensor,
    bias: Tensor,
    rows: usize,
    cols: usize,
    result_grad: GradCell,
}

impl BackwardOp for RowBiasBackward {
    fn inputs(&self) -> Vec<&Tensor> {
        vec![&self.x, &self.bias]
    }

    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.x.requires_grad() {
                self.x.accumulate_grad(grad.clone());
            }
            if self.bias.requires_grad() {
                // ∂L/∂bias = column sums of ∂L/∂out
                let grad_bias = ArrayView2::from_shape(
                    (self.rows, self.cols),
                    grad.as_slice().unwrap_or(&[]),
                )
                .map(|g| g.sum_axis(Axis(0)))
                .unwrap_or_else(|_| Array1::zeros(self.cols));
                self.bias.accumulate_grad(grad_bias);
            }
        }
    }
}

/// Concatenate `(rows, width_i)` matrices along the feature axis.
///
/// Parts are `(tensor, width)` pairs; the result is `(rows, Σ width_i)`.
pub fn concat_columns(parts: &[(&Tensor, usize)], rows: usize) -> Tensor {
    TRACER.start(TraceStep::Concat);
    let total: usize = parts.iter().map(|(_, w)| w).sum();
    let mut out = Array2::<f32>::zeros((rows, total));

    let mut offset = 0;
    for (tensor, width) in parts {
        assert_eq!(
            tensor.len(),
            rows * width,
            "concat_columns: part is not {rows}x{width}"
        );
        let view = ArrayView2::from_shape((rows, *width), tensor.data().as_slice().unwrap_or(&[]))
            .expect("concat_columns: part must be contiguous");
        out.slice_mut(s![.., offset..offset + width]).assign(&view);
        offset += width;
    }

    let data = Array1::from_iter(out.into_iter());
    let requires_grad = parts.iter().any(|(t, _)| t.requires_grad());
    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(ConcatBackward {
            parts: parts.iter().map(|(t, w)| ((*t).clone(), *w)).collect(),
            rows,
            total,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    TRACER.end(TraceStep::Concat, format!("{rows}x{total}"));
    result
}

struct ConcatBackward {
    parts: Vec<(Tensor, usize)>,
    rows: usize,
    total: usize,
    result_grad: GradCell,
}

impl BackwardOp for ConcatBackward {
    fn inputs(&self) -> Vec<&Tensor> {
        self.parts.iter().map(|(t, _)| t).collect()
    }

    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            let Ok(grad_2d) =
                ArrayView2::from_shape((self.rows, self.total), grad.as_slice().unwrap_or(&[]))
            else {
                return;
            };

            let mut offset = 0;
            for (part, width) in &self.parts {
                if part.requires_grad() {
                    let slice = grad_2d.slice(s![.., offset..offset + width]);
                    part.accumulate_grad(Array1::from_iter(slice.iter().copied()));
                }
                offset += width;
            }
        }
    }
}
