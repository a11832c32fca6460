//! Tape-based autograd engine
//!
//! Each differentiable op records a [`BackwardOp`] on its result; calling
//! [`backward`] on a scalar loss walks the tape back to the parameters.
//!
//! ```
//! use widedeep::autograd::{backward, mul, sum, Tensor};
//!
//! let x = Tensor::from_vec(vec![1.0, 2.0, 3.0], true);
//! let w = Tensor::from_vec(vec![0.5, 0.5, 0.5], false);
//! let mut y = sum(&mul(&x, &w));
//! backward(&mut y, None);
//! assert_eq!(x.grad().unwrap()[0], 0.5);
//! ```

mod backward;
mod ops;
mod tensor;

#[cfg(test)]
mod tests;

pub use backward::BackwardOp;
pub use ops::*;
pub use tensor::{GradCell, Tensor};

use std::collections::HashSet;
use std::rc::Rc;

/// Perform backward pass on a tensor
pub fn backward(tensor: &mut Tensor, grad_output: Option<ndarray::Array1<f32>>) {
    if let Some(grad) = grad_output {
        tensor.set_grad(grad);
    } else {
        // Initialize with ones for scalar loss
        let ones = ndarray::Array1::ones(tensor.data().len());
        tensor.set_grad(ones);
    }

    if let Some(root) = tensor.backward_op() {
        for op in topological_order(root).iter().rev() {
            op.backward();
        }
    }
}

fn op_key(op: &Rc<dyn BackwardOp>) -> *const () {
    Rc::as_ptr(op) as *const ()
}

/// Ops reachable from `root`, each listed after every op it feeds into
/// (reversed, consumers come before producers).
fn topological_order(root: Rc<dyn BackwardOp>) -> Vec<Rc<dyn BackwardOp>> {
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![(root, false)];

    while let Some((op, expanded)) = stack.pop() {
        if expanded {
            order.push(op);
            continue;
        }
        if !visited.insert(op_key(&op)) {
            continue;
        }

        let children: Vec<_> = op.inputs().iter().filter_map(|t| t.backward_op()).collect();
        stack.push((op, true));
        for child in children {
            if !visited.contains(&op_key(&child)) {
                stack.push((child, false));
            }
        }
    }

    order
}
