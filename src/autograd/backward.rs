//! Backward operation trait

use super::Tensor;

/// A recorded gradient step on the tape.
///
/// Each op reads the gradient accumulated on its result and pushes the local
/// contribution into its inputs. [`crate::autograd::backward`] runs every
/// reachable op exactly once, after all of its consumers, so tensors may feed
/// any number of ops.
pub trait BackwardOp {
    /// Propagate the result gradient to the inputs
    fn backward(&self);

    /// Tensors this op writes gradients into
    fn inputs(&self) -> Vec<&Tensor>;
}
