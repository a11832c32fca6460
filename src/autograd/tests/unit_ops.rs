//! Unit tests for autograd operations (forward and backward)

use crate::autograd::{
    add, backward, concat_columns, matmul, mul, relu, scale, sigmoid, sum, Tensor,
};
use approx::assert_abs_diff_eq;

#[test]
fn test_tensor_creation() {
    let t = Tensor::from_vec(vec![1.0, 2.0, 3.0], true);
    assert_eq!(t.len(), 3);
    assert!(t.requires_grad());
    assert!(t.grad().is_none());
}

#[test]
fn test_tensor_grad_accumulation() {
    let t = Tensor::from_vec(vec![1.0, 2.0, 3.0], true);

    t.accumulate_grad(ndarray::arr1(&[1.0, 1.0, 1.0]));
    assert_eq!(t.grad().expect("gradient should be available")[0], 1.0);

    t.accumulate_grad(ndarray::arr1(&[1.0, 1.0, 1.0]));
    assert_eq!(t.grad().expect("gradient should be available")[0], 2.0);
}

#[test]
fn test_scale_backward() {
    let a = Tensor::from_vec(vec![1.0, 2.0], true);
    let mut c = scale(&a, 3.0);
    backward(&mut c, None);
    assert_abs_diff_eq!(a.grad().unwrap()[1], 3.0);
}

#[test]
fn test_no_tape_without_grad() {
    let a = Tensor::from_vec(vec![1.0, 2.0], false);
    let b = Tensor::from_vec(vec![3.0, 4.0], false);
    let c = mul(&a, &relu(&b));
    assert!(!c.requires_grad());
    assert!(c.is_leaf());
}

#[test]
fn test_chain_linear_sigmoid_sum() {
    // y = Σ σ(x @ w), x: 1x2, w: 2x1
    let x = Tensor::from_vec(vec![1.0, -1.0], false);
    let w = Tensor::from_vec(vec![0.5, 0.5], true);
    let z = matmul(&x, &w, 1, 2, 1);
    let mut y = sum(&sigmoid(&z));
    assert_abs_diff_eq!(y.data()[0], 0.5, epsilon = 1e-6);

    backward(&mut y, None);
    // σ'(0) = 0.25, times x
    let g = w.grad().unwrap();
    assert_abs_diff_eq!(g[0], 0.25, epsilon = 1e-6);
    assert_abs_diff_eq!(g[1], -0.25, epsilon = 1e-6);
}

#[test]
fn test_shared_leaf_accumulates() {
    // a is a leaf used by two consumers
    let a = Tensor::from_vec(vec![2.0], true);
    let b = Tensor::from_vec(vec![3.0], false);
    let mut c = add(&mul(&a, &b), &a);
    backward(&mut c, None);
    assert_abs_diff_eq!(a.grad().unwrap()[0], 4.0);
}

#[test]
fn test_concat_then_matmul() {
    let a = Tensor::from_vec(vec![1.0, 2.0], true);
    let b = Tensor::from_vec(vec![3.0, 4.0], true);
    // two 2x1 columns → 2x2
    let cat = concat_columns(&[(&a, 1), (&b, 1)], 2);
    let w = Tensor::from_vec(vec![1.0, 10.0], false);
    let mut y = sum(&matmul(&cat, &w, 2, 2, 1));
    assert_abs_diff_eq!(y.data()[0], 1.0 + 30.0 + 2.0 + 40.0);

    backward(&mut y, None);
    assert_eq!(a.grad().unwrap().to_vec(), vec![1.0, 1.0]);
    assert_eq!(b.grad().unwrap().to_vec(), vec![10.0, 10.0]);
}

#[test]
fn test_shared_intermediate_counted_once() {
    // h = x @ w consumed twice: y = Σ(h + h), ∂y/∂w = 2x
    let x = Tensor::from_vec(vec![1.0, 2.0], false);
    let w = Tensor::from_vec(vec![3.0, 4.0], true);
    let h = matmul(&x, &w, 1, 2, 1);
    let mut y = sum(&add(&h, &h));
    backward(&mut y, None);
    assert_eq!(w.grad().unwrap().to_vec(), vec![2.0, 4.0]);
}

#[test]
fn test_residual_block_gradient() {
    // y = Σ(h + relu(h)), h = 3w; h > 0 so ∂y/∂w = 3 * 2
    let w = Tensor::from_vec(vec![1.0, 2.0], true);
    let h = scale(&w, 3.0);
    let mut y = sum(&add(&h, &relu(&h)));
    backward(&mut y, None);
    assert_eq!(w.grad().unwrap().to_vec(), vec![6.0, 6.0]);
}

#[test]
fn test_diamond_graph_gradient() {
    // a = 2w, b = a * a, c = a + b, y = Σ c; ∂y/∂w = 2 (1 + 2a)
    let w = Tensor::from_vec(vec![0.5, -1.0], true);
    let a = scale(&w, 2.0);
    let b = mul(&a, &a);
    let mut y = sum(&add(&a, &b));
    backward(&mut y, None);
    let grad = w.grad().unwrap();
    assert_abs_diff_eq!(grad[0], 2.0 * (1.0 + 2.0 * 1.0), epsilon = 1e-6);
    assert_abs_diff_eq!(grad[1], 2.0 * (1.0 + 2.0 * -2.0), epsilon = 1e-6);
}
