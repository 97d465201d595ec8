//! Engine construction and assembly operations

use narray::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn test_engine_order_fixes_storage() {
    let c: Tensor<f64> = Engine::new(Order::C).seq([2, 3]);
    assert!(c.layout().is_c_dense());
    let f: Tensor<f64> = Engine::new(Order::F).seq([2, 3]);
    assert!(f.layout().is_f_dense());
    // logical contents agree regardless of storage order
    assert_eq!(c.to_vec(Order::C), f.to_vec(Order::F));
}

#[test]
fn test_concat_rows_in_c_traversal() {
    let e = Engine::default();
    let a: Tensor<f64> = e.wrap([2, 3], (1..=6).map(f64::from).collect()).unwrap();
    let b: Tensor<f64> = e.wrap([3, 3], (7..=15).map(f64::from).collect()).unwrap();
    let c: Tensor<f64> = e.wrap([1, 3], (16..=18).map(f64::from).collect()).unwrap();
    let cat = e.concat(0, &[&a, &b, &c]).unwrap();
    assert_eq!(cat.shape().as_slice(), &[6, 3]);
    let expected: Vec<f64> = (1..=18).map(f64::from).collect();
    assert_eq!(cat.to_vec(Order::C), expected);
}

#[test]
fn test_concat_columns() {
    let e = Engine::default();
    let a: Tensor<f64> = e.seq([2, 2]);
    let b: Tensor<f64> = e.seq([2, 1]);
    let cat = e.concat(1, &[&a, &b]).unwrap();
    assert_eq!(cat.shape().as_slice(), &[2, 3]);
    assert_eq!(cat.to_vec(Order::C), vec![0.0, 1.0, 0.0, 2.0, 3.0, 1.0]);
}

#[test]
fn test_concat_rejects_mismatched_inputs() {
    let e = Engine::default();
    let a: Tensor<f64> = e.zeros([2, 3]);
    let b: Tensor<f64> = e.zeros([2, 4]);
    let err = e.concat(0, &[&a, &b]).unwrap_err();
    assert!(err
        .to_string()
        .contains("Tensors are not valid for concatenation"));
}

#[test]
fn test_stack_every_axis() {
    let e = Engine::default();
    let a: Tensor<f64> = e.seq([2, 3]);
    let b = a.add_scalar(6.0);
    for (axis, expected) in [(0, [2, 2, 3]), (1, [2, 2, 3]), (2, [2, 3, 2])] {
        let s = e.stack(axis, &[&a, &b]).unwrap();
        assert_eq!(s.shape().as_slice(), &expected);
    }
    let s = e.stack(0, &[&a, &b]).unwrap();
    assert_eq!(s.get(&[0, 1, 2]).unwrap(), 5.0);
    assert_eq!(s.get(&[1, 1, 2]).unwrap(), 11.0);
}

#[test]
fn test_stack_rejects_shape_mismatch() {
    let e = Engine::default();
    let a: Tensor<f64> = e.zeros([2, 3]);
    let b: Tensor<f64> = e.zeros([3, 2]);
    let err = e.stack(0, &[&a, &b]).unwrap_err();
    assert!(err
        .to_string()
        .contains("Tensors are not valid for stack, they have to have the same dimensions."));
}

#[test]
fn test_strided_construction_validates_bounds() {
    let e = Engine::default();
    let t = e
        .stride([2, 2], 1, [4isize, 2], vec![0.0; 8])
        .unwrap();
    assert_eq!(t.offset(), 1);
    assert!(e.stride([2, 2], 2, [4isize, 2], vec![0.0; 8]).is_err());
}

#[test]
fn test_seeded_random_is_reproducible() {
    let e = Engine::default();
    let mut a = StdRng::seed_from_u64(9);
    let mut b = StdRng::seed_from_u64(9);
    let x: Tensor<f64> = e.random_normal([3, 3], &mut a);
    let y: Tensor<f64> = e.random_normal([3, 3], &mut b);
    assert_eq!(x.to_vec(Order::C), y.to_vec(Order::C));
}

#[test]
fn test_take_reorders_and_repeats() {
    let e = Engine::default();
    let t: Tensor<f64> = e.seq([3, 2]);
    let picked = t.take(0, &[2, 2, 0]).unwrap();
    assert_eq!(picked.to_vec(Order::C), vec![4.0, 5.0, 4.0, 5.0, 0.0, 1.0]);
    let cols = t.take(1, &[1]).unwrap();
    assert_eq!(cols.shape().as_slice(), &[3, 1]);
}

#[test]
fn test_reductions_and_argmin_order() {
    let e = Engine::default();
    let t: Tensor<f64> = e.wrap([2, 2], vec![3.0, -1.0, 2.0, 5.0]).unwrap();
    assert_eq!(t.sum(), 9.0);
    assert_eq!(t.min().unwrap(), -1.0);
    assert_eq!(t.max().unwrap(), 5.0);
    // [0,1] is position 1 in C traversal, position 2 in F traversal
    assert_eq!(t.argmin(Order::C).unwrap(), 1);
    assert_eq!(t.argmin(Order::F).unwrap(), 2);
}
