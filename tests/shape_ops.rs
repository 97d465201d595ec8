//! View and layout operations through the public API

use narray::prelude::*;
use narray::tensor::FastOrder;

fn seq(shape: impl Into<Shape>) -> Tensor<f64> {
    Engine::default().seq(shape)
}

#[test]
fn test_pointer_index_roundtrip() {
    for order in [Order::C, Order::F] {
        let layout = Layout::dense([3, 4, 5], 0, order);
        for i in 0..3 {
            for j in 0..4 {
                for k in 0..5 {
                    let ptr = layout.pointer(&[i, j, k]).unwrap();
                    assert_eq!(layout.index(ptr).unwrap(), vec![i, j, k]);
                }
            }
        }
    }
}

#[test]
fn test_index_rejects_aliased_layouts() {
    let t: Tensor<f64> = Engine::default().zeros([3, 1]);
    let expanded = t.expand(1, 4).unwrap();
    assert!(expanded.layout().index(0).is_err());
}

#[test]
fn test_squeeze_unsqueeze() {
    let t = seq([1, 3, 1, 2]);
    assert_eq!(t.squeeze().shape().as_slice(), &[3, 2]);
    assert_eq!(t.squeeze_axis(0).unwrap().shape().as_slice(), &[3, 1, 2]);
    assert!(t.squeeze_axis(1).is_err());

    let u = seq([3, 2]).unsqueeze(1).unwrap();
    assert_eq!(u.shape().as_slice(), &[3, 1, 2]);
    let trailing = seq([3, 2]).unsqueeze(-1).unwrap();
    assert_eq!(trailing.shape().as_slice(), &[3, 2, 1]);
}

#[test]
fn test_expand_aliases_storage() {
    let t: Tensor<f64> = Engine::default().zeros([1, 3]);
    let e = t.expand(0, 5).unwrap();
    assert_eq!(e.shape().as_slice(), &[5, 3]);
    e.set(&[4, 2], 7.0).unwrap();
    for row in 0..5 {
        assert_eq!(e.get(&[row, 2]).unwrap(), 7.0);
    }
}

#[test]
fn test_narrow_and_narrow_all() {
    let t = seq([4, 4]);
    let mid = t.narrow(0, true, 1, 3).unwrap();
    assert_eq!(mid.shape().as_slice(), &[2, 4]);
    assert_eq!(mid.get(&[0, 0]).unwrap(), 4.0);

    let row = t.narrow(0, false, 2, 3).unwrap();
    assert_eq!(row.shape().as_slice(), &[4]);
    assert_eq!(row.get(&[0]).unwrap(), 8.0);

    let inner = t.narrow_all(true, &[1, 1], &[3, 3]).unwrap();
    assert_eq!(inner.to_vec(Order::C), vec![5.0, 6.0, 9.0, 10.0]);
}

#[test]
fn test_permute_move_swap_revert() {
    let t = seq([2, 3, 4]);
    assert_eq!(t.permute(&[2, 0, 1]).unwrap().shape().as_slice(), &[4, 2, 3]);
    assert_eq!(t.move_axis(0, 2).unwrap().shape().as_slice(), &[3, 4, 2]);
    assert_eq!(t.swap_axis(0, -1).unwrap().shape().as_slice(), &[4, 3, 2]);

    let r = t.revert();
    assert_eq!(r.shape().as_slice(), &[4, 3, 2]);
    // revert reorders axes, it does not flip elements
    assert_eq!(t.get(&[1, 2, 3]).unwrap(), r.get(&[3, 2, 1]).unwrap());
}

#[test]
fn test_transpose() {
    let t = seq([2, 3]);
    let tt = t.t();
    assert_eq!(tt.shape().as_slice(), &[3, 2]);
    assert_eq!(tt.get(&[2, 1]).unwrap(), t.get(&[1, 2]).unwrap());
    // vectors and scalars are their own transpose
    let v = seq([4]);
    assert_eq!(v.t().shape().as_slice(), &[4]);
}

#[test]
fn test_reshape_is_view_when_possible() {
    let t = seq([2, 3, 4]);
    let flat = t.reshape([24], Order::C).unwrap();
    assert_eq!(t.storage().ref_count(), 2);
    assert_eq!(flat.get(&[13]).unwrap(), 13.0);

    // transposed data cannot be reinterpreted, so reshape copies
    let tt = t.t();
    let copied = tt.reshape([24], Order::C).unwrap();
    assert!(copied.storage().is_unique());
    assert_eq!(copied.size(), 24);
}

#[test]
fn test_attempt_reshape_contract() {
    let dense = Layout::dense([2, 3, 4], 0, Order::C);
    assert!(dense
        .attempt_reshape(&Shape::from([6, 4]), Order::C)
        .is_some());
    let transposed = dense.swap_axis(0, 2).unwrap();
    assert!(transposed
        .attempt_reshape(&Shape::from([24]), Order::C)
        .is_none());
}

#[test]
fn test_copy_and_contiguous() {
    let t = seq([3, 3]);
    let view = t.t();
    assert_eq!(view.storage_fast_order(), FastOrder::F);
    let dense = view.contiguous();
    assert!(dense.layout().is_c_dense());
    assert_eq!(dense.get(&[0, 1]).unwrap(), view.get(&[0, 1]).unwrap());

    let f = t.copy(Order::F);
    assert_eq!(f.storage_fast_order(), FastOrder::F);
    assert_eq!(f.to_vec(Order::C), t.to_vec(Order::C));
}

#[test]
fn test_broadcast_elementwise() {
    let t = seq([2, 3]);
    let row: Tensor<f64> = Engine::default().seq([3]);
    let sum = t.add(&row).unwrap();
    assert_eq!(sum.to_vec(Order::C), vec![0.0, 2.0, 4.0, 3.0, 5.0, 7.0]);

    let col: Tensor<f64> = Engine::default().seq([2, 1]);
    let sum = t.add(&col).unwrap();
    assert_eq!(sum.to_vec(Order::C), vec![0.0, 1.0, 2.0, 4.0, 5.0, 6.0]);
}
