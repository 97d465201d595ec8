//! Engine: tensor construction and assembly
//!
//! An [`Engine`] carries a default traversal [`Order`] and builds tensors in
//! it. Two engines differ only in the storage order of what they create; every
//! tensor they produce is interoperable.

use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::tensor::{Layout, Order, Shape, Storage, Strides, Tensor};
use rand::distributions::{Distribution, Standard};
use rand::Rng;
use rand_distr::StandardNormal;

/// Tensor factory with a fixed default storage order
#[derive(Copy, Clone, Debug, Default)]
pub struct Engine {
    order: Order,
}

impl Engine {
    /// Create an engine producing tensors in the given order
    pub fn new(order: Order) -> Self {
        Self { order }
    }

    /// The order this engine builds tensors in
    pub fn order(&self) -> Order {
        self.order
    }

    fn dense<T: Element>(&self, shape: Shape, storage: Storage<T>) -> Tensor<T> {
        Tensor::from_parts(storage, Layout::dense(shape, 0, self.order))
    }

    /// Zero-filled tensor
    pub fn zeros<T: Element>(&self, shape: impl Into<Shape>) -> Tensor<T> {
        let shape = shape.into();
        let storage = Storage::zeros(shape.size());
        self.dense(shape, storage)
    }

    /// Tensor filled with a constant
    pub fn full<T: Element>(&self, shape: impl Into<Shape>, value: T) -> Tensor<T> {
        let shape = shape.into();
        let storage = Storage::full(shape.size(), value);
        self.dense(shape, storage)
    }

    /// Square identity matrix
    pub fn eye<T: Element>(&self, n: usize) -> Tensor<T> {
        let out = self.zeros([n, n]);
        for i in 0..n {
            out.set2(i, i, T::one());
        }
        out
    }

    /// Tensor counting 0, 1, 2, ... in this engine's traversal order
    pub fn seq<T: Element>(&self, shape: impl Into<Shape>) -> Tensor<T> {
        let shape = shape.into();
        let data: Vec<T> = (0..shape.size()).map(|i| T::from_f64(i as f64)).collect();
        self.dense(shape, Storage::from_vec(data))
    }

    /// Tensor of samples from the uniform standard distribution
    pub fn random<T, R>(&self, shape: impl Into<Shape>, rng: &mut R) -> Tensor<T>
    where
        T: Element,
        R: Rng + ?Sized,
        Standard: Distribution<T>,
    {
        let shape = shape.into();
        let data: Vec<T> = (0..shape.size()).map(|_| rng.sample(Standard)).collect();
        self.dense(shape, Storage::from_vec(data))
    }

    /// Tensor of samples from the standard normal distribution
    pub fn random_normal<T, R>(&self, shape: impl Into<Shape>, rng: &mut R) -> Tensor<T>
    where
        T: Element,
        R: Rng + ?Sized,
    {
        let shape = shape.into();
        let data: Vec<T> = (0..shape.size())
            .map(|_| {
                let v: f64 = rng.sample(StandardNormal);
                T::from_f64(v)
            })
            .collect();
        self.dense(shape, Storage::from_vec(data))
    }

    /// Dense tensor copying elements given in this engine's traversal order
    pub fn from_slice<T: Element>(&self, shape: impl Into<Shape>, data: &[T]) -> Result<Tensor<T>> {
        self.wrap(shape, data.to_vec())
    }

    /// Dense tensor taking ownership of elements in this engine's order
    pub fn wrap<T: Element>(&self, shape: impl Into<Shape>, data: Vec<T>) -> Result<Tensor<T>> {
        let shape = shape.into();
        if data.len() != shape.size() {
            return Err(Error::invalid_argument(
                "data",
                format!(
                    "data length {} does not match shape size {}",
                    data.len(),
                    shape.size()
                ),
            ));
        }
        Ok(self.dense(shape, Storage::from_vec(data)))
    }

    /// Strided tensor over an owned buffer with an explicit layout
    ///
    /// Every addressable pointer of the layout must fall inside the buffer.
    pub fn stride<T: Element>(
        &self,
        shape: impl Into<Shape>,
        offset: usize,
        strides: impl Into<Strides>,
        data: Vec<T>,
    ) -> Result<Tensor<T>> {
        let layout = Layout::of(shape, offset, strides)?;
        if layout.size() > 0 {
            let mut lo = layout.offset() as isize;
            let mut hi = layout.offset() as isize;
            for (&dim, &stride) in layout.shape().iter().zip(layout.strides().iter()) {
                let span = (dim as isize - 1) * stride;
                if span < 0 {
                    lo += span;
                } else {
                    hi += span;
                }
            }
            if lo < 0 || hi as usize >= data.len() {
                return Err(Error::invalid_argument(
                    "strides",
                    format!(
                        "layout addresses {}..={} outside buffer of length {}",
                        lo,
                        hi,
                        data.len()
                    ),
                ));
            }
        }
        Ok(Tensor::from_parts(Storage::from_vec(data), layout))
    }

    // ===== Assembly =====

    /// Concatenate tensors along an existing axis
    ///
    /// Inputs must share rank and every dimension except the concatenation
    /// axis; the result is dense in this engine's order.
    pub fn concat<T: Element>(&self, axis: isize, tensors: &[&Tensor<T>]) -> Result<Tensor<T>> {
        let first = tensors.first().ok_or_else(|| {
            Error::invalid_argument("tensors", "Tensors are not valid for concatenation")
        })?;
        let ax = first.layout().normalize_axis(axis)?;
        let mut cat_dim = 0usize;
        for t in tensors {
            if t.rank() != first.rank() {
                return Err(Error::invalid_argument(
                    "tensors",
                    "Tensors are not valid for concatenation",
                ));
            }
            for d in 0..first.rank() {
                if d != ax && t.shape()[d] != first.shape()[d] {
                    return Err(Error::invalid_argument(
                        "tensors",
                        "Tensors are not valid for concatenation",
                    ));
                }
            }
            cat_dim += t.shape()[ax];
        }
        let mut shape = first.shape().clone();
        shape[ax] = cat_dim;
        let out = self.zeros(shape);
        let mut at = 0usize;
        for t in tensors {
            let len = t.shape()[ax];
            out.narrow(ax as isize, true, at, at + len)?.copy_from(t)?;
            at += len;
        }
        Ok(out)
    }

    /// Stack tensors of identical shape along a new axis
    pub fn stack<T: Element>(&self, axis: isize, tensors: &[&Tensor<T>]) -> Result<Tensor<T>> {
        let first = tensors.first().ok_or_else(|| {
            Error::invalid_argument(
                "tensors",
                "Tensors are not valid for stack, they have to have the same dimensions.",
            )
        })?;
        for t in tensors {
            if t.shape() != first.shape() {
                return Err(Error::invalid_argument(
                    "tensors",
                    "Tensors are not valid for stack, they have to have the same dimensions.",
                ));
            }
        }
        let rank = first.rank() as isize;
        let idx = if axis < 0 { rank + axis + 1 } else { axis };
        if idx < 0 || idx > rank {
            return Err(Error::invalid_axis(axis, first.rank()));
        }
        let idx = idx as usize;
        let mut shape = first.shape().clone();
        shape.insert(idx, tensors.len());
        let out = self.zeros(shape);
        for (slot, t) in tensors.iter().enumerate() {
            out.narrow(idx as isize, false, slot, slot + 1)?.copy_from(t)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_zeros_full_eye() {
        let e = Engine::default();
        let z: Tensor<f64> = e.zeros([2, 2]);
        assert_eq!(z.sum(), 0.0);
        let f: Tensor<i32> = e.full([3], 7);
        assert_eq!(f.to_vec(Order::C), vec![7, 7, 7]);
        let i: Tensor<f64> = e.eye(3);
        assert_eq!(i.sum(), 3.0);
        assert_eq!(i.get(&[1, 1]).unwrap(), 1.0);
        assert_eq!(i.get(&[1, 2]).unwrap(), 0.0);
    }

    #[test]
    fn test_seq_follows_engine_order() {
        let c: Tensor<f64> = Engine::new(Order::C).seq([2, 3]);
        assert_eq!(c.to_vec(Order::C), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let f: Tensor<f64> = Engine::new(Order::F).seq([2, 3]);
        assert_eq!(f.to_vec(Order::F), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(f.to_vec(Order::C), vec![0.0, 2.0, 4.0, 1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_wrap_and_from_slice() {
        let e = Engine::default();
        let t = e.wrap([2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(t.get(&[1, 0]).unwrap(), 3.0);
        assert!(e.wrap([2, 2], vec![1.0]).is_err());
        let s = e.from_slice([3], &[1i32, 2, 3]).unwrap();
        assert_eq!(s.sum(), 6);
    }

    #[test]
    fn test_stride_bounds() {
        let e = Engine::default();
        // every second element of a 6-long buffer
        let t = e
            .stride([3], 0, [2isize], vec![0.0, 9.0, 1.0, 9.0, 2.0, 9.0])
            .unwrap();
        assert_eq!(t.to_vec(Order::C), vec![0.0, 1.0, 2.0]);
        assert!(e.stride([4], 0, [2isize], vec![0.0; 6]).is_err());
        assert!(e.stride([2, 2], 0, [2isize], vec![0.0; 6]).is_err());
    }

    #[test]
    fn test_random_seeded() {
        let e = Engine::default();
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        let x: Tensor<f64> = e.random([2, 3], &mut a);
        let y: Tensor<f64> = e.random([2, 3], &mut b);
        assert_eq!(x.to_vec(Order::C), y.to_vec(Order::C));
        let n: Tensor<f64> = e.random_normal([100], &mut a);
        assert!(n.mean().abs() < 1.0);
    }

    #[test]
    fn test_concat_rows() {
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
    fn test_concat_mismatch() {
        let e = Engine::default();
        let a: Tensor<f64> = e.zeros([2, 3]);
        let b: Tensor<f64> = e.zeros([2, 4]);
        let err = e.concat(0, &[&a, &b]).unwrap_err();
        assert!(err
            .to_string()
            .contains("Tensors are not valid for concatenation"));
    }

    #[test]
    fn test_stack_axes() {
        let e = Engine::default();
        let a: Tensor<f64> = e.seq([2, 3]);
        let b = a.add_scalar(6.0);
        let s0 = e.stack(0, &[&a, &b]).unwrap();
        assert_eq!(s0.shape().as_slice(), &[2, 2, 3]);
        let s1 = e.stack(1, &[&a, &b]).unwrap();
        assert_eq!(s1.shape().as_slice(), &[2, 2, 3]);
        let s2 = e.stack(2, &[&a, &b]).unwrap();
        assert_eq!(s2.shape().as_slice(), &[2, 3, 2]);
        assert_eq!(s0.get(&[1, 0, 0]).unwrap(), 6.0);
        assert_eq!(s1.get(&[0, 1, 0]).unwrap(), 6.0);
        assert_eq!(s2.get(&[0, 0, 1]).unwrap(), 6.0);
    }

    #[test]
    fn test_stack_mismatch() {
        let e = Engine::default();
        let a: Tensor<f64> = e.zeros([2, 3]);
        let b: Tensor<f64> = e.zeros([3, 2]);
        let err = e.stack(0, &[&a, &b]).unwrap_err();
        assert!(err
            .to_string()
            .contains("Tensors are not valid for stack, they have to have the same dimensions."));
    }
}
