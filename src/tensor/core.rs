//! Core Tensor type

use super::iter::{LoopDescriptor, PointerIter};
use super::layout::{FastOrder, Layout, Order};
use super::shape::Shape;
use super::storage::Storage;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use std::fmt;

/// N-dimensional array over reference-counted storage
///
/// `Tensor` composes a [`Storage`] buffer with a [`Layout`] mapping logical
/// indices to storage offsets. View operations (narrow, permute, expand,
/// transpose, squeeze) produce tensors that share storage with their parent;
/// `copy`/`contiguous` materialize an independent buffer.
pub struct Tensor<T: Element> {
    storage: Storage<T>,
    layout: Layout,
}

impl<T: Element> Tensor<T> {
    pub(crate) fn from_parts(storage: Storage<T>, layout: Layout) -> Self {
        Self { storage, layout }
    }

    /// Create a rank-0 tensor holding one value
    pub fn scalar(value: T) -> Self {
        Self {
            storage: Storage::from_vec(vec![value]),
            layout: Layout::scalar(0),
        }
    }

    /// Zero-filled tensor in the default engine order
    pub fn zeros(shape: impl Into<Shape>) -> Self {
        crate::engine::Engine::default().zeros(shape)
    }

    /// Constant-filled tensor in the default engine order
    pub fn full(shape: impl Into<Shape>, value: T) -> Self {
        crate::engine::Engine::default().full(shape, value)
    }

    /// Identity matrix in the default engine order
    pub fn eye(n: usize) -> Self {
        crate::engine::Engine::default().eye(n)
    }

    fn view(&self, layout: Layout) -> Self {
        Self {
            storage: self.storage.clone(),
            layout,
        }
    }

    // ===== Accessors =====

    /// Get the storage
    #[inline]
    pub fn storage(&self) -> &Storage<T> {
        &self.storage
    }

    /// Get the layout
    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &Shape {
        self.layout.shape()
    }

    /// Get the strides
    #[inline]
    pub fn strides(&self) -> &super::Strides {
        self.layout.strides()
    }

    /// Get the storage offset of the first logical element
    #[inline]
    pub fn offset(&self) -> usize {
        self.layout.offset()
    }

    /// Number of dimensions (rank)
    #[inline]
    pub fn rank(&self) -> usize {
        self.layout.rank()
    }

    /// Total number of elements
    #[inline]
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    /// Size along a dimension (supports negative indexing)
    pub fn dim(&self, axis: isize) -> Option<usize> {
        self.layout.dim(axis)
    }

    /// The element type
    #[inline]
    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    /// Check if this is a scalar (0-dimensional tensor)
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.layout.is_scalar()
    }

    /// Check if this is a vector (rank 1)
    #[inline]
    pub fn is_vector(&self) -> bool {
        self.rank() == 1
    }

    /// Check if this is a matrix (rank 2)
    #[inline]
    pub fn is_matrix(&self) -> bool {
        self.rank() == 2
    }

    /// Whether this is a square matrix equal to its transpose
    pub fn is_symmetric(&self) -> bool {
        if self.rank() != 2 || self.shape()[0] != self.shape()[1] {
            return false;
        }
        let n = self.shape()[0];
        for i in 0..n {
            for j in i + 1..n {
                if self.get2(i, j) != self.get2(j, i) {
                    return false;
                }
            }
        }
        true
    }

    // ===== Scalar access =====

    /// Read the element at a logical multi-index
    pub fn get(&self, index: &[usize]) -> Result<T> {
        Ok(self.storage.get(self.layout.pointer(index)?))
    }

    /// Write the element at a logical multi-index
    pub fn set(&self, index: &[usize], value: T) -> Result<()> {
        self.storage.set(self.layout.pointer(index)?, value);
        Ok(())
    }

    /// Add to the element at a logical multi-index
    pub fn inc(&self, index: &[usize], value: T) -> Result<()> {
        self.storage.inc(self.layout.pointer(index)?, value);
        Ok(())
    }

    /// Read the element at a flat storage pointer
    #[inline]
    pub fn ptr_get(&self, ptr: usize) -> T {
        self.storage.get(ptr)
    }

    /// Write the element at a flat storage pointer
    #[inline]
    pub fn ptr_set(&self, ptr: usize, value: T) {
        self.storage.set(ptr, value)
    }

    // unchecked rank-2 accessors for validated inner loops
    #[inline]
    pub(crate) fn get2(&self, row: usize, col: usize) -> T {
        self.storage.get(self.layout.pointer2(row, col))
    }

    #[inline]
    pub(crate) fn set2(&self, row: usize, col: usize, value: T) {
        self.storage.set(self.layout.pointer2(row, col), value)
    }

    #[inline]
    pub(crate) fn get_f64(&self, row: usize, col: usize) -> f64 {
        self.get2(row, col).to_f64()
    }

    #[inline]
    pub(crate) fn set_f64(&self, row: usize, col: usize, value: f64) {
        self.set2(row, col, T::from_f64(value))
    }

    #[inline]
    pub(crate) fn inc_f64(&self, row: usize, col: usize, value: f64) {
        self.set_f64(row, col, self.get_f64(row, col) + value)
    }

    #[inline]
    pub(crate) fn get1(&self, i: usize) -> T {
        self.storage.get(self.layout.pointer1(i))
    }

    // ===== Iteration =====

    /// Iterate storage offsets in the requested order
    pub fn iter_ptr(&self, order: Order) -> PointerIter {
        PointerIter::new(&self.layout, order)
    }

    /// Iterate element values in the requested order
    pub fn iter(&self, order: Order) -> impl Iterator<Item = T> + '_ {
        self.iter_ptr(order).map(|p| self.storage.get(p))
    }

    /// Collect element values in the requested order
    pub fn to_vec(&self, order: Order) -> Vec<T> {
        self.iter(order).collect()
    }

    // ===== View operations (zero-copy) =====

    /// Drop all unit-size axes
    pub fn squeeze(&self) -> Self {
        self.view(self.layout.squeeze())
    }

    /// Drop one axis, which must have size 1
    pub fn squeeze_axis(&self, axis: isize) -> Result<Self> {
        Ok(self.view(self.layout.squeeze_axis(axis)?))
    }

    /// Insert a unit axis at `axis`
    pub fn unsqueeze(&self, axis: isize) -> Result<Self> {
        Ok(self.view(self.layout.unsqueeze(axis)?))
    }

    /// Broadcast a unit axis to `size`
    ///
    /// Writes through the expanded view alias across all broadcast positions.
    pub fn expand(&self, axis: isize, size: usize) -> Result<Self> {
        Ok(self.view(self.layout.expand(axis, size)?))
    }

    /// Sub-range view along one axis
    pub fn narrow(&self, axis: isize, keep_dim: bool, start: usize, end: usize) -> Result<Self> {
        Ok(self.view(self.layout.narrow(axis, keep_dim, start, end)?))
    }

    /// Narrow every axis at once
    pub fn narrow_all(&self, keep_dim: bool, starts: &[usize], ends: &[usize]) -> Result<Self> {
        Ok(self.view(self.layout.narrow_all(keep_dim, starts, ends)?))
    }

    /// Reorder axes by a bijection over `[0, rank)`
    pub fn permute(&self, dims: &[usize]) -> Result<Self> {
        Ok(self.view(self.layout.permute(dims)?))
    }

    /// Move one axis to a new position
    pub fn move_axis(&self, src: isize, dst: isize) -> Result<Self> {
        Ok(self.view(self.layout.move_axis(src, dst)?))
    }

    /// Swap two axes
    pub fn swap_axis(&self, a: isize, b: isize) -> Result<Self> {
        Ok(self.view(self.layout.swap_axis(a, b)?))
    }

    /// Reverse the axis order
    pub fn revert(&self) -> Self {
        self.view(self.layout.revert())
    }

    /// Matrix transpose: swap the last two axes
    ///
    /// Scalars and vectors transpose to themselves.
    pub fn t(&self) -> Self {
        if self.rank() < 2 {
            return self.view(self.layout.clone());
        }
        let mut shape = self.shape().clone();
        let mut strides = self.strides().clone();
        let r = shape.rank();
        shape.swap(r - 2, r - 1);
        strides.swap(r - 2, r - 1);
        self.view(Layout::from_parts(shape, self.offset(), strides))
    }

    /// Broadcast to a larger target shape
    pub fn broadcast_to(&self, target: &[usize]) -> Result<Self> {
        Ok(self.view(self.layout.broadcast_to(target)?))
    }

    /// Reshape, as a view when possible and as a copy otherwise
    pub fn reshape(&self, shape: impl Into<Shape>, order: Order) -> Result<Self> {
        let shape = shape.into();
        if shape.size() != self.size() {
            return Err(Error::shape_mismatch(&shape, self.shape()));
        }
        if let Some(layout) = self.layout.attempt_reshape(&shape, order) {
            return Ok(self.view(layout));
        }
        let copied = self.copy(order);
        let layout = Layout::dense(shape, 0, order);
        Ok(Self {
            storage: copied.storage,
            layout,
        })
    }

    /// Flatten to rank 1 in the requested order
    pub fn flatten(&self, order: Order) -> Result<Self> {
        self.reshape([self.size()], order)
    }

    // ===== Materialization =====

    /// Copy into a freshly allocated dense tensor in the requested order
    pub fn copy(&self, order: Order) -> Self {
        let storage = Storage::zeros(self.size());
        let desc = LoopDescriptor::of(&self.layout, order);
        let mut dst = 0usize;
        for &start in &desc.offsets {
            let mut ptr = start as isize;
            for _ in 0..desc.size {
                storage.set(dst, self.storage.get(ptr as usize));
                dst += 1;
                ptr += desc.step;
            }
        }
        Self {
            storage,
            layout: Layout::dense(self.shape().clone(), 0, order),
        }
    }

    /// Return a C-dense tensor, copying only when the layout requires it
    pub fn contiguous(&self) -> Self {
        if self.layout.is_c_dense() {
            self.view(self.layout.clone())
        } else {
            self.copy(Order::C)
        }
    }

    /// The order in which storage visits this tensor fastest
    pub fn storage_fast_order(&self) -> FastOrder {
        self.layout.storage_fast_order()
    }

    /// Overwrite this tensor's elements with those of `src` (same shape)
    pub fn copy_from(&self, src: &Tensor<T>) -> Result<()> {
        if self.shape() != src.shape() {
            return Err(Error::shape_mismatch(self.shape(), src.shape()));
        }
        for (dst, s) in self.iter_ptr(Order::C).zip(src.iter_ptr(Order::C)) {
            self.storage.set(dst, src.storage.get(s));
        }
        Ok(())
    }

    /// Copying selection of index slices along one axis
    pub fn take(&self, axis: isize, indices: &[usize]) -> Result<Self> {
        let ax = self.layout.normalize_axis(axis)?;
        let dim = self.shape()[ax];
        let mut shape = self.shape().clone();
        shape[ax] = indices.len();
        let out = Self {
            storage: Storage::zeros(shape.size()),
            layout: Layout::dense(shape, 0, Order::C),
        };
        for (slot, &idx) in indices.iter().enumerate() {
            if idx >= dim {
                return Err(Error::IndexOutOfBounds {
                    index: idx,
                    size: dim,
                });
            }
            out.narrow(ax as isize, true, slot, slot + 1)?
                .copy_from(&self.narrow(ax as isize, true, idx, idx + 1)?)?;
        }
        Ok(out)
    }

    // ===== Elementwise arithmetic =====

    fn zip_with(&self, rhs: &Tensor<T>, f: impl Fn(T, T) -> T) -> Result<Self> {
        let rhs_layout = rhs.layout.broadcast_to(self.shape())?;
        let storage = Storage::zeros(self.size());
        let rhs_iter = PointerIter::new(&rhs_layout, Order::C);
        for (dst, (p, q)) in self.iter_ptr(Order::C).zip(rhs_iter).enumerate() {
            storage.set(dst, f(self.storage.get(p), rhs.storage.get(q)));
        }
        Ok(Self {
            storage,
            layout: Layout::dense(self.shape().clone(), 0, Order::C),
        })
    }

    fn zip_with_(&self, rhs: &Tensor<T>, f: impl Fn(T, T) -> T) -> Result<()> {
        let rhs_layout = rhs.layout.broadcast_to(self.shape())?;
        let rhs_iter = PointerIter::new(&rhs_layout, Order::C);
        for (p, q) in self.iter_ptr(Order::C).zip(rhs_iter) {
            self.storage.set(p, f(self.storage.get(p), rhs.storage.get(q)));
        }
        Ok(())
    }

    /// Elementwise sum with unidirectional broadcast of `rhs`
    pub fn add(&self, rhs: &Tensor<T>) -> Result<Self> {
        self.zip_with(rhs, |a, b| a + b)
    }

    /// Elementwise difference
    pub fn sub(&self, rhs: &Tensor<T>) -> Result<Self> {
        self.zip_with(rhs, |a, b| a - b)
    }

    /// Elementwise product
    pub fn mul(&self, rhs: &Tensor<T>) -> Result<Self> {
        self.zip_with(rhs, |a, b| a * b)
    }

    /// Elementwise quotient
    pub fn div(&self, rhs: &Tensor<T>) -> Result<Self> {
        self.zip_with(rhs, |a, b| a / b)
    }

    /// In-place elementwise sum
    pub fn add_(&self, rhs: &Tensor<T>) -> Result<()> {
        self.zip_with_(rhs, |a, b| a + b)
    }

    /// In-place elementwise difference
    pub fn sub_(&self, rhs: &Tensor<T>) -> Result<()> {
        self.zip_with_(rhs, |a, b| a - b)
    }

    /// In-place elementwise product
    pub fn mul_(&self, rhs: &Tensor<T>) -> Result<()> {
        self.zip_with_(rhs, |a, b| a * b)
    }

    /// In-place elementwise quotient
    pub fn div_(&self, rhs: &Tensor<T>) -> Result<()> {
        self.zip_with_(rhs, |a, b| a / b)
    }

    /// Elementwise closure application into a new tensor
    pub fn apply(&self, f: impl Fn(T) -> T) -> Self {
        let storage = Storage::zeros(self.size());
        for (dst, p) in self.iter_ptr(Order::C).enumerate() {
            storage.set(dst, f(self.storage.get(p)));
        }
        Self {
            storage,
            layout: Layout::dense(self.shape().clone(), 0, Order::C),
        }
    }

    /// In-place elementwise closure application
    pub fn apply_(&self, f: impl Fn(T) -> T) {
        for p in self.iter_ptr(Order::C) {
            self.storage.set(p, f(self.storage.get(p)));
        }
    }

    /// Add a scalar to every element
    pub fn add_scalar(&self, value: T) -> Self {
        self.apply(|a| a + value)
    }

    /// Subtract a scalar from every element
    pub fn sub_scalar(&self, value: T) -> Self {
        self.apply(|a| a - value)
    }

    /// Multiply every element by a scalar
    pub fn mul_scalar(&self, value: T) -> Self {
        self.apply(|a| a * value)
    }

    /// Divide every element by a scalar
    pub fn div_scalar(&self, value: T) -> Self {
        self.apply(|a| a / value)
    }

    // ===== Reductions =====

    /// Sum of all elements
    pub fn sum(&self) -> T {
        let mut acc = T::zero();
        for v in self.iter(Order::C) {
            acc = acc + v;
        }
        acc
    }

    /// Mean of all elements, accumulated in f64
    pub fn mean(&self) -> T {
        let mut acc = 0.0f64;
        for v in self.iter(Order::C) {
            acc += v.to_f64();
        }
        T::from_f64(acc / self.size() as f64)
    }

    /// Smallest element; fails on empty tensors
    pub fn min(&self) -> Result<T> {
        self.fold_extreme(|a, b| b < a)
    }

    /// Largest element; fails on empty tensors
    pub fn max(&self) -> Result<T> {
        self.fold_extreme(|a, b| b > a)
    }

    fn fold_extreme(&self, better: impl Fn(T, T) -> bool) -> Result<T> {
        let mut iter = self.iter(Order::C);
        let mut best = iter.next().ok_or_else(|| {
            Error::invalid_argument("tensor", "reduction over an empty tensor")
        })?;
        for v in iter {
            if better(best, v) {
                best = v;
            }
        }
        Ok(best)
    }

    /// Position of the smallest element in the requested traversal order
    pub fn argmin(&self, order: Order) -> Result<usize> {
        let mut best: Option<(usize, T)> = None;
        for (pos, v) in self.iter(order).enumerate() {
            match best {
                Some((_, b)) if !(v < b) => {}
                _ => best = Some((pos, v)),
            }
        }
        best.map(|(pos, _)| pos).ok_or_else(|| {
            Error::invalid_argument("tensor", "argmin over an empty tensor")
        })
    }

    // ===== Matrix operators =====

    /// Dot product of two equal-length vectors, accumulated in f64
    pub fn dot(&self, rhs: &Tensor<T>) -> Result<T> {
        if !self.is_vector() || !rhs.is_vector() || self.shape()[0] != rhs.shape()[0] {
            return Err(Error::shape_mismatch(self.shape(), rhs.shape()));
        }
        let mut acc = 0.0f64;
        for i in 0..self.shape()[0] {
            acc += self.get1(i).to_f64() * rhs.get1(i).to_f64();
        }
        Ok(T::from_f64(acc))
    }

    /// Matrix-matrix product
    ///
    /// Output rows are computed independently; with the `rayon` feature they
    /// are partitioned across the worker pool, each writing a disjoint region.
    pub fn mm(&self, rhs: &Tensor<T>) -> Result<Self> {
        if !self.is_matrix() || !rhs.is_matrix() {
            return Err(Error::invalid_argument(
                "tensors",
                "matrix product requires two rank-2 tensors",
            ));
        }
        let (m, k) = (self.shape()[0], self.shape()[1]);
        let (k2, n) = (rhs.shape()[0], rhs.shape()[1]);
        if k != k2 {
            return Err(Error::shape_mismatch(self.shape(), rhs.shape()));
        }
        let out = Self {
            storage: Storage::zeros(m * n),
            layout: Layout::dense([m, n], 0, Order::C),
        };
        let row = |i: usize| {
            let mut acc = vec![0.0f64; n];
            for l in 0..k {
                let a_il = self.get_f64(i, l);
                if a_il == 0.0 {
                    continue;
                }
                for (j, slot) in acc.iter_mut().enumerate() {
                    *slot += a_il * rhs.get_f64(l, j);
                }
            }
            for (j, &slot) in acc.iter().enumerate() {
                out.set_f64(i, j, slot);
            }
        };
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            (0..m).into_par_iter().for_each(row);
        }
        #[cfg(not(feature = "rayon"))]
        for i in 0..m {
            row(i);
        }
        Ok(out)
    }

    /// Matrix-vector product
    pub fn mv(&self, rhs: &Tensor<T>) -> Result<Self> {
        if !self.is_matrix() || !rhs.is_vector() || self.shape()[1] != rhs.shape()[0] {
            return Err(Error::invalid_argument(
                "tensors",
                "matrix-vector product requires a rank-2 by rank-1 pair with matching inner dimension",
            ));
        }
        let (m, k) = (self.shape()[0], self.shape()[1]);
        let out = Self {
            storage: Storage::zeros(m),
            layout: Layout::dense([m], 0, Order::C),
        };
        for i in 0..m {
            let mut acc = 0.0f64;
            for l in 0..k {
                acc += self.get_f64(i, l) * rhs.get1(l).to_f64();
            }
            out.storage.set(i, T::from_f64(acc));
        }
        Ok(out)
    }
}

impl<T: Element> Clone for Tensor<T> {
    /// Clone creates a new view sharing the same storage (zero-copy)
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            layout: self.layout.clone(),
        }
    }
}

impl<T: Element> fmt::Debug for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape())
            .field("strides", &self.strides())
            .field("offset", &self.offset())
            .field("dtype", &self.dtype())
            .finish()
    }
}

impl<T: Element> fmt::Display for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor({:?}, dtype={})", self.shape().as_slice(), self.dtype())
    }
}
