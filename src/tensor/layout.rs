//! Layout: shape, strides, and offset for tensor memory layout

use super::shape::Shape;
use super::strides::Strides;
use crate::error::{Error, Result};
use smallvec::SmallVec;
use std::fmt;

/// Canonical memory traversal orders
///
/// C order: the last axis varies fastest in storage. F order: the first axis
/// varies fastest.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Order {
    /// Row-major: last axis varies fastest
    #[default]
    C,
    /// Column-major: first axis varies fastest
    F,
}

/// Fastest storage traversal order reported by a layout
///
/// `Strided` means neither canonical order matches the stride pattern.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FastOrder {
    /// Last axis has the smallest stride
    C,
    /// First axis has the smallest stride
    F,
    /// Neither canonical order
    Strided,
}

/// Rank specialization tag selected by the layout factory
///
/// Purely an addressing-arithmetic fast path; every kind satisfies the same
/// pointer contract and `General` is the reference implementation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LayoutKind {
    /// Rank 0: offset only
    Scalar,
    /// Rank 1: single stride
    Vector,
    /// Rank 2: row/column strides
    Matrix,
    /// Rank 3 and above
    General,
}

impl LayoutKind {
    fn of_rank(rank: usize) -> Self {
        match rank {
            0 => Self::Scalar,
            1 => Self::Vector,
            2 => Self::Matrix,
            _ => Self::General,
        }
    }
}

/// Layout describes the memory layout of a tensor
///
/// A tensor's elements live in a flat storage buffer, but not necessarily in
/// row-major order. The layout maps a logical multi-index to a storage offset:
///
///   pointer(\[i0, i1, ..., in\]) = offset + i0*strides\[0\] + ... + in*strides\[n\]
///
/// A stride of 0 marks a broadcast axis: every logical position along it
/// aliases the same storage cell.
#[derive(Clone, PartialEq, Eq)]
pub struct Layout {
    shape: Shape,
    strides: Strides,
    offset: usize,
    kind: LayoutKind,
}

impl Layout {
    /// Create a layout with explicit shape, offset, and strides
    ///
    /// Fails if the stride count does not match the rank.
    pub fn of(shape: impl Into<Shape>, offset: usize, strides: impl Into<Strides>) -> Result<Self> {
        let shape = shape.into();
        let strides = strides.into();
        if shape.rank() != strides.len() {
            return Err(Error::invalid_argument(
                "strides",
                format!(
                    "strides count {} does not match rank {}",
                    strides.len(),
                    shape.rank()
                ),
            ));
        }
        let kind = LayoutKind::of_rank(shape.rank());
        Ok(Self {
            shape,
            strides,
            offset,
            kind,
        })
    }

    /// Create a dense layout in the requested order
    pub fn dense(shape: impl Into<Shape>, offset: usize, order: Order) -> Self {
        let shape = shape.into();
        let strides = match order {
            Order::C => Self::c_strides(&shape),
            Order::F => Self::f_strides(&shape),
        };
        let kind = LayoutKind::of_rank(shape.rank());
        Self {
            shape,
            strides,
            offset,
            kind,
        }
    }

    /// Internal constructor for layouts with validated parts
    pub(crate) fn from_parts(shape: Shape, offset: usize, strides: Strides) -> Self {
        debug_assert_eq!(shape.rank(), strides.len());
        let kind = LayoutKind::of_rank(shape.rank());
        Self {
            shape,
            strides,
            offset,
            kind,
        }
    }

    /// Create a scalar (0-dimensional) layout
    pub fn scalar(offset: usize) -> Self {
        Self {
            shape: Shape::new(),
            strides: Strides::new(),
            offset,
            kind: LayoutKind::Scalar,
        }
    }

    /// Compute dense C-order strides for a shape (last axis fastest)
    pub(crate) fn c_strides(shape: &Shape) -> Strides {
        let mut strides = Strides::with_capacity(shape.rank());
        let mut stride = 1isize;
        for &dim in shape.iter().rev() {
            strides.push(stride);
            stride *= dim as isize;
        }
        strides.reverse();
        strides
    }

    /// Compute dense F-order strides for a shape (first axis fastest)
    pub(crate) fn f_strides(shape: &Shape) -> Strides {
        let mut strides = Strides::with_capacity(shape.rank());
        let mut stride = 1isize;
        for &dim in shape.iter() {
            strides.push(stride);
            stride *= dim as isize;
        }
        strides
    }

    // ===== Accessors =====

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Get the strides
    #[inline]
    pub fn strides(&self) -> &Strides {
        &self.strides
    }

    /// Get the offset
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The rank specialization tag
    #[inline]
    pub fn kind(&self) -> LayoutKind {
        self.kind
    }

    /// Number of dimensions (rank)
    #[inline]
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Total number of logical elements
    #[inline]
    pub fn size(&self) -> usize {
        self.shape.size()
    }

    /// Size along a dimension, with negative indexing
    pub fn dim(&self, axis: isize) -> Option<usize> {
        self.shape.dim(axis)
    }

    /// Check if the layout is a scalar (0 dimensions)
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// Normalize an axis index (handle negative indices)
    pub fn normalize_axis(&self, axis: isize) -> Result<usize> {
        let rank = self.rank() as isize;
        let idx = if axis < 0 { rank + axis } else { axis };
        if idx >= 0 && idx < rank {
            Ok(idx as usize)
        } else {
            Err(Error::invalid_axis(axis, self.rank()))
        }
    }

    // ===== Addressing =====

    /// Compute the storage offset of a logical multi-index
    ///
    /// Validates the index length against the rank and every entry against its
    /// dimension. Rank 0, 1, and 2 take specialized arithmetic paths.
    pub fn pointer(&self, index: &[usize]) -> Result<usize> {
        if index.len() != self.rank() {
            return Err(Error::invalid_argument(
                "index",
                format!(
                    "index length {} does not match rank {}",
                    index.len(),
                    self.rank()
                ),
            ));
        }
        for (&idx, &dim) in index.iter().zip(self.shape.iter()) {
            if idx >= dim {
                return Err(Error::IndexOutOfBounds {
                    index: idx,
                    size: dim,
                });
            }
        }
        let ptr = match self.kind {
            LayoutKind::Scalar => self.offset as isize,
            LayoutKind::Vector => self.offset as isize + index[0] as isize * self.strides[0],
            LayoutKind::Matrix => {
                self.offset as isize
                    + index[0] as isize * self.strides[0]
                    + index[1] as isize * self.strides[1]
            }
            LayoutKind::General => {
                let mut p = self.offset as isize;
                for (&idx, &stride) in index.iter().zip(self.strides.iter()) {
                    p += idx as isize * stride;
                }
                p
            }
        };
        debug_assert!(ptr >= 0);
        Ok(ptr as usize)
    }

    /// Unchecked matrix pointer, for hot inner loops on validated rank-2 layouts
    #[inline]
    pub(crate) fn pointer2(&self, row: usize, col: usize) -> usize {
        debug_assert_eq!(self.rank(), 2);
        debug_assert!(row < self.shape[0] && col < self.shape[1]);
        (self.offset as isize + row as isize * self.strides[0] + col as isize * self.strides[1])
            as usize
    }

    /// Unchecked vector pointer
    #[inline]
    pub(crate) fn pointer1(&self, i: usize) -> usize {
        debug_assert_eq!(self.rank(), 1);
        debug_assert!(i < self.shape[0]);
        (self.offset as isize + i as isize * self.strides[0]) as usize
    }

    /// Recover the logical multi-index of a storage offset
    ///
    /// Inverse of [`Layout::pointer`] for dense, non-overlapping layouts: the
    /// offset is decomposed greedily, larger strides first. Zero or negative
    /// strides make the decomposition ambiguous and are rejected.
    pub fn index(&self, pointer: usize) -> Result<Vec<usize>> {
        if !self.strides.all_positive() && self.rank() > 0 {
            return Err(Error::invalid_argument(
                "pointer",
                "index recovery requires a layout with positive strides",
            ));
        }
        if pointer < self.offset {
            return Err(Error::invalid_argument(
                "pointer",
                format!("pointer {} is below layout offset {}", pointer, self.offset),
            ));
        }
        let rank = self.rank();
        let mut axes: SmallVec<[usize; 4]> = (0..rank).collect();
        // larger stride first, ties broken by the larger dimension
        axes.sort_by(|&a, &b| {
            self.strides[b]
                .cmp(&self.strides[a])
                .then(self.shape[b].cmp(&self.shape[a]))
        });

        let mut rem = pointer - self.offset;
        let mut index = vec![0usize; rank];
        for &axis in &axes {
            let stride = self.strides[axis] as usize;
            let idx = rem / stride;
            if idx >= self.shape[axis] {
                return Err(Error::IndexOutOfBounds {
                    index: idx,
                    size: self.shape[axis],
                });
            }
            index[axis] = idx;
            rem %= stride;
        }
        if rem != 0 {
            return Err(Error::invalid_argument(
                "pointer",
                "pointer is not addressable by this layout",
            ));
        }
        Ok(index)
    }

    // ===== Order classification =====

    /// Whether strides describe a dense C-order block (unit axes ignored)
    pub fn is_c_dense(&self) -> bool {
        let mut expected = 1isize;
        for axis in (0..self.rank()).rev() {
            let dim = self.shape[axis];
            if dim == 1 {
                continue;
            }
            if self.strides[axis] != expected {
                return false;
            }
            expected *= dim as isize;
        }
        true
    }

    /// Whether strides describe a dense F-order block (unit axes ignored)
    pub fn is_f_dense(&self) -> bool {
        let mut expected = 1isize;
        for axis in 0..self.rank() {
            let dim = self.shape[axis];
            if dim == 1 {
                continue;
            }
            if self.strides[axis] != expected {
                return false;
            }
            expected *= dim as isize;
        }
        true
    }

    /// Whether the layout is dense in either canonical order
    pub fn is_dense(&self) -> bool {
        self.is_c_dense() || self.is_f_dense()
    }

    /// The order in which a linear storage walk visits this layout fastest
    pub fn storage_fast_order(&self) -> FastOrder {
        let mut strides: SmallVec<[isize; 4]> = SmallVec::new();
        for axis in 0..self.rank() {
            if self.shape[axis] != 1 {
                strides.push(self.strides[axis]);
            }
        }
        if strides.len() <= 1 {
            return FastOrder::C;
        }
        if strides.windows(2).all(|w| w[0] >= w[1]) {
            return FastOrder::C;
        }
        if strides.windows(2).all(|w| w[0] <= w[1]) {
            return FastOrder::F;
        }
        FastOrder::Strided
    }

    // ===== View operations =====

    /// Drop all unit-size axes
    pub fn squeeze(&self) -> Self {
        let mut shape = Shape::new();
        let mut strides = Strides::new();
        for (&dim, &stride) in self.shape.iter().zip(self.strides.iter()) {
            if dim != 1 {
                shape.push(dim);
                strides.push(stride);
            }
        }
        let kind = LayoutKind::of_rank(shape.rank());
        Self {
            shape,
            strides,
            offset: self.offset,
            kind,
        }
    }

    /// Drop one axis, which must have size 1
    pub fn squeeze_axis(&self, axis: isize) -> Result<Self> {
        let idx = self.normalize_axis(axis)?;
        if self.shape[idx] != 1 {
            return Err(Error::invalid_argument(
                "axis",
                format!(
                    "cannot squeeze axis {} with size {}",
                    idx, self.shape[idx]
                ),
            ));
        }
        let mut shape = self.shape.clone();
        let mut strides = self.strides.clone();
        shape.remove(idx);
        strides.remove(idx);
        let kind = LayoutKind::of_rank(shape.rank());
        Ok(Self {
            shape,
            strides,
            offset: self.offset,
            kind,
        })
    }

    /// Insert a unit axis before position `axis` (which may equal the rank)
    pub fn unsqueeze(&self, axis: isize) -> Result<Self> {
        let rank = self.rank() as isize;
        let idx = if axis < 0 { rank + axis + 1 } else { axis };
        if idx < 0 || idx > rank {
            return Err(Error::invalid_axis(axis, self.rank()));
        }
        let idx = idx as usize;
        let mut shape = self.shape.clone();
        let mut strides = self.strides.clone();
        let new_stride = if idx < self.rank() {
            strides[idx] * shape[idx] as isize
        } else {
            1
        };
        shape.insert(idx, 1);
        strides.insert(idx, new_stride);
        let kind = LayoutKind::of_rank(shape.rank());
        Ok(Self {
            shape,
            strides,
            offset: self.offset,
            kind,
        })
    }

    /// Broadcast a unit axis to `size` by setting its stride to 0
    ///
    /// Every position along the expanded axis aliases the same storage cell,
    /// so a write through the view is visible at all broadcast positions.
    pub fn expand(&self, axis: isize, size: usize) -> Result<Self> {
        let idx = self.normalize_axis(axis)?;
        if self.shape[idx] != 1 {
            return Err(Error::invalid_argument(
                "axis",
                format!(
                    "axis {} must have size 1 to be expanded, has {}",
                    idx, self.shape[idx]
                ),
            ));
        }
        let mut shape = self.shape.clone();
        let mut strides = self.strides.clone();
        shape[idx] = size;
        strides[idx] = 0;
        Ok(Self {
            shape,
            strides,
            offset: self.offset,
            kind: self.kind,
        })
    }

    /// Sub-range view along one axis
    ///
    /// The new dimension is `end - start`. With `keep_dim = false` the axis is
    /// squeezed, which is only legal when the resulting size is 1.
    pub fn narrow(&self, axis: isize, keep_dim: bool, start: usize, end: usize) -> Result<Self> {
        let idx = self.normalize_axis(axis)?;
        if start >= end || end > self.shape[idx] {
            return Err(Error::invalid_argument(
                "range",
                format!(
                    "invalid range {}..{} for axis {} with size {}",
                    start, end, idx, self.shape[idx]
                ),
            ));
        }
        if !keep_dim && end - start != 1 {
            return Err(Error::invalid_argument(
                "keep_dim",
                "narrowed axis can be dropped only when the result has size 1",
            ));
        }
        let mut shape = self.shape.clone();
        let mut strides = self.strides.clone();
        let offset = (self.offset as isize + start as isize * strides[idx]) as usize;
        shape[idx] = end - start;
        if !keep_dim {
            shape.remove(idx);
            strides.remove(idx);
        }
        let kind = LayoutKind::of_rank(shape.rank());
        Ok(Self {
            shape,
            strides,
            offset,
            kind,
        })
    }

    /// Narrow every axis at once
    pub fn narrow_all(&self, keep_dim: bool, starts: &[usize], ends: &[usize]) -> Result<Self> {
        if starts.len() != self.rank() || ends.len() != self.rank() {
            return Err(Error::invalid_argument(
                "starts",
                format!(
                    "expected {} start/end pairs, got {}/{}",
                    self.rank(),
                    starts.len(),
                    ends.len()
                ),
            ));
        }
        let mut layout = self.clone();
        // narrow from the last axis so dropped axes do not shift pending ones
        for axis in (0..self.rank()).rev() {
            layout = layout.narrow(axis as isize, keep_dim, starts[axis], ends[axis])?;
        }
        Ok(layout)
    }

    /// Reorder axes by a bijection over `[0, rank)`
    pub fn permute(&self, dims: &[usize]) -> Result<Self> {
        if dims.len() != self.rank() {
            return Err(Error::invalid_argument(
                "dims",
                format!(
                    "permutation length {} does not match rank {}",
                    dims.len(),
                    self.rank()
                ),
            ));
        }
        let mut seen = vec![false; self.rank()];
        for &d in dims {
            if d >= self.rank() || seen[d] {
                return Err(Error::invalid_argument(
                    "dims",
                    "permutation entries must be distinct and within rank",
                ));
            }
            seen[d] = true;
        }
        let mut shape = Shape::with_capacity(self.rank());
        let mut strides = Strides::with_capacity(self.rank());
        for &d in dims {
            shape.push(self.shape[d]);
            strides.push(self.strides[d]);
        }
        Ok(Self {
            shape,
            strides,
            offset: self.offset,
            kind: self.kind,
        })
    }

    /// Move one axis to a new position, preserving the order of the others
    pub fn move_axis(&self, src: isize, dst: isize) -> Result<Self> {
        let src = self.normalize_axis(src)?;
        let dst = self.normalize_axis(dst)?;
        let mut shape = self.shape.clone();
        let mut strides = self.strides.clone();
        let dim = shape.remove(src);
        let stride = strides.remove(src);
        shape.insert(dst, dim);
        strides.insert(dst, stride);
        Ok(Self {
            shape,
            strides,
            offset: self.offset,
            kind: self.kind,
        })
    }

    /// Swap two axes
    pub fn swap_axis(&self, a: isize, b: isize) -> Result<Self> {
        let a = self.normalize_axis(a)?;
        let b = self.normalize_axis(b)?;
        let mut shape = self.shape.clone();
        let mut strides = self.strides.clone();
        shape.swap(a, b);
        strides.swap(a, b);
        Ok(Self {
            shape,
            strides,
            offset: self.offset,
            kind: self.kind,
        })
    }

    /// Reverse the axis order (the full transpose permutation)
    pub fn revert(&self) -> Self {
        let shape: Shape = self.shape.iter().rev().copied().collect();
        let strides: Strides = self.strides.iter().rev().copied().collect();
        Self {
            shape,
            strides,
            offset: self.offset,
            kind: self.kind,
        }
    }

    /// Broadcast this layout to a larger target shape
    ///
    /// Missing leading axes and unit axes get stride 0.
    pub fn broadcast_to(&self, target: &[usize]) -> Result<Self> {
        if target.len() < self.rank() {
            return Err(Error::broadcast(target, &self.shape));
        }
        let mut shape = Shape::with_capacity(target.len());
        let mut strides = Strides::with_capacity(target.len());
        let pad = target.len() - self.rank();
        for &t in &target[..pad] {
            shape.push(t);
            strides.push(0);
        }
        for ((&s, &st), &t) in self
            .shape
            .iter()
            .zip(self.strides.iter())
            .zip(&target[pad..])
        {
            if s == t {
                shape.push(t);
                strides.push(st);
            } else if s == 1 {
                shape.push(t);
                strides.push(0);
            } else {
                return Err(Error::broadcast(target, &self.shape));
            }
        }
        let kind = LayoutKind::of_rank(shape.rank());
        Ok(Self {
            shape,
            strides,
            offset: self.offset,
            kind,
        })
    }

    /// Try to reinterpret this layout with a new shape, without copying
    ///
    /// Unit axes are stripped from the source, then source and target axes are
    /// merged in lock-step until the cumulative block sizes match. Each merged
    /// source block must be contiguous in the requested order, otherwise no
    /// view is possible and the caller has to copy. The caller guarantees the
    /// element counts match.
    pub fn attempt_reshape(&self, shape: &Shape, order: Order) -> Option<Self> {
        debug_assert_eq!(self.size(), shape.size());

        let mut old_dims: SmallVec<[usize; 4]> = SmallVec::new();
        let mut old_strides: SmallVec<[isize; 4]> = SmallVec::new();
        for (&dim, &stride) in self.shape.iter().zip(self.strides.iter()) {
            if dim != 1 {
                old_dims.push(dim);
                old_strides.push(stride);
            }
        }

        let old_rank = old_dims.len();
        let new_rank = shape.rank();
        let mut new_strides = vec![0isize; new_rank];

        let (mut oi, mut oj) = (0usize, 1usize);
        let (mut ni, mut nj) = (0usize, 1usize);
        while ni < new_rank && oi < old_rank {
            let mut np = shape[ni];
            let mut op = old_dims[oi];
            while np != op {
                if np < op {
                    np *= shape[nj];
                    nj += 1;
                } else {
                    op *= old_dims[oj];
                    oj += 1;
                }
            }
            // the merged source block must be contiguous in the requested order
            for k in oi..oj - 1 {
                match order {
                    Order::C => {
                        if old_strides[k] != old_dims[k + 1] as isize * old_strides[k + 1] {
                            return None;
                        }
                    }
                    Order::F => {
                        if old_strides[k + 1] != old_dims[k] as isize * old_strides[k] {
                            return None;
                        }
                    }
                }
            }
            match order {
                Order::C => {
                    new_strides[nj - 1] = old_strides[oj - 1];
                    for k in (ni..nj - 1).rev() {
                        new_strides[k] = new_strides[k + 1] * shape[k + 1] as isize;
                    }
                }
                Order::F => {
                    new_strides[ni] = old_strides[oi];
                    for k in ni + 1..nj {
                        new_strides[k] = new_strides[k - 1] * shape[k - 1] as isize;
                    }
                }
            }
            ni = nj;
            nj += 1;
            oi = oj;
            oj += 1;
        }

        // trailing unit axes get a synthesized stride
        let fill = if ni == 0 {
            1
        } else {
            match order {
                Order::C => new_strides[ni - 1],
                Order::F => new_strides[ni - 1] * shape[ni - 1] as isize,
            }
        };
        for stride in new_strides.iter_mut().skip(ni) {
            *stride = fill;
        }

        let kind = LayoutKind::of_rank(new_rank);
        Some(Self {
            shape: shape.clone(),
            strides: new_strides.into_iter().collect(),
            offset: self.offset,
            kind,
        })
    }
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Layout {{ shape: {:?}, strides: {:?}, offset: {} }}",
            self.shape.as_slice(),
            self.strides.as_slice(),
            self.offset
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_layouts() {
        let c = Layout::dense([2, 3, 4], 0, Order::C);
        assert_eq!(c.strides().as_slice(), &[12, 4, 1]);
        assert!(c.is_c_dense());
        assert_eq!(c.storage_fast_order(), FastOrder::C);

        let f = Layout::dense([2, 3, 4], 0, Order::F);
        assert_eq!(f.strides().as_slice(), &[1, 2, 6]);
        assert!(f.is_f_dense());
        assert_eq!(f.storage_fast_order(), FastOrder::F);
    }

    #[test]
    fn test_of_validates_stride_count() {
        assert!(Layout::of([2, 3], 0, [1isize]).is_err());
        assert!(Layout::of([2, 3], 0, [3isize, 1]).is_ok());
    }

    #[test]
    fn test_pointer() {
        let layout = Layout::dense([2, 3], 0, Order::C);
        assert_eq!(layout.pointer(&[0, 0]).unwrap(), 0);
        assert_eq!(layout.pointer(&[1, 2]).unwrap(), 5);
        assert!(layout.pointer(&[2, 0]).is_err());
        assert!(layout.pointer(&[0]).is_err());

        let scalar = Layout::scalar(7);
        assert_eq!(scalar.pointer(&[]).unwrap(), 7);
    }

    #[test]
    fn test_pointer_index_roundtrip() {
        for order in [Order::C, Order::F] {
            let layout = Layout::dense([3, 4, 5], 0, order);
            for i in 0..3 {
                for j in 0..4 {
                    for k in 0..5 {
                        let p = layout.pointer(&[i, j, k]).unwrap();
                        assert_eq!(layout.index(p).unwrap(), vec![i, j, k]);
                    }
                }
            }
        }
    }

    #[test]
    fn test_index_rejects_broadcast_layout() {
        let layout = Layout::dense([3, 1], 0, Order::C)
            .expand(1, 4)
            .unwrap();
        assert!(layout.index(0).is_err());
    }

    #[test]
    fn test_narrow() {
        let layout = Layout::dense([4, 5], 0, Order::C);
        let narrowed = layout.narrow(0, true, 1, 3).unwrap();
        assert_eq!(narrowed.shape().as_slice(), &[2, 5]);
        assert_eq!(narrowed.offset(), 5);
        assert_eq!(narrowed.pointer(&[0, 0]).unwrap(), 5);

        // dropping the axis requires a unit result
        assert!(layout.narrow(0, false, 1, 3).is_err());
        let dropped = layout.narrow(0, false, 2, 3).unwrap();
        assert_eq!(dropped.shape().as_slice(), &[5]);
        assert_eq!(dropped.offset(), 10);
    }

    #[test]
    fn test_narrow_all() {
        let layout = Layout::dense([4, 5], 0, Order::C);
        let v = layout.narrow_all(true, &[1, 2], &[3, 4]).unwrap();
        assert_eq!(v.shape().as_slice(), &[2, 2]);
        assert_eq!(v.offset(), 7);
    }

    #[test]
    fn test_permute_validation() {
        let layout = Layout::dense([2, 3, 4], 0, Order::C);
        let p = layout.permute(&[2, 0, 1]).unwrap();
        assert_eq!(p.shape().as_slice(), &[4, 2, 3]);
        assert_eq!(p.strides().as_slice(), &[1, 12, 4]);
        assert!(layout.permute(&[0, 0, 1]).is_err());
        assert!(layout.permute(&[0, 1, 3]).is_err());
        assert!(layout.permute(&[0, 1]).is_err());
    }

    #[test]
    fn test_move_swap_revert() {
        let layout = Layout::dense([2, 3, 4], 0, Order::C);
        let moved = layout.move_axis(0, 2).unwrap();
        assert_eq!(moved.shape().as_slice(), &[3, 4, 2]);
        let swapped = layout.swap_axis(0, 2).unwrap();
        assert_eq!(swapped.shape().as_slice(), &[4, 3, 2]);
        let reverted = layout.revert();
        assert_eq!(reverted.shape().as_slice(), &[4, 3, 2]);
        assert_eq!(reverted.strides().as_slice(), &[1, 4, 12]);
    }

    #[test]
    fn test_expand_sets_zero_stride() {
        let layout = Layout::dense([1, 3], 0, Order::C);
        let expanded = layout.expand(0, 4).unwrap();
        assert_eq!(expanded.shape().as_slice(), &[4, 3]);
        assert_eq!(expanded.strides()[0], 0);
        assert_eq!(expanded.pointer(&[3, 2]).unwrap(), 2);
        assert!(layout.expand(1, 4).is_err());
    }

    #[test]
    fn test_squeeze_axis() {
        let layout = Layout::dense([1, 3, 1], 0, Order::C);
        assert_eq!(layout.squeeze().shape().as_slice(), &[3]);
        assert_eq!(layout.squeeze_axis(0).unwrap().shape().as_slice(), &[3, 1]);
        assert!(layout.squeeze_axis(1).is_err());
    }

    #[test]
    fn test_attempt_reshape_dense_view() {
        let layout = Layout::dense([2, 3, 4], 0, Order::C);
        let reshaped = layout
            .attempt_reshape(&Shape::from([6, 4]), Order::C)
            .unwrap();
        assert_eq!(reshaped.shape().as_slice(), &[6, 4]);
        assert_eq!(reshaped.strides().as_slice(), &[4, 1]);

        let f = Layout::dense([2, 3, 4], 0, Order::F);
        let reshaped = f.attempt_reshape(&Shape::from([6, 4]), Order::F).unwrap();
        assert_eq!(reshaped.strides().as_slice(), &[1, 6]);
    }

    #[test]
    fn test_attempt_reshape_transposed_fails() {
        // a transposed matrix cannot merge its axes contiguously in C order
        let layout = Layout::dense([2, 3], 0, Order::C).swap_axis(0, 1).unwrap();
        assert!(layout
            .attempt_reshape(&Shape::from([6]), Order::C)
            .is_none());
    }

    #[test]
    fn test_attempt_reshape_trailing_units() {
        let layout = Layout::dense([6], 0, Order::C);
        let reshaped = layout
            .attempt_reshape(&Shape::from([6, 1, 1]), Order::C)
            .unwrap();
        assert_eq!(reshaped.shape().as_slice(), &[6, 1, 1]);
        let scalar = Layout::scalar(3);
        let reshaped = scalar
            .attempt_reshape(&Shape::from([1, 1]), Order::C)
            .unwrap();
        assert_eq!(reshaped.offset(), 3);
    }

    #[test]
    fn test_kind_selection() {
        assert_eq!(Layout::scalar(0).kind(), LayoutKind::Scalar);
        assert_eq!(Layout::dense([3], 0, Order::C).kind(), LayoutKind::Vector);
        assert_eq!(Layout::dense([3, 3], 0, Order::C).kind(), LayoutKind::Matrix);
        assert_eq!(
            Layout::dense([2, 2, 2], 0, Order::C).kind(),
            LayoutKind::General
        );
    }
}
