//! Shape type: dimensions of a tensor

use smallvec::SmallVec;
use std::fmt;
use std::iter::FromIterator;
use std::ops::{Deref, DerefMut};

/// Stack allocation threshold for dimensions
/// Most tensors have 4 or fewer dimensions, so we stack-allocate up to 4
pub(crate) const STACK_DIMS: usize = 4;

/// Shape type: dimensions of a tensor
///
/// An empty shape denotes a scalar (rank 0, size 1).
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Shape(SmallVec<[usize; STACK_DIMS]>);

impl Shape {
    /// Create an empty (scalar) shape.
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    /// Create an empty shape with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self(SmallVec::with_capacity(capacity))
    }

    /// Push a dimension.
    pub fn push(&mut self, dim: usize) {
        self.0.push(dim);
    }

    /// Remove dimension at index.
    pub fn remove(&mut self, index: usize) -> usize {
        self.0.remove(index)
    }

    /// Insert a dimension at index.
    pub fn insert(&mut self, index: usize, value: usize) {
        self.0.insert(index, value);
    }

    /// Swap two dimensions.
    pub fn swap(&mut self, a: usize, b: usize) {
        self.0.swap(a, b);
    }

    /// View shape as a slice.
    pub fn as_slice(&self) -> &[usize] {
        self.0.as_slice()
    }

    /// Number of dimensions in this shape.
    #[inline]
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements: product of dimensions, 1 for a scalar.
    #[inline]
    pub fn size(&self) -> usize {
        self.0.iter().product()
    }

    /// Size along a dimension, with negative indexing from the end.
    pub fn dim(&self, axis: isize) -> Option<usize> {
        let rank = self.rank() as isize;
        let idx = if axis < 0 { rank + axis } else { axis };
        if idx >= 0 && idx < rank {
            Some(self.0[idx as usize])
        } else {
            None
        }
    }

    /// Count of unit-size dimensions.
    pub fn unit_dim_count(&self) -> usize {
        self.0.iter().filter(|&&d| d == 1).count()
    }

    /// Whether this shape has zero dimensions (scalar).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for Shape {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

impl DerefMut for Shape {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.as_mut_slice()
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<[usize]> for Shape {
    fn as_ref(&self) -> &[usize] {
        self.0.as_slice()
    }
}

impl From<SmallVec<[usize; STACK_DIMS]>> for Shape {
    fn from(value: SmallVec<[usize; STACK_DIMS]>) -> Self {
        Self(value)
    }
}

impl From<Vec<usize>> for Shape {
    fn from(value: Vec<usize>) -> Self {
        Self(value.into_iter().collect())
    }
}

impl From<&[usize]> for Shape {
    fn from(value: &[usize]) -> Self {
        Self(value.iter().copied().collect())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(value: [usize; N]) -> Self {
        Self(value.into_iter().collect())
    }
}

impl From<&Shape> for Shape {
    fn from(value: &Shape) -> Self {
        value.clone()
    }
}

impl FromIterator<usize> for Shape {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_and_size() {
        let s = Shape::from([2, 3, 4]);
        assert_eq!(s.rank(), 3);
        assert_eq!(s.size(), 24);

        let scalar = Shape::new();
        assert_eq!(scalar.rank(), 0);
        assert_eq!(scalar.size(), 1);
    }

    #[test]
    fn test_negative_dim() {
        let s = Shape::from([2, 3, 4]);
        assert_eq!(s.dim(0), Some(2));
        assert_eq!(s.dim(-1), Some(4));
        assert_eq!(s.dim(-3), Some(2));
        assert_eq!(s.dim(3), None);
        assert_eq!(s.dim(-4), None);
    }

    #[test]
    fn test_unit_dim_count() {
        assert_eq!(Shape::from([1, 3, 1, 4]).unit_dim_count(), 2);
        assert_eq!(Shape::from([2, 3]).unit_dim_count(), 0);
    }
}
