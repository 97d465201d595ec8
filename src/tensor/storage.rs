//! Storage: flat element buffer with Arc-based sharing

use crate::dtype::{DType, Element};
use std::cell::UnsafeCell;
use std::ops::Range;
use std::sync::Arc;

/// Number of lanes in a vectorized element group
pub const LANES: usize = 8;

/// Flat buffer of tensor elements
///
/// Storage has no shape or stride knowledge; a [`super::Layout`] maps logical
/// indices onto it. Cloning shares the underlying buffer, which is how
/// zero-copy views (narrow, permute, expand, transpose) work. Memory is
/// released when the last reference drops.
///
/// Writes go through `&self`: several live views may alias one buffer, and
/// overlapping concurrent writes are the caller's responsibility. There is no
/// copy-on-write and no locking; partitioned parallel kernels must write
/// disjoint regions.
pub struct Storage<T> {
    inner: Arc<StorageInner<T>>,
}

struct StorageInner<T> {
    cell: UnsafeCell<Box<[T]>>,
}

// Aliased mutation is allowed by the storage contract; the caller keeps
// concurrent writers on disjoint regions.
unsafe impl<T: Send> Send for StorageInner<T> {}
unsafe impl<T: Sync> Sync for StorageInner<T> {}

impl<T: Element> Storage<T> {
    /// Create storage taking ownership of existing data
    pub fn from_vec(data: Vec<T>) -> Self {
        Self {
            inner: Arc::new(StorageInner {
                cell: UnsafeCell::new(data.into_boxed_slice()),
            }),
        }
    }

    /// Create zero-initialized storage of `len` elements
    pub fn zeros(len: usize) -> Self {
        Self::from_vec(vec![T::zero(); len])
    }

    /// Create storage filled with a value
    pub fn full(len: usize, value: T) -> Self {
        Self::from_vec(vec![value; len])
    }

    #[inline]
    fn buf(&self) -> *mut T {
        unsafe { (*self.inner.cell.get()).as_mut_ptr() }
    }

    /// Number of elements
    #[inline]
    pub fn len(&self) -> usize {
        unsafe { (&(*self.inner.cell.get())).len() }
    }

    /// Check if storage is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element type
    #[inline]
    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    /// Get the reference count
    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Check if this is the only reference
    #[inline]
    pub fn is_unique(&self) -> bool {
        Arc::strong_count(&self.inner) == 1
    }

    // ===== Scalar access =====

    /// Read the element at a flat pointer
    #[inline]
    pub fn get(&self, ptr: usize) -> T {
        debug_assert!(ptr < self.len());
        unsafe { *self.buf().add(ptr) }
    }

    /// Write the element at a flat pointer
    #[inline]
    pub fn set(&self, ptr: usize, value: T) {
        debug_assert!(ptr < self.len());
        unsafe { *self.buf().add(ptr) = value }
    }

    /// Add to the element at a flat pointer
    #[inline]
    pub fn inc(&self, ptr: usize, value: T) {
        debug_assert!(ptr < self.len());
        unsafe { *self.buf().add(ptr) += value }
    }

    /// Fill a pointer range with a value
    pub fn fill(&self, range: Range<usize>, value: T) {
        debug_assert!(range.end <= self.len());
        for ptr in range {
            unsafe { *self.buf().add(ptr) = value }
        }
    }

    // ===== Vectorized group access =====

    /// Load a contiguous group of `LANES` elements starting at `ptr`
    #[inline]
    pub fn load(&self, ptr: usize) -> [T; LANES] {
        debug_assert!(ptr + LANES <= self.len());
        let mut lanes = [T::zero(); LANES];
        for (i, lane) in lanes.iter_mut().enumerate() {
            *lane = unsafe { *self.buf().add(ptr + i) };
        }
        lanes
    }

    /// Store a contiguous group of `LANES` elements starting at `ptr`
    #[inline]
    pub fn store(&self, ptr: usize, lanes: [T; LANES]) {
        debug_assert!(ptr + LANES <= self.len());
        for (i, lane) in lanes.into_iter().enumerate() {
            unsafe { *self.buf().add(ptr + i) = lane }
        }
    }

    /// Load a group of elements through an index array
    #[inline]
    pub fn gather(&self, ptrs: &[usize; LANES]) -> [T; LANES] {
        let mut lanes = [T::zero(); LANES];
        for (lane, &ptr) in lanes.iter_mut().zip(ptrs.iter()) {
            debug_assert!(ptr < self.len());
            *lane = unsafe { *self.buf().add(ptr) };
        }
        lanes
    }

    /// Store a group of elements through an index array
    #[inline]
    pub fn scatter(&self, ptrs: &[usize; LANES], lanes: [T; LANES]) {
        for (lane, &ptr) in lanes.into_iter().zip(ptrs.iter()) {
            debug_assert!(ptr < self.len());
            unsafe { *self.buf().add(ptr) = lane }
        }
    }

    /// Masked load for a partial group at a buffer boundary
    ///
    /// Inactive lanes read as zero.
    #[inline]
    pub fn load_masked(&self, ptr: usize, mask: [bool; LANES]) -> [T; LANES] {
        let mut lanes = [T::zero(); LANES];
        for (i, (lane, active)) in lanes.iter_mut().zip(mask.iter()).enumerate() {
            if *active {
                debug_assert!(ptr + i < self.len());
                *lane = unsafe { *self.buf().add(ptr + i) };
            }
        }
        lanes
    }

    /// Masked store for a partial group at a buffer boundary
    #[inline]
    pub fn store_masked(&self, ptr: usize, lanes: [T; LANES], mask: [bool; LANES]) {
        for (i, (lane, active)) in lanes.into_iter().zip(mask.iter()).enumerate() {
            if *active {
                debug_assert!(ptr + i < self.len());
                unsafe { *self.buf().add(ptr + i) = lane }
            }
        }
    }

    // ===== Materialization =====

    /// Copy into an independent buffer
    pub fn copy(&self) -> Self {
        Self::from_vec(self.to_vec())
    }

    /// Copy the whole buffer into a Vec
    pub fn to_vec(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len());
        for ptr in 0..self.len() {
            out.push(self.get(ptr));
        }
        out
    }
}

impl<T> Clone for Storage<T> {
    /// Clone increments the reference count (zero-copy)
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Element> std::fmt::Debug for Storage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("len", &self.len())
            .field("dtype", &self.dtype())
            .field("refs", &Arc::strong_count(&self.inner))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_access() {
        let storage = Storage::from_vec(vec![1.0f64, 2.0, 3.0]);
        assert_eq!(storage.get(1), 2.0);
        storage.set(1, 5.0);
        storage.inc(1, 0.5);
        assert_eq!(storage.get(1), 5.5);
    }

    #[test]
    fn test_clone_shares_buffer() {
        let storage = Storage::from_vec(vec![0i32; 4]);
        let alias = storage.clone();
        assert_eq!(storage.ref_count(), 2);
        assert!(!storage.is_unique());
        alias.set(2, 7);
        assert_eq!(storage.get(2), 7);
    }

    #[test]
    fn test_copy_is_independent() {
        let storage = Storage::from_vec(vec![1.0f32, 2.0]);
        let copy = storage.copy();
        copy.set(0, 9.0);
        assert_eq!(storage.get(0), 1.0);
        assert!(copy.is_unique());
    }

    #[test]
    fn test_fill() {
        let storage = Storage::<f64>::zeros(6);
        storage.fill(2..5, 1.5);
        assert_eq!(storage.to_vec(), vec![0.0, 0.0, 1.5, 1.5, 1.5, 0.0]);
    }

    #[test]
    fn test_group_load_store() {
        let storage = Storage::from_vec((0..16i32).collect::<Vec<_>>());
        let lanes = storage.load(4);
        assert_eq!(lanes, [4, 5, 6, 7, 8, 9, 10, 11]);
        storage.store(0, lanes);
        assert_eq!(storage.get(0), 4);
        assert_eq!(storage.get(7), 11);
    }

    #[test]
    fn test_gather_scatter() {
        let storage = Storage::from_vec((0..12i32).collect::<Vec<_>>());
        let ptrs = [0, 2, 4, 6, 8, 10, 1, 3];
        let lanes = storage.gather(&ptrs);
        assert_eq!(lanes, [0, 2, 4, 6, 8, 10, 1, 3]);
        storage.scatter(&ptrs, [9; LANES]);
        assert_eq!(storage.get(10), 9);
        assert_eq!(storage.get(11), 11);
    }

    #[test]
    fn test_masked_group() {
        let storage = Storage::from_vec(vec![1.0f64; 4]);
        let mut mask = [false; LANES];
        mask[..4].fill(true);
        let lanes = storage.load_masked(0, mask);
        assert_eq!(&lanes[..4], &[1.0; 4]);
        assert_eq!(&lanes[4..], &[0.0; 4]);
        storage.store_masked(0, [2.0; LANES], mask);
        assert_eq!(storage.to_vec(), vec![2.0; 4]);
    }
}
