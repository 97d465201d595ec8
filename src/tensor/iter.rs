//! Pointer iteration over strided layouts

use super::layout::{Layout, Order};
use super::shape::Shape;
use super::strides::Strides;
use smallvec::SmallVec;

/// Iterator over the storage offsets of a layout in a canonical order
///
/// Visits exactly `size()` logical elements. Broadcast axes (stride 0) replay
/// the same offsets once per logical position, so aliased cells appear as many
/// times as the shape dictates.
pub struct PointerIter {
    shape: Shape,
    strides: Strides,
    order: Order,
    index: SmallVec<[usize; 4]>,
    ptr: isize,
    remaining: usize,
}

impl PointerIter {
    /// Iterate the offsets of `layout` in the given order
    pub fn new(layout: &Layout, order: Order) -> Self {
        let rank = layout.rank();
        Self {
            shape: layout.shape().clone(),
            strides: layout.strides().clone(),
            order,
            index: smallvec::smallvec![0; rank],
            ptr: layout.offset() as isize,
            remaining: layout.size(),
        }
    }

    fn advance(&mut self) {
        match self.order {
            Order::C => {
                for axis in (0..self.shape.rank()).rev() {
                    self.index[axis] += 1;
                    self.ptr += self.strides[axis];
                    if self.index[axis] < self.shape[axis] {
                        return;
                    }
                    self.ptr -= self.shape[axis] as isize * self.strides[axis];
                    self.index[axis] = 0;
                }
            }
            Order::F => {
                for axis in 0..self.shape.rank() {
                    self.index[axis] += 1;
                    self.ptr += self.strides[axis];
                    if self.index[axis] < self.shape[axis] {
                        return;
                    }
                    self.ptr -= self.shape[axis] as isize * self.strides[axis];
                    self.index[axis] = 0;
                }
            }
        }
    }
}

impl Iterator for PointerIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        debug_assert!(self.ptr >= 0);
        let out = self.ptr as usize;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.advance();
        }
        Some(out)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for PointerIter {}

/// Compacted inner-loop description of a layout traversal
///
/// A traversal decomposes into `offsets.len()` runs of `size` elements, each
/// run advancing by `step` storage slots per element. Copy and elementwise
/// kernels use this to keep stride arithmetic out of the innermost loop.
pub struct LoopDescriptor {
    /// Elements per run
    pub size: usize,
    /// Storage advance per element within a run
    pub step: isize,
    /// Start offset of each run
    pub offsets: Vec<usize>,
}

impl LoopDescriptor {
    /// Build the loop description of `layout` traversed in `order`
    pub fn of(layout: &Layout, order: Order) -> Self {
        let rank = layout.rank();
        if rank == 0 {
            return Self {
                size: 1,
                step: 1,
                offsets: vec![layout.offset()],
            };
        }
        let inner = match order {
            Order::C => rank - 1,
            Order::F => 0,
        };
        let size = layout.shape()[inner];
        let step = layout.strides()[inner];
        // outer axes traversed with the inner axis removed
        let mut shape = layout.shape().clone();
        let mut strides = layout.strides().clone();
        shape.remove(inner);
        strides.remove(inner);
        let outer = Layout::from_parts(shape, layout.offset(), strides);
        let offsets = if size > 0 {
            PointerIter::new(&outer, order).collect()
        } else {
            Vec::new()
        };
        Self {
            size,
            step,
            offsets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_order_dense() {
        let layout = Layout::dense([2, 3], 0, Order::C);
        let ptrs: Vec<usize> = PointerIter::new(&layout, Order::C).collect();
        assert_eq!(ptrs, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_f_order_on_c_dense() {
        let layout = Layout::dense([2, 3], 0, Order::C);
        let ptrs: Vec<usize> = PointerIter::new(&layout, Order::F).collect();
        assert_eq!(ptrs, vec![0, 3, 1, 4, 2, 5]);
    }

    #[test]
    fn test_scalar_yields_offset_once() {
        let layout = Layout::scalar(4);
        let ptrs: Vec<usize> = PointerIter::new(&layout, Order::C).collect();
        assert_eq!(ptrs, vec![4]);
    }

    #[test]
    fn test_broadcast_axis_replays() {
        let layout = Layout::dense([1, 3], 0, Order::C).expand(0, 2).unwrap();
        let ptrs: Vec<usize> = PointerIter::new(&layout, Order::C).collect();
        assert_eq!(ptrs, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_exact_size() {
        let layout = Layout::dense([4, 5], 0, Order::C);
        let iter = PointerIter::new(&layout, Order::C);
        assert_eq!(iter.len(), 20);
        assert_eq!(iter.count(), 20);
    }

    #[test]
    fn test_loop_descriptor_c() {
        let layout = Layout::dense([2, 3], 0, Order::C);
        let desc = LoopDescriptor::of(&layout, Order::C);
        assert_eq!(desc.size, 3);
        assert_eq!(desc.step, 1);
        assert_eq!(desc.offsets, vec![0, 3]);
    }

    #[test]
    fn test_loop_descriptor_f() {
        let layout = Layout::dense([2, 3], 0, Order::C);
        let desc = LoopDescriptor::of(&layout, Order::F);
        assert_eq!(desc.size, 2);
        assert_eq!(desc.step, 3);
        assert_eq!(desc.offsets, vec![0, 1, 2]);
    }
}
