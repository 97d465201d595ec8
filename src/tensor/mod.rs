//! Tensor types: storage, layout, iteration, and the core tensor

mod core;
mod iter;
mod layout;
mod shape;
mod storage;
mod strides;

pub use self::core::Tensor;
pub use iter::{LoopDescriptor, PointerIter};
pub use layout::{FastOrder, Layout, LayoutKind, Order};
pub use shape::Shape;
pub use storage::{Storage, LANES};
pub use strides::Strides;
