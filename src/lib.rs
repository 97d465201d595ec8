//! # narray
//!
//! **Dense n-dimensional arrays with stride-based views and eager matrix decompositions.**
//!
//! narray separates the three concerns of a tensor: a flat reference-counted
//! [`Storage`](tensor::Storage) buffer, a [`Layout`](tensor::Layout) mapping
//! logical indices to storage offsets through strides, and the
//! [`Tensor`](tensor::Tensor) combining the two. Most shape manipulation
//! (narrow, permute, expand, transpose, squeeze) is a layout rewrite over
//! shared storage, so views are free.
//!
//! ## Features
//!
//! - **Tensors**: strided n-dimensional arrays with zero-copy views,
//!   broadcasting, and C/F traversal orders
//! - **Construction**: an [`Engine`](engine::Engine) factory fixing the
//!   default storage order, plus concat and stack assembly
//! - **Elementwise ops and reductions**: add/sub/mul/div with broadcast,
//!   sum, mean, min, max, argmin
//! - **Linear algebra**: mm, mv, dot, and eager LU, QR, Cholesky, Eigen, and
//!   SVD decompositions
//! - **Dtypes**: f64, f32, i32, u8; decompositions run in f64 internally
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use narray::prelude::*;
//!
//! let e = Engine::default();
//! let a: Tensor<f64> = e.from_slice([2, 2], &[4.0, 3.0, 6.0, 3.0])?;
//! let b: Tensor<f64> = e.from_slice([2], &[10.0, 12.0])?;
//!
//! let x = a.lu()?.solve(&b)?;
//! let det = a.lu()?.det()?;
//! ```
//!
//! ## Feature Flags
//!
//! - `rayon` (default): multi-threaded matrix product

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod decomp;
pub mod dtype;
pub mod engine;
pub mod error;
pub mod tensor;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::decomp::{Cholesky, CholeskySide, Eigen, Lu, LuMethod, Qr, Svd};
    pub use crate::dtype::{DType, Element};
    pub use crate::engine::Engine;
    pub use crate::error::{Error, Result};
    pub use crate::tensor::{Layout, Order, Shape, Strides, Tensor};
}
