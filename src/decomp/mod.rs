//! Matrix decompositions
//!
//! Factorizations are eager: all the work happens at construction and the
//! returned objects are immutable. Derived quantities (factors, determinants,
//! solves) read the precomputed state. Inputs must be floating point matrices;
//! internal arithmetic runs in f64 regardless of the element type, and results
//! are converted back.

mod cholesky;
mod eigen;
mod lu;
mod qr;
mod svd;

pub use cholesky::{Cholesky, CholeskyFactor, CholeskySide};
pub use eigen::Eigen;
pub use lu::{Lu, LuMethod};
pub use qr::Qr;
pub use svd::Svd;

use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::tensor::{Layout, Order, Storage, Tensor};

/// Reject integer element types up front
fn check_float<T: Element>(op: &'static str) -> Result<()> {
    if T::DTYPE.is_float() {
        Ok(())
    } else {
        Err(Error::unsupported_dtype(T::DTYPE, op))
    }
}

/// Require a rank-2 input and return its dimensions
fn check_matrix<T: Element>(t: &Tensor<T>, op: &'static str) -> Result<(usize, usize)> {
    check_float::<T>(op)?;
    if t.rank() != 2 {
        return Err(Error::invalid_argument(
            "matrix",
            format!("{} requires a rank-2 tensor, got rank {}", op, t.rank()),
        ));
    }
    Ok((t.shape()[0], t.shape()[1]))
}

/// Require a square rank-2 input and return its order
fn check_square<T: Element>(t: &Tensor<T>, op: &'static str) -> Result<usize> {
    let (m, n) = check_matrix(t, op)?;
    if m != n {
        return Err(Error::invalid_argument(
            "matrix",
            format!("{} requires a square matrix, got {}x{}", op, m, n),
        ));
    }
    Ok(m)
}

/// Dense C-order copy with element conversion
fn cast<S: Element, D: Element>(t: &Tensor<S>) -> Tensor<D> {
    let data: Vec<D> = t.iter(Order::C).map(|v| D::from_f64(v.to_f64())).collect();
    Tensor::from_parts(
        Storage::from_vec(data),
        Layout::dense(t.shape().clone(), 0, Order::C),
    )
}

/// Working copy of the input, promoted to f64
fn working_copy<T: Element>(t: &Tensor<T>) -> Tensor<f64> {
    cast(t)
}

/// Present a right-hand side as a matrix, remembering if it was a vector
///
/// Solves accept both shapes; a vector is treated as a single column and the
/// solution is squeezed back to a vector.
fn rhs_as_matrix<T: Element>(b: &Tensor<T>) -> Result<(Tensor<f64>, bool)> {
    match b.rank() {
        1 => Ok((working_copy(&b.unsqueeze(1)?), true)),
        2 => Ok((working_copy(b), false)),
        r => Err(Error::invalid_argument(
            "b",
            format!("right-hand side must be rank 1 or 2, got rank {}", r),
        )),
    }
}

/// Convert a solved f64 matrix back to the caller's element type
fn solution<T: Element>(x: Tensor<f64>, was_vector: bool) -> Result<Tensor<T>> {
    if was_vector {
        Ok(cast(&x.squeeze_axis(1)?))
    } else {
        Ok(cast(&x))
    }
}

impl<T: Element> Tensor<T> {
    /// LU factorization with partial pivoting, Crout's method
    pub fn lu(&self) -> Result<Lu<T>> {
        Lu::new(self, LuMethod::Crout)
    }

    /// LU factorization with an explicit elimination method
    pub fn lu_with(&self, method: LuMethod) -> Result<Lu<T>> {
        Lu::new(self, method)
    }

    /// QR factorization by Householder reflections
    pub fn qr(&self) -> Result<Qr<T>> {
        Qr::new(self)
    }

    /// Cholesky factorization of a symmetric positive definite matrix
    pub fn cholesky(&self, side: CholeskySide) -> Result<Cholesky<T>> {
        Cholesky::new(self, side)
    }

    /// Eigenvalue decomposition
    pub fn eig(&self) -> Result<Eigen<T>> {
        Eigen::new(self)
    }

    /// Singular value decomposition
    pub fn svd(&self) -> Result<Svd<T>> {
        Svd::new(self)
    }
}
