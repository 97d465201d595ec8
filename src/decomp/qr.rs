//! QR factorization by Householder reflections

use super::{cast, check_matrix, rhs_as_matrix, solution, working_copy};
use crate::dtype::Element;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::tensor::{Order, Tensor};
use std::marker::PhantomData;

/// QR factorization of an m x n matrix with m >= n
///
/// The factor state is the compact Householder form: reflection vectors in the
/// lower trapezoid of `qr` and the diagonal of `R` in `rdiag`. `q()` and `r()`
/// expand the explicit factors with `A = Q * R`, `Q` having orthonormal
/// columns.
pub struct Qr<T: Element> {
    qr: Tensor<f64>,
    rdiag: Vec<f64>,
    m: usize,
    n: usize,
    _marker: PhantomData<T>,
}

impl<T: Element> Qr<T> {
    pub(super) fn new(a: &Tensor<T>) -> Result<Self> {
        let (m, n) = check_matrix(a, "qr")?;
        if m < n {
            return Err(Error::invalid_argument(
                "matrix",
                format!("qr requires rows >= cols, got {}x{}", m, n),
            ));
        }
        let qr = working_copy(a);
        let mut rdiag = vec![0.0f64; n];
        for k in 0..n {
            let mut nrm = 0.0f64;
            for i in k..m {
                nrm = nrm.hypot(qr.get2(i, k));
            }
            if nrm != 0.0 {
                // pick the sign that avoids cancellation
                if qr.get2(k, k) < 0.0 {
                    nrm = -nrm;
                }
                for i in k..m {
                    let v = qr.get2(i, k) / nrm;
                    qr.set2(i, k, v);
                }
                qr.set2(k, k, qr.get2(k, k) + 1.0);
                // apply the reflection to the remaining columns
                for j in k + 1..n {
                    let mut s = 0.0;
                    for i in k..m {
                        s += qr.get2(i, k) * qr.get2(i, j);
                    }
                    s = -s / qr.get2(k, k);
                    for i in k..m {
                        let v = qr.get2(i, j) + s * qr.get2(i, k);
                        qr.set2(i, j, v);
                    }
                }
            }
            rdiag[k] = -nrm;
        }
        Ok(Self {
            qr,
            rdiag,
            m,
            n,
            _marker: PhantomData,
        })
    }

    /// Whether `R` has a nonzero diagonal
    pub fn is_full_rank(&self) -> bool {
        self.rdiag.iter().all(|&d| d != 0.0)
    }

    /// The Householder reflection vectors, m x n lower trapezoid
    pub fn h(&self) -> Tensor<T> {
        let out: Tensor<f64> = Engine::default().zeros([self.m, self.n]);
        for i in 0..self.m {
            for j in 0..self.n.min(i + 1) {
                out.set2(i, j, self.qr.get2(i, j));
            }
        }
        cast(&out)
    }

    /// Upper triangular factor, n x n
    pub fn r(&self) -> Tensor<T> {
        let out: Tensor<f64> = Engine::default().zeros([self.n, self.n]);
        for i in 0..self.n {
            out.set2(i, i, self.rdiag[i]);
            for j in i + 1..self.n {
                out.set2(i, j, self.qr.get2(i, j));
            }
        }
        cast(&out)
    }

    /// Orthonormal factor, m x n, accumulated backwards from the reflections
    pub fn q(&self) -> Tensor<T> {
        let out: Tensor<f64> = Engine::default().zeros([self.m, self.n]);
        for k in (0..self.n).rev() {
            out.set2(k, k, 1.0);
            for j in k..self.n {
                if self.qr.get2(k, k) != 0.0 {
                    let mut s = 0.0;
                    for i in k..self.m {
                        s += self.qr.get2(i, k) * out.get2(i, j);
                    }
                    s = -s / self.qr.get2(k, k);
                    for i in k..self.m {
                        let v = out.get2(i, j) + s * self.qr.get2(i, k);
                        out.set2(i, j, v);
                    }
                }
            }
        }
        cast(&out)
    }

    /// Least-squares solution of `A * X = B`
    ///
    /// For square full-rank systems this is the exact solution.
    pub fn solve(&self, b: &Tensor<T>) -> Result<Tensor<T>> {
        let (y, was_vector) = rhs_as_matrix(b)?;
        if y.shape()[0] != self.m {
            return Err(Error::invalid_argument(
                "b",
                format!(
                    "right-hand side has {} rows, expected {}",
                    y.shape()[0],
                    self.m
                ),
            ));
        }
        if !self.is_full_rank() {
            return Err(Error::SingularMatrix);
        }
        let nx = y.shape()[1];
        // compute Q^T * B in place
        for k in 0..self.n {
            for j in 0..nx {
                let mut s = 0.0;
                for i in k..self.m {
                    s += self.qr.get2(i, k) * y.get2(i, j);
                }
                s = -s / self.qr.get2(k, k);
                for i in k..self.m {
                    let v = y.get2(i, j) + s * self.qr.get2(i, k);
                    y.set2(i, j, v);
                }
            }
        }
        // back substitution against R
        for k in (0..self.n).rev() {
            for j in 0..nx {
                let v = y.get2(k, j) / self.rdiag[k];
                y.set2(k, j, v);
            }
            for i in 0..k {
                for j in 0..nx {
                    let v = y.get2(i, j) - y.get2(k, j) * self.qr.get2(i, k);
                    y.set2(i, j, v);
                }
            }
        }
        let x = y.narrow(0, true, 0, self.n)?.copy(Order::C);
        solution(x, was_vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn close(a: &Tensor<f64>, b: &Tensor<f64>, tol: f64) -> bool {
        a.shape() == b.shape()
            && a.iter(Order::C)
                .zip(b.iter(Order::C))
                .all(|(x, y)| (x - y).abs() <= tol)
    }

    #[test]
    fn test_orthonormal_q() {
        let mut rng = StdRng::seed_from_u64(3);
        let a: Tensor<f64> = Engine::default().random_normal([6, 4], &mut rng);
        let qr = a.qr().unwrap();
        let q = qr.q();
        let qtq = q.t().copy(Order::C).mm(&q).unwrap();
        let eye: Tensor<f64> = Engine::default().eye(4);
        assert!(close(&qtq, &eye, 1e-14));
    }

    #[test]
    fn test_reconstruction_and_triangular_r() {
        let mut rng = StdRng::seed_from_u64(5);
        let a: Tensor<f64> = Engine::default().random_normal([5, 5], &mut rng);
        let qr = a.qr().unwrap();
        let r = qr.r();
        for i in 0..5 {
            for j in 0..i {
                assert_eq!(r.get2(i, j), 0.0);
            }
        }
        let rebuilt = qr.q().mm(&r).unwrap();
        assert!(close(&a, &rebuilt, 1e-12));
    }

    #[test]
    fn test_least_squares_solve() {
        let e = Engine::default();
        let a: Tensor<f64> = e.from_slice([3, 2], &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0]).unwrap();
        let b: Tensor<f64> = e.from_slice([3], &[1.0, 1.0, 2.0]).unwrap();
        // consistent system, exact solution [1, 1]
        let x = a.qr().unwrap().solve(&b).unwrap();
        let expected: Tensor<f64> = e.from_slice([2], &[1.0, 1.0]).unwrap();
        assert!(close(&x, &expected, 1e-12));
    }

    #[test]
    fn test_rank_deficient_solve_fails() {
        let e = Engine::default();
        let a: Tensor<f64> = e.from_slice([3, 2], &[1.0, 2.0, 2.0, 4.0, 3.0, 6.0]).unwrap();
        let qr = a.qr().unwrap();
        assert!(!qr.is_full_rank());
        let b: Tensor<f64> = e.from_slice([3], &[1.0, 1.0, 1.0]).unwrap();
        assert!(matches!(qr.solve(&b), Err(Error::SingularMatrix)));
    }

    #[test]
    fn test_wide_matrix_rejected() {
        let a: Tensor<f64> = Engine::default().zeros([2, 4]);
        assert!(a.qr().is_err());
    }
}
