//! Cholesky factorization of symmetric positive definite matrices

use super::{cast, check_square, rhs_as_matrix, solution};
use crate::dtype::Element;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::tensor::{Order, Tensor};
use std::marker::PhantomData;

/// Which triangle of the input is read and which factor is produced
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CholeskySide {
    /// Read the lower triangle, produce `L` with `A = L * L^T`
    #[default]
    Left,
    /// Read the upper triangle, produce `R` with `A = R^T * R`
    Right,
}

/// Outcome of a Cholesky factorization
///
/// Positive definiteness is only discovered during elimination, so the failure
/// case is part of the result rather than an error: `NotSpd` reports the first
/// pivot whose reduced diagonal was not positive. Only `Spd` results can
/// solve.
pub enum Cholesky<T: Element> {
    /// The input was symmetric positive definite
    Spd(CholeskyFactor<T>),
    /// Factorization failed at `pivot` with reduced diagonal `value`
    NotSpd { pivot: usize, value: f64 },
}

/// Triangular factor of a successful Cholesky factorization
pub struct CholeskyFactor<T: Element> {
    // lower factor, regardless of side
    l: Tensor<f64>,
    side: CholeskySide,
    n: usize,
    _marker: PhantomData<T>,
}

impl<T: Element> Cholesky<T> {
    pub(super) fn new(a: &Tensor<T>, side: CholeskySide) -> Result<Self> {
        let n = check_square(a, "cholesky")?;
        // the opposite triangle is never read; Right works on the transpose
        let at = |r: usize, c: usize| match side {
            CholeskySide::Left => a.get_f64(r, c),
            CholeskySide::Right => a.get_f64(c, r),
        };
        let l: Tensor<f64> = Engine::default().zeros([n, n]);
        for j in 0..n {
            let mut d = 0.0f64;
            for k in 0..j {
                let mut s = 0.0;
                for i in 0..k {
                    s += l.get2(k, i) * l.get2(j, i);
                }
                let s = (at(j, k) - s) / l.get2(k, k);
                l.set2(j, k, s);
                d += s * s;
            }
            let d = at(j, j) - d;
            if d <= 0.0 {
                return Ok(Self::NotSpd { pivot: j, value: d });
            }
            l.set2(j, j, d.sqrt());
        }
        Ok(Self::Spd(CholeskyFactor {
            l,
            side,
            n,
            _marker: PhantomData,
        }))
    }

    /// Whether the input was symmetric positive definite
    pub fn is_spd(&self) -> bool {
        matches!(self, Self::Spd(_))
    }

    /// The factor, when the input was positive definite
    pub fn factor(&self) -> Option<&CholeskyFactor<T>> {
        match self {
            Self::Spd(f) => Some(f),
            Self::NotSpd { .. } => None,
        }
    }

    fn spd(&self) -> Result<&CholeskyFactor<T>> {
        self.factor().ok_or_else(|| {
            Error::invalid_argument("matrix", "Matrix is not symmetric positive definite.")
        })
    }

    /// Solve `A * X = B` through the triangular factor
    pub fn solve(&self, b: &Tensor<T>) -> Result<Tensor<T>> {
        self.spd()?.solve(b)
    }

    /// Inverse of the input
    pub fn inv(&self) -> Result<Tensor<T>> {
        self.spd()?.inv()
    }
}

impl<T: Element> CholeskyFactor<T> {
    /// Which triangle this factorization worked on
    pub fn side(&self) -> CholeskySide {
        self.side
    }

    /// The triangular factor: `L` for Left, `R = L^T` for Right
    pub fn factor(&self) -> Tensor<T> {
        match self.side {
            CholeskySide::Left => cast(&self.l),
            CholeskySide::Right => cast(&self.l.t().copy(Order::C)),
        }
    }

    /// Solve `A * X = B` by forward then backward substitution
    pub fn solve(&self, b: &Tensor<T>) -> Result<Tensor<T>> {
        let (x, was_vector) = rhs_as_matrix(b)?;
        if x.shape()[0] != self.n {
            return Err(Error::invalid_argument(
                "b",
                format!(
                    "right-hand side has {} rows, expected {}",
                    x.shape()[0],
                    self.n
                ),
            ));
        }
        let nx = x.shape()[1];
        // L * Y = B
        for k in 0..self.n {
            for j in 0..nx {
                let mut v = x.get2(k, j);
                for i in 0..k {
                    v -= x.get2(i, j) * self.l.get2(k, i);
                }
                x.set2(k, j, v / self.l.get2(k, k));
            }
        }
        // L^T * X = Y
        for k in (0..self.n).rev() {
            for j in 0..nx {
                let mut v = x.get2(k, j);
                for i in k + 1..self.n {
                    v -= x.get2(i, j) * self.l.get2(i, k);
                }
                x.set2(k, j, v / self.l.get2(k, k));
            }
        }
        solution(x, was_vector)
    }

    /// Inverse of the input
    pub fn inv(&self) -> Result<Tensor<T>> {
        let eye: Tensor<T> = Engine::default().eye(self.n);
        self.solve(&eye)
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

    fn spd_matrix(n: usize, seed: u64) -> Tensor<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let g: Tensor<f64> = Engine::default().random_normal([n, n], &mut rng);
        // G * G^T + n*I is symmetric positive definite
        let ggt = g.mm(&g.t()).unwrap();
        let eye: Tensor<f64> = Engine::default().eye(n);
        ggt.add(&eye.mul_scalar(n as f64)).unwrap()
    }

    #[test]
    fn test_left_reconstruction() {
        let a = spd_matrix(5, 1);
        let ch = a.cholesky(CholeskySide::Left).unwrap();
        assert!(ch.is_spd());
        let l = ch.factor().unwrap().factor();
        let rebuilt = l.mm(&l.t()).unwrap();
        assert!(close(&a, &rebuilt, 1e-10));
    }

    #[test]
    fn test_right_matches_left_transposed() {
        let a = spd_matrix(4, 2);
        let l = a
            .cholesky(CholeskySide::Left)
            .unwrap()
            .factor()
            .unwrap()
            .factor();
        let r = a
            .cholesky(CholeskySide::Right)
            .unwrap()
            .factor()
            .unwrap()
            .factor();
        assert!(close(&r, &l.t().copy(Order::C), 1e-12));
        let rebuilt = r.t().mm(&r).unwrap();
        assert!(close(&a, &rebuilt, 1e-10));
    }

    #[test]
    fn test_solve() {
        let a = spd_matrix(4, 3);
        let mut rng = StdRng::seed_from_u64(4);
        let b: Tensor<f64> = Engine::default().random_normal([4], &mut rng);
        let x = a.cholesky(CholeskySide::Left).unwrap().solve(&b).unwrap();
        assert!(close(&a.mv(&x).unwrap(), &b, 1e-10));
    }

    #[test]
    fn test_not_spd_outcome() {
        let e = Engine::default();
        let a: Tensor<f64> = e.from_slice([2, 2], &[1.0, 2.0, 2.0, 1.0]).unwrap();
        let ch = a.cholesky(CholeskySide::Left).unwrap();
        assert!(!ch.is_spd());
        match ch {
            Cholesky::NotSpd { pivot, value } => {
                assert_eq!(pivot, 1);
                assert!(value <= 0.0);
            }
            Cholesky::Spd(_) => panic!("indefinite matrix reported as positive definite"),
        }
        let b: Tensor<f64> = e.from_slice([2], &[1.0, 1.0]).unwrap();
        assert!(a
            .cholesky(CholeskySide::Left)
            .unwrap()
            .solve(&b)
            .is_err());
    }

    #[test]
    fn test_non_square_rejected() {
        let a: Tensor<f64> = Engine::default().zeros([2, 3]);
        assert!(a.cholesky(CholeskySide::Left).is_err());
    }
}
