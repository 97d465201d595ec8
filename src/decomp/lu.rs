//! LU factorization with partial pivoting

use super::{cast, check_matrix, rhs_as_matrix, solution, working_copy};
use crate::dtype::Element;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::tensor::{Order, Tensor};
use std::marker::PhantomData;

/// Elimination scheme used to build the factorization
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LuMethod {
    /// Crout's column-at-a-time update
    #[default]
    Crout,
    /// Classical Gaussian elimination with immediate trailing update
    Gaussian,
}

/// LU factorization of an m x n matrix with m >= n
///
/// Produces a unit lower trapezoid `L`, an upper triangle `U`, and a row
/// permutation `piv` such that `A[piv, :] = L * U`. The permuted system makes
/// `solve` numerically stable for non-singular inputs.
pub struct Lu<T: Element> {
    lu: Tensor<f64>,
    piv: Vec<usize>,
    piv_sign: i32,
    m: usize,
    n: usize,
    _marker: PhantomData<T>,
}

impl<T: Element> Lu<T> {
    pub(super) fn new(a: &Tensor<T>, method: LuMethod) -> Result<Self> {
        let (m, n) = check_matrix(a, "lu")?;
        if m < n {
            return Err(Error::invalid_argument(
                "matrix",
                format!("lu requires rows >= cols, got {}x{}", m, n),
            ));
        }
        let lu = working_copy(a);
        let mut piv: Vec<usize> = (0..m).collect();
        let mut piv_sign = 1i32;
        match method {
            LuMethod::Crout => Self::crout(&lu, m, n, &mut piv, &mut piv_sign),
            LuMethod::Gaussian => Self::gaussian(&lu, m, n, &mut piv, &mut piv_sign),
        }
        Ok(Self {
            lu,
            piv,
            piv_sign,
            m,
            n,
            _marker: PhantomData,
        })
    }

    fn crout(lu: &Tensor<f64>, m: usize, n: usize, piv: &mut [usize], piv_sign: &mut i32) {
        let mut col = vec![0.0f64; m];
        for j in 0..n {
            for (i, slot) in col.iter_mut().enumerate() {
                *slot = lu.get2(i, j);
            }
            // dot products with the already factored columns
            for (i, slot) in col.iter_mut().enumerate() {
                let kmax = i.min(j);
                let mut s = 0.0;
                for k in 0..kmax {
                    s += lu.get2(i, k) * lu.get2(k, j);
                }
                *slot -= s;
                lu.set2(i, j, *slot);
            }
            let mut p = j;
            for i in j + 1..m {
                if col[i].abs() > col[p].abs() {
                    p = i;
                }
            }
            if p != j {
                Self::swap_rows(lu, n, p, j);
                piv.swap(p, j);
                *piv_sign = -*piv_sign;
            }
            if j < m && lu.get2(j, j) != 0.0 {
                for i in j + 1..m {
                    let v = lu.get2(i, j) / lu.get2(j, j);
                    lu.set2(i, j, v);
                }
            }
        }
    }

    fn gaussian(lu: &Tensor<f64>, m: usize, n: usize, piv: &mut [usize], piv_sign: &mut i32) {
        for k in 0..n {
            let mut p = k;
            for i in k + 1..m {
                if lu.get2(i, k).abs() > lu.get2(p, k).abs() {
                    p = i;
                }
            }
            if p != k {
                Self::swap_rows(lu, n, p, k);
                piv.swap(p, k);
                *piv_sign = -*piv_sign;
            }
            if lu.get2(k, k) != 0.0 {
                for i in k + 1..m {
                    let factor = lu.get2(i, k) / lu.get2(k, k);
                    lu.set2(i, k, factor);
                    for j in k + 1..n {
                        let v = lu.get2(i, j) - factor * lu.get2(k, j);
                        lu.set2(i, j, v);
                    }
                }
            }
        }
    }

    fn swap_rows(lu: &Tensor<f64>, n: usize, a: usize, b: usize) {
        for j in 0..n {
            let t = lu.get2(a, j);
            lu.set2(a, j, lu.get2(b, j));
            lu.set2(b, j, t);
        }
    }

    /// Whether every pivot of `U` is nonzero
    pub fn is_non_singular(&self) -> bool {
        (0..self.n).all(|j| self.lu.get2(j, j) != 0.0)
    }

    /// Unit lower trapezoid factor, m x n
    pub fn l(&self) -> Tensor<T> {
        let out: Tensor<f64> = Engine::default().zeros([self.m, self.n]);
        for i in 0..self.m {
            for j in 0..self.n {
                if i > j {
                    out.set2(i, j, self.lu.get2(i, j));
                } else if i == j {
                    out.set2(i, j, 1.0);
                }
            }
        }
        cast(&out)
    }

    /// Upper triangular factor, n x n
    pub fn u(&self) -> Tensor<T> {
        let out: Tensor<f64> = Engine::default().zeros([self.n, self.n]);
        for i in 0..self.n {
            for j in i..self.n {
                out.set2(i, j, self.lu.get2(i, j));
            }
        }
        cast(&out)
    }

    /// The row permutation applied to the input
    pub fn piv(&self) -> &[usize] {
        &self.piv
    }

    /// Determinant of a square input
    pub fn det(&self) -> Result<f64> {
        if self.m != self.n {
            return Err(Error::invalid_argument(
                "matrix",
                format!("det requires a square matrix, got {}x{}", self.m, self.n),
            ));
        }
        let mut d = self.piv_sign as f64;
        for j in 0..self.n {
            d *= self.lu.get2(j, j);
        }
        Ok(d)
    }

    /// Solve `A * X = B` for a square non-singular system
    ///
    /// `b` may be a vector (one column) or a matrix of stacked right-hand
    /// sides.
    pub fn solve(&self, b: &Tensor<T>) -> Result<Tensor<T>> {
        let (bm, was_vector) = rhs_as_matrix(b)?;
        if bm.shape()[0] != self.m {
            return Err(Error::invalid_argument(
                "b",
                format!(
                    "right-hand side has {} rows, expected {}",
                    bm.shape()[0],
                    self.m
                ),
            ));
        }
        if !self.is_non_singular() {
            return Err(Error::SingularMatrix);
        }
        let nx = bm.shape()[1];
        let x = bm.take(0, &self.piv)?;
        // forward substitution against the unit lower factor
        for k in 0..self.n {
            for i in k + 1..self.n {
                for j in 0..nx {
                    let v = x.get2(i, j) - x.get2(k, j) * self.lu.get2(i, k);
                    x.set2(i, j, v);
                }
            }
        }
        // back substitution against the upper factor
        for k in (0..self.n).rev() {
            for j in 0..nx {
                let v = x.get2(k, j) / self.lu.get2(k, k);
                x.set2(k, j, v);
            }
            for i in 0..k {
                for j in 0..nx {
                    let v = x.get2(i, j) - x.get2(k, j) * self.lu.get2(i, k);
                    x.set2(i, j, v);
                }
            }
        }
        let x = x.narrow(0, true, 0, self.n)?.copy(Order::C);
        solution(x, was_vector)
    }

    /// Inverse of a square non-singular input
    pub fn inv(&self) -> Result<Tensor<T>> {
        let eye: Tensor<T> = Engine::default().eye(self.m);
        self.solve(&eye)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::Order;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn close(a: &Tensor<f64>, b: &Tensor<f64>, tol: f64) -> bool {
        a.shape() == b.shape()
            && a.iter(Order::C)
                .zip(b.iter(Order::C))
                .all(|(x, y)| (x - y).abs() <= tol)
    }

    #[test]
    fn test_reconstruction_both_methods() {
        let mut rng = StdRng::seed_from_u64(7);
        let a: Tensor<f64> = Engine::default().random_normal([5, 5], &mut rng);
        for method in [LuMethod::Crout, LuMethod::Gaussian] {
            let lu = a.lu_with(method).unwrap();
            let permuted = a.take(0, lu.piv()).unwrap();
            let rebuilt = lu.l().mm(&lu.u()).unwrap();
            assert!(close(&permuted, &rebuilt, 1e-12));
        }
    }

    #[test]
    fn test_rectangular_reconstruction() {
        let mut rng = StdRng::seed_from_u64(11);
        let a: Tensor<f64> = Engine::default().random_normal([6, 4], &mut rng);
        let lu = a.lu().unwrap();
        let permuted = a.take(0, lu.piv()).unwrap();
        let rebuilt = lu.l().mm(&lu.u()).unwrap();
        assert!(close(&permuted, &rebuilt, 1e-12));
    }

    #[test]
    fn test_det() {
        let a: Tensor<f64> = Engine::default()
            .from_slice([2, 2], &[1.0, 2.0, 3.0, 4.0])
            .unwrap();
        let det = a.lu().unwrap().det().unwrap();
        assert!((det - (-2.0)).abs() < 1e-14);
    }

    #[test]
    fn test_solve_and_inv() {
        let e = Engine::default();
        let a: Tensor<f64> = e.from_slice([2, 2], &[4.0, 3.0, 6.0, 3.0]).unwrap();
        let b: Tensor<f64> = e.from_slice([2], &[10.0, 12.0]).unwrap();
        let lu = a.lu().unwrap();
        let x = lu.solve(&b).unwrap();
        assert!(close(&a.mv(&x).unwrap(), &b, 1e-12));

        let inv = lu.inv().unwrap();
        let eye: Tensor<f64> = e.eye(2);
        assert!(close(&a.mm(&inv).unwrap(), &eye, 1e-12));
    }

    #[test]
    fn test_singular_solve_fails() {
        let e = Engine::default();
        let a: Tensor<f64> = e.from_slice([2, 2], &[1.0, 2.0, 2.0, 4.0]).unwrap();
        let lu = a.lu().unwrap();
        assert!(!lu.is_non_singular());
        let b: Tensor<f64> = e.from_slice([2], &[1.0, 1.0]).unwrap();
        assert!(matches!(lu.solve(&b), Err(Error::SingularMatrix)));
    }

    #[test]
    fn test_wide_matrix_rejected() {
        let a: Tensor<f64> = Engine::default().zeros([2, 3]);
        assert!(a.lu().is_err());
    }

    #[test]
    fn test_integer_dtype_rejected() {
        let a: Tensor<i32> = Engine::default().eye(3);
        assert!(a.lu().is_err());
    }
}
