//! Singular value decomposition

use super::{cast, check_matrix};
use crate::dtype::Element;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::tensor::{Layout, Order, Storage, Tensor};
use std::marker::PhantomData;

/// Compact singular value decomposition of an m x n matrix with m >= n
///
/// `A = U * S * V^T` with `U` an m x n matrix of orthonormal columns, `S`
/// diagonal with the singular values in descending order, and `V` an n x n
/// orthogonal matrix. The decomposition always exists; the effective numerical
/// rank and the condition number fall out of the singular values.
#[derive(Debug)]
pub struct Svd<T: Element> {
    // m x n, row major
    u: Vec<f64>,
    s: Vec<f64>,
    // n x n, row major
    v: Vec<f64>,
    m: usize,
    n: usize,
    tol: f64,
    _marker: PhantomData<T>,
}

impl<T: Element> Svd<T> {
    pub(super) fn new(arg: &Tensor<T>) -> Result<Self> {
        let (m, n) = check_matrix(arg, "svd")?;
        if m < n {
            return Err(Error::invalid_argument(
                "matrix",
                "This SVD implementation only works for m >= n",
            ));
        }
        if n == 0 {
            return Err(Error::invalid_argument(
                "matrix",
                "svd requires a non-empty matrix",
            ));
        }

        // LINPACK-derived bidiagonalization plus implicit QR sweep
        let tiny = 2.0f64.powi(-966);
        let eps = f64::EPSILON;

        let mut a = vec![0.0f64; m * n];
        for i in 0..m {
            for j in 0..n {
                a[i * n + j] = arg.get_f64(i, j);
            }
        }
        let mut s = vec![0.0f64; n];
        let mut u = vec![0.0f64; m * n];
        let mut v = vec![0.0f64; n * n];
        let mut e = vec![0.0f64; n];
        let mut work = vec![0.0f64; m];

        // reduce to bidiagonal form, diagonal in s, super-diagonal in e
        let nct = (m - 1).min(n);
        let nrt = n.saturating_sub(2);
        for k in 0..nct.max(nrt) {
            if k < nct {
                // 2-norm of the k-th column without under/overflow
                s[k] = 0.0;
                for i in k..m {
                    s[k] = s[k].hypot(a[i * n + k]);
                }
                if s[k] != 0.0 {
                    if a[k * n + k] < 0.0 {
                        s[k] = -s[k];
                    }
                    for i in k..m {
                        a[i * n + k] /= s[k];
                    }
                    a[k * n + k] += 1.0;
                }
                s[k] = -s[k];
            }
            for j in k + 1..n {
                if k < nct && s[k] != 0.0 {
                    // apply the column transformation
                    let mut t = 0.0f64;
                    for i in k..m {
                        t += a[i * n + k] * a[i * n + j];
                    }
                    t = -t / a[k * n + k];
                    for i in k..m {
                        a[i * n + j] += t * a[i * n + k];
                    }
                }
                e[j] = a[k * n + j];
            }
            if k < nct {
                // stash the transformation for the back multiplication of U
                for i in k..m {
                    u[i * n + k] = a[i * n + k];
                }
            }
            if k < nrt {
                // k-th row transformation, super-diagonal into e[k]
                e[k] = 0.0;
                for i in k + 1..n {
                    e[k] = e[k].hypot(e[i]);
                }
                if e[k] != 0.0 {
                    if e[k + 1] < 0.0 {
                        e[k] = -e[k];
                    }
                    let ek = e[k];
                    for item in e.iter_mut().take(n).skip(k + 1) {
                        *item /= ek;
                    }
                    e[k + 1] += 1.0;
                }
                e[k] = -e[k];
                if k + 1 < m && e[k] != 0.0 {
                    for item in work.iter_mut().take(m).skip(k + 1) {
                        *item = 0.0;
                    }
                    for j in k + 1..n {
                        for i in k + 1..m {
                            work[i] += e[j] * a[i * n + j];
                        }
                    }
                    for j in k + 1..n {
                        let t = -e[j] / e[k + 1];
                        for i in k + 1..m {
                            a[i * n + j] += t * work[i];
                        }
                    }
                }
                for i in k + 1..n {
                    v[i * n + k] = e[i];
                }
            }
        }

        // set up the final bidiagonal matrix of order p
        let mut p = n;
        if nct < n {
            s[nct] = a[nct * n + nct];
        }
        if m < p {
            s[p - 1] = 0.0;
        }
        if nrt + 1 < p {
            e[nrt] = a[nrt * n + p - 1];
        }
        e[p - 1] = 0.0;

        // generate U
        for j in nct..n {
            for i in 0..m {
                u[i * n + j] = 0.0;
            }
            u[j * n + j] = 1.0;
        }
        for k in (0..nct).rev() {
            if s[k] != 0.0 {
                for j in k + 1..n {
                    let mut t = 0.0f64;
                    for i in k..m {
                        t += u[i * n + k] * u[i * n + j];
                    }
                    t = -t / u[k * n + k];
                    for i in k..m {
                        u[i * n + j] += t * u[i * n + k];
                    }
                }
                for i in k..m {
                    u[i * n + k] = -u[i * n + k];
                }
                u[k * n + k] += 1.0;
                for i in 0..k.saturating_sub(1) {
                    u[i * n + k] = 0.0;
                }
            } else {
                for i in 0..m {
                    u[i * n + k] = 0.0;
                }
                u[k * n + k] = 1.0;
            }
        }

        // generate V
        for k in (0..n).rev() {
            if k < nrt && e[k] != 0.0 {
                for j in k + 1..n {
                    let mut t = 0.0f64;
                    for i in k + 1..n {
                        t += v[i * n + k] * v[i * n + j];
                    }
                    t = -t / v[(k + 1) * n + k];
                    for i in k + 1..n {
                        v[i * n + j] += t * v[i * n + k];
                    }
                }
            }
            for i in 0..n {
                v[i * n + k] = 0.0;
            }
            v[k * n + k] = 1.0;
        }

        // main iteration loop over the remaining singular values
        let pp = p - 1;
        while p > 0 {
            // inspect for negligible elements:
            // kase 1: s(p) and e[k-1] negligible, deflate
            // kase 2: s(k) negligible, split
            // kase 3: e[k-1] negligible, one qr step
            // kase 4: e(p-1) negligible, converged
            let mut k = p as isize - 2;
            while k >= 0 {
                let ku = k as usize;
                let threshold = tiny + eps * (s[ku].abs() + s[ku + 1].abs());
                // negated comparison so a NaN breaks out instead of looping
                if !(e[ku].abs() > threshold) {
                    e[ku] = 0.0;
                    break;
                }
                k -= 1;
            }
            let kase;
            if k == p as isize - 2 {
                kase = 4;
            } else {
                let mut ks = p as isize - 1;
                while ks >= k {
                    if ks == k {
                        break;
                    }
                    let ksu = ks as usize;
                    let t = if ks != p as isize { e[ksu].abs() } else { 0.0 }
                        + if ks != k + 1 { e[ksu - 1].abs() } else { 0.0 };
                    if s[ksu].abs() <= tiny + eps * t {
                        s[ksu] = 0.0;
                        break;
                    }
                    ks -= 1;
                }
                if ks == k {
                    kase = 3;
                } else if ks == p as isize - 1 {
                    kase = 1;
                } else {
                    kase = 2;
                    k = ks;
                }
            }
            let mut k = (k + 1) as usize;

            match kase {
                // deflate negligible s(p)
                1 => {
                    let mut f = e[p - 2];
                    e[p - 2] = 0.0;
                    for j in (k..=p - 2).rev() {
                        let mut t = s[j].hypot(f);
                        let cs = s[j] / t;
                        let sn = f / t;
                        s[j] = t;
                        if j != k {
                            f = -sn * e[j - 1];
                            e[j - 1] *= cs;
                        }
                        for i in 0..n {
                            t = cs * v[i * n + j] + sn * v[i * n + p - 1];
                            v[i * n + p - 1] = -sn * v[i * n + j] + cs * v[i * n + p - 1];
                            v[i * n + j] = t;
                        }
                    }
                }
                // split at negligible s(k)
                2 => {
                    let mut f = e[k - 1];
                    e[k - 1] = 0.0;
                    for j in k..p {
                        let mut t = s[j].hypot(f);
                        let cs = s[j] / t;
                        let sn = f / t;
                        s[j] = t;
                        f = -sn * e[j];
                        e[j] *= cs;
                        for i in 0..m {
                            t = cs * u[i * n + j] + sn * u[i * n + k - 1];
                            u[i * n + k - 1] = -sn * u[i * n + j] + cs * u[i * n + k - 1];
                            u[i * n + j] = t;
                        }
                    }
                }
                // one implicit qr step
                3 => {
                    // calculate the shift
                    let max_pm = s[p - 1].abs().max(s[p - 2].abs());
                    let scale = max_pm
                        .max(e[p - 2].abs())
                        .max(s[k].abs())
                        .max(e[k].abs());
                    let sp = s[p - 1] / scale;
                    let spm1 = s[p - 2] / scale;
                    let epm1 = e[p - 2] / scale;
                    let sk = s[k] / scale;
                    let ek = e[k] / scale;
                    let b = ((spm1 + sp) * (spm1 - sp) + epm1 * epm1) / 2.0;
                    let c = (sp * epm1) * (sp * epm1);
                    let mut shift = 0.0f64;
                    if b != 0.0 || c != 0.0 {
                        shift = (b * b + c).sqrt();
                        if b < 0.0 {
                            shift = -shift;
                        }
                        shift = c / (b + shift);
                    }
                    let mut f = (sk + sp) * (sk - sp) + shift;
                    let mut g = sk * ek;
                    // chase zeros
                    for j in k..p - 1 {
                        let mut t = f.hypot(g);
                        let mut cs = f / t;
                        let mut sn = g / t;
                        if j != k {
                            e[j - 1] = t;
                        }
                        f = cs * s[j] + sn * e[j];
                        e[j] = cs * e[j] - sn * s[j];
                        g = sn * s[j + 1];
                        s[j + 1] *= cs;
                        for i in 0..n {
                            t = cs * v[i * n + j] + sn * v[i * n + j + 1];
                            v[i * n + j + 1] = -sn * v[i * n + j] + cs * v[i * n + j + 1];
                            v[i * n + j] = t;
                        }
                        t = f.hypot(g);
                        cs = f / t;
                        sn = g / t;
                        s[j] = t;
                        f = cs * e[j] + sn * s[j + 1];
                        s[j + 1] = -sn * e[j] + cs * s[j + 1];
                        g = sn * e[j + 1];
                        e[j + 1] *= cs;
                        if j < m - 1 {
                            for i in 0..m {
                                t = cs * u[i * n + j] + sn * u[i * n + j + 1];
                                u[i * n + j + 1] = -sn * u[i * n + j] + cs * u[i * n + j + 1];
                                u[i * n + j] = t;
                            }
                        }
                    }
                    e[p - 2] = f;
                }
                // convergence
                _ => {
                    // make the singular value positive
                    if s[k] <= 0.0 {
                        s[k] = if s[k] < 0.0 { -s[k] } else { 0.0 };
                        for i in 0..=pp {
                            v[i * n + k] = -v[i * n + k];
                        }
                    }
                    // restore descending order
                    while k < pp {
                        if s[k] >= s[k + 1] {
                            break;
                        }
                        s.swap(k, k + 1);
                        if k < n - 1 {
                            for i in 0..n {
                                v.swap(i * n + k, i * n + k + 1);
                            }
                        }
                        if k < m - 1 {
                            for i in 0..m {
                                u.swap(i * n + k, i * n + k + 1);
                            }
                        }
                        k += 1;
                    }
                    p -= 1;
                }
            }
        }

        let tol = (m as f64 * s[0] * eps).max(f64::MIN_POSITIVE.sqrt());
        Ok(Self {
            u,
            s,
            v,
            m,
            n,
            tol,
            _marker: PhantomData,
        })
    }

    /// The left singular vectors, m x n
    pub fn u(&self) -> Tensor<T> {
        cast(&Tensor::from_parts(
            Storage::from_vec(self.u.clone()),
            Layout::dense([self.m, self.n], 0, Order::C),
        ))
    }

    /// The right singular vectors, n x n
    pub fn v(&self) -> Tensor<T> {
        cast(&Tensor::from_parts(
            Storage::from_vec(self.v.clone()),
            Layout::dense([self.n, self.n], 0, Order::C),
        ))
    }

    /// The singular values, descending
    pub fn singular_values(&self) -> Tensor<T> {
        cast(&Tensor::from_parts(
            Storage::from_vec(self.s.clone()),
            Layout::dense([self.n], 0, Order::C),
        ))
    }

    /// The diagonal matrix of singular values, n x n
    pub fn s(&self) -> Tensor<T> {
        let out: Tensor<f64> = Engine::default().zeros([self.n, self.n]);
        for i in 0..self.n {
            out.set2(i, i, self.s[i]);
        }
        cast(&out)
    }

    /// The L2 operator norm, which is the largest singular value
    pub fn norm2(&self) -> f64 {
        self.s[0]
    }

    /// Two-norm condition number, `max(S) / min(S)`
    pub fn condition_number(&self) -> f64 {
        self.s[0] / self.s[self.n - 1]
    }

    /// Inverse of the condition number, well defined even at rank deficiency
    pub fn inverse_condition_number(&self) -> f64 {
        self.s[self.n - 1] / self.s[0]
    }

    /// Effective numerical rank: the count of non-negligible singular values
    pub fn rank(&self) -> usize {
        self.s.iter().filter(|&&v| v > self.tol).count()
    }

    /// Absolute value of the determinant, from the singular values
    pub fn abs_det(&self) -> f64 {
        self.s.iter().product()
    }
}
