//! Eigenvalue decomposition of square real matrices

use super::{cast, check_square};
use crate::dtype::Element;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::tensor::{Layout, Order, Storage, Tensor};
use std::marker::PhantomData;

/// Eigenvalues and eigenvectors of a square real matrix
///
/// For symmetric input `A = V * D * V^T` with `D` diagonal and `V` orthogonal.
/// For non-symmetric input `D` is block diagonal: real eigenvalues in 1x1
/// blocks and complex conjugate pairs `lambda +/- i*mu` in 2x2 blocks
/// `[lambda, mu; -mu, lambda]`, with `A * V = V * D`. `V` may be badly
/// conditioned in the non-symmetric case.
///
/// Eigenvalues are reported in descending order of the symmetric sweep, the
/// eigenvector columns permuted to match.
#[derive(Debug)]
pub struct Eigen<T: Element> {
    real: Vec<f64>,
    imag: Vec<f64>,
    // n x n eigenvector matrix, row major
    v: Vec<f64>,
    n: usize,
    _marker: PhantomData<T>,
}

impl<T: Element> Eigen<T> {
    pub(super) fn new(a: &Tensor<T>) -> Result<Self> {
        let n = check_square(a, "eig")?;
        if a.iter(Order::C).any(|v| v.to_f64().is_nan()) {
            return Err(Error::invalid_argument(
                "matrix",
                "Tensors cannot have NaN values.",
            ));
        }
        if n == 0 {
            return Err(Error::invalid_argument(
                "matrix",
                "eig requires a non-empty matrix",
            ));
        }
        let mut real = vec![0.0f64; n];
        let mut imag = vec![0.0f64; n];
        let mut v = vec![0.0f64; n * n];

        if a.is_symmetric() {
            for i in 0..n {
                for j in 0..n {
                    v[i * n + j] = a.get_f64(i, j);
                }
            }
            tridiagonalize(n, &mut v, &mut real, &mut imag);
            diagonalize(n, &mut v, &mut real, &mut imag);
        } else {
            let mut hess = vec![0.0f64; n * n];
            for i in 0..n {
                for j in 0..n {
                    hess[i * n + j] = a.get_f64(i, j);
                }
            }
            reduce_to_hessenberg(n, &mut hess, &mut v);
            hessenberg_to_schur(n, &mut hess, &mut v, &mut real, &mut imag);
        }

        reverse_order(n, &mut v, &mut real, &mut imag);
        Ok(Self {
            real,
            imag,
            v,
            n,
            _marker: PhantomData,
        })
    }

    fn v_f64(&self) -> Tensor<f64> {
        Tensor::from_parts(
            Storage::from_vec(self.v.clone()),
            Layout::dense([self.n, self.n], 0, Order::C),
        )
    }

    /// The eigenvector matrix `V`, one eigenvector per column
    pub fn v(&self) -> Tensor<T> {
        cast(&self.v_f64())
    }

    /// Real parts of the eigenvalues
    pub fn real(&self) -> Tensor<T> {
        cast(&Tensor::from_parts(
            Storage::from_vec(self.real.clone()),
            Layout::dense([self.n], 0, Order::C),
        ))
    }

    /// Imaginary parts of the eigenvalues
    pub fn imag(&self) -> Tensor<T> {
        cast(&Tensor::from_parts(
            Storage::from_vec(self.imag.clone()),
            Layout::dense([self.n], 0, Order::C),
        ))
    }

    /// Whether any eigenvalue has a nonzero imaginary part
    pub fn is_complex(&self) -> bool {
        self.imag.iter().any(|&x| x != 0.0)
    }

    /// The block diagonal eigenvalue matrix `D`
    pub fn d(&self) -> Tensor<T> {
        let d: Tensor<f64> = Engine::default().zeros([self.n, self.n]);
        for i in 0..self.n {
            d.set2(i, i, self.real[i]);
        }
        for i in 0..self.n {
            if self.imag[i] > 0.0 {
                d.set2(i, i - 1, self.imag[i]);
            } else if self.imag[i] < 0.0 {
                d.set2(i, i + 1, self.imag[i]);
            }
        }
        cast(&d)
    }

    /// Raise a symmetric input to a real power through its spectrum
    ///
    /// Computes `V * D^p * V^T` with the power applied to the diagonal only,
    /// so it is meaningful when the eigenvalues are real.
    pub fn power(&self, power: f64) -> Result<Tensor<T>> {
        let lambda: Tensor<f64> = cast(&self.d());
        for i in 0..self.n {
            lambda.set2(i, i, lambda.get2(i, i).powf(power));
        }
        let v = self.v_f64();
        let out = v.mm(&lambda)?.mm(&v.t())?;
        Ok(cast(&out))
    }
}

// Symmetric Householder reduction to tridiagonal form (Algol tred2).
fn tridiagonalize(n: usize, v: &mut [f64], d: &mut [f64], e: &mut [f64]) {
    for j in 0..n {
        d[j] = v[(n - 1) * n + j];
    }

    for i in (1..n).rev() {
        // scale to avoid under/overflow
        let mut scale = 0.0f64;
        let mut h = 0.0f64;
        for k in 0..i {
            scale += d[k].abs();
        }
        if scale == 0.0 {
            e[i] = d[i - 1];
            for j in 0..i {
                d[j] = v[(i - 1) * n + j];
                v[i * n + j] = 0.0;
                v[j * n + i] = 0.0;
            }
        } else {
            // generate the Householder vector
            for k in 0..i {
                d[k] /= scale;
                h += d[k] * d[k];
            }
            let mut f = d[i - 1];
            let mut g = h.sqrt();
            if f > 0.0 {
                g = -g;
            }
            e[i] = scale * g;
            h -= f * g;
            d[i - 1] = f - g;
            for item in e.iter_mut().take(i) {
                *item = 0.0;
            }

            // apply the similarity transformation to the remaining columns
            for j in 0..i {
                f = d[j];
                v[j * n + i] = f;
                g = e[j] + v[j * n + j] * f;
                for k in j + 1..i {
                    g += v[k * n + j] * d[k];
                    e[k] += v[k * n + j] * f;
                }
                e[j] = g;
            }
            f = 0.0;
            for j in 0..i {
                e[j] /= h;
                f += e[j] * d[j];
            }
            let hh = f / (h + h);
            for j in 0..i {
                e[j] -= hh * d[j];
            }
            for j in 0..i {
                f = d[j];
                g = e[j];
                for k in j..i {
                    v[k * n + j] -= f * e[k] + g * d[k];
                }
                d[j] = v[(i - 1) * n + j];
                v[i * n + j] = 0.0;
            }
        }
        d[i] = h;
    }

    // accumulate transformations
    for i in 0..n.saturating_sub(1) {
        v[(n - 1) * n + i] = v[i * n + i];
        v[i * n + i] = 1.0;
        let h = d[i + 1];
        if h != 0.0 {
            for k in 0..=i {
                d[k] = v[k * n + i + 1] / h;
            }
            for j in 0..=i {
                let mut g = 0.0;
                for k in 0..=i {
                    g += v[k * n + i + 1] * v[k * n + j];
                }
                for k in 0..=i {
                    v[k * n + j] -= g * d[k];
                }
            }
        }
        for k in 0..=i {
            v[k * n + i + 1] = 0.0;
        }
    }
    for j in 0..n {
        d[j] = v[(n - 1) * n + j];
        v[(n - 1) * n + j] = 0.0;
    }
    v[(n - 1) * n + n - 1] = 1.0;
    e[0] = 0.0;
}

// Symmetric tridiagonal QL algorithm (Algol tql2).
fn diagonalize(n: usize, v: &mut [f64], d: &mut [f64], e: &mut [f64]) {
    for i in 1..n {
        e[i - 1] = e[i];
    }
    e[n - 1] = 0.0;

    let mut f = 0.0f64;
    let mut tst1 = 0.0f64;
    let eps = 2.0f64.powi(-52);
    for l in 0..n {
        // find a small subdiagonal element
        tst1 = tst1.max(d[l].abs() + e[l].abs());
        let mut m = l;
        while m < n {
            if e[m].abs() <= eps * tst1 {
                break;
            }
            m += 1;
        }

        // d[l] is already an eigenvalue when m == l
        if m > l {
            loop {
                // compute the implicit shift
                let mut g = d[l];
                let mut p = (d[l + 1] - g) / (2.0 * e[l]);
                let mut r = p.hypot(1.0);
                if p < 0.0 {
                    r = -r;
                }
                d[l] = e[l] / (p + r);
                d[l + 1] = e[l] * (p + r);
                let dl1 = d[l + 1];
                let mut h = g - d[l];
                for item in d.iter_mut().take(n).skip(l + 2) {
                    *item -= h;
                }
                f += h;

                // implicit QL transformation
                p = d[m];
                let mut c = 1.0f64;
                let mut c2 = c;
                let mut c3 = c;
                let el1 = e[l + 1];
                let mut s = 0.0f64;
                let mut s2 = 0.0f64;
                for i in (l..m).rev() {
                    c3 = c2;
                    c2 = c;
                    s2 = s;
                    g = c * e[i];
                    h = c * p;
                    r = p.hypot(e[i]);
                    e[i + 1] = s * r;
                    s = e[i] / r;
                    c = p / r;
                    p = c * d[i] - s * g;
                    d[i + 1] = h + s * (c * g + s * d[i]);

                    // accumulate the rotation
                    for k in 0..n {
                        h = v[k * n + i + 1];
                        v[k * n + i + 1] = s * v[k * n + i] + c * h;
                        v[k * n + i] = c * v[k * n + i] - s * h;
                    }
                }
                p = -s * s2 * c3 * el1 * e[l] / dl1;
                e[l] = s * p;
                d[l] = c * p;

                if e[l].abs() <= eps * tst1 {
                    break;
                }
            }
        }
        d[l] += f;
        e[l] = 0.0;
    }

    // selection sort ascending, vectors follow their values
    for i in 0..n.saturating_sub(1) {
        let mut k = i;
        let mut p = d[i];
        for j in i + 1..n {
            if d[j] < p {
                k = j;
                p = d[j];
            }
        }
        if k != i {
            d[k] = d[i];
            d[i] = p;
            for j in 0..n {
                v.swap(j * n + i, j * n + k);
            }
        }
    }
}

// Nonsymmetric reduction to Hessenberg form (Algol orthes and ortran).
fn reduce_to_hessenberg(n: usize, h: &mut [f64], v: &mut [f64]) {
    let low = 0usize;
    let high = n - 1;
    let mut ort = vec![0.0f64; n];

    for m in low + 1..high {
        // scale the column
        let mut scale = 0.0f64;
        for i in m..=high {
            scale += h[i * n + m - 1].abs();
        }
        if scale != 0.0 {
            // compute the Householder transformation
            let mut hsum = 0.0f64;
            for i in (m..=high).rev() {
                ort[i] = h[i * n + m - 1] / scale;
                hsum += ort[i] * ort[i];
            }
            let mut g = hsum.sqrt();
            if ort[m] > 0.0 {
                g = -g;
            }
            hsum -= ort[m] * g;
            ort[m] -= g;

            // H = (I - u*u'/h) * H * (I - u*u'/h)
            for j in m..n {
                let mut f = 0.0f64;
                for i in (m..=high).rev() {
                    f += ort[i] * h[i * n + j];
                }
                f /= hsum;
                for i in m..=high {
                    h[i * n + j] -= f * ort[i];
                }
            }
            for i in 0..=high {
                let mut f = 0.0f64;
                for j in (m..=high).rev() {
                    f += ort[j] * h[i * n + j];
                }
                f /= hsum;
                for j in m..=high {
                    h[i * n + j] -= f * ort[j];
                }
            }
            ort[m] *= scale;
            h[m * n + m - 1] = scale * g;
        }
    }

    // accumulate transformations
    for i in 0..n {
        for j in 0..n {
            v[i * n + j] = if i == j { 1.0 } else { 0.0 };
        }
    }
    for m in (low + 1..high).rev() {
        if h[m * n + m - 1] != 0.0 {
            for i in m + 1..=high {
                ort[i] = h[i * n + m - 1];
            }
            for j in m..=high {
                let mut g = 0.0f64;
                for i in m..=high {
                    g += ort[i] * v[i * n + j];
                }
                // double division avoids possible underflow
                g = (g / ort[m]) / h[m * n + m - 1];
                for i in m..=high {
                    v[i * n + j] += g * ort[i];
                }
            }
        }
    }
}

// Complex scalar division.
fn cdiv(xr: f64, xi: f64, yr: f64, yi: f64) -> (f64, f64) {
    if yr.abs() > yi.abs() {
        let r = yi / yr;
        let d = yr + r * yi;
        ((xr + r * xi) / d, (xi - r * xr) / d)
    } else {
        let r = yr / yi;
        let d = yi + r * yr;
        ((r * xr + xi) / d, (r * xi - xr) / d)
    }
}

// Nonsymmetric reduction from Hessenberg to real Schur form (Algol hqr2).
fn hessenberg_to_schur(nn: usize, h: &mut [f64], v: &mut [f64], d: &mut [f64], e: &mut [f64]) {
    let low = 0isize;
    let high = nn - 1;
    let eps = 2.0f64.powi(-52);
    let mut exshift = 0.0f64;
    let (mut p, mut q, mut r, mut s, mut z) = (0.0f64, 0.0f64, 0.0f64, 0.0f64, 0.0f64);
    let (mut t, mut w, mut x, mut y) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);

    // compute the matrix norm
    let mut norm = 0.0f64;
    for i in 0..nn {
        for j in i.saturating_sub(1)..nn {
            norm += h[i * nn + j].abs();
        }
    }

    // outer loop over the eigenvalue index
    let mut en = nn as isize - 1;
    let mut iter = 0;
    while en >= low {
        let n = en as usize;

        // look for a single small sub-diagonal element
        let mut l = n;
        while l > low as usize {
            s = h[(l - 1) * nn + l - 1].abs() + h[l * nn + l].abs();
            if s == 0.0 {
                s = norm;
            }
            if h[l * nn + l - 1].abs() < eps * s {
                break;
            }
            l -= 1;
        }

        if l == n {
            // one root found
            h[n * nn + n] += exshift;
            d[n] = h[n * nn + n];
            e[n] = 0.0;
            en -= 1;
            iter = 0;
        } else if l == n - 1 {
            // two roots found
            w = h[n * nn + n - 1] * h[(n - 1) * nn + n];
            p = (h[(n - 1) * nn + n - 1] - h[n * nn + n]) / 2.0;
            q = p * p + w;
            z = q.abs().sqrt();
            h[n * nn + n] += exshift;
            h[(n - 1) * nn + n - 1] += exshift;
            x = h[n * nn + n];

            if q >= 0.0 {
                // real pair
                z = if p >= 0.0 { p + z } else { p - z };
                d[n - 1] = x + z;
                d[n] = d[n - 1];
                if z != 0.0 {
                    d[n] = x - w / z;
                }
                e[n - 1] = 0.0;
                e[n] = 0.0;
                x = h[n * nn + n - 1];
                s = x.abs() + z.abs();
                p = x / s;
                q = z / s;
                r = (p * p + q * q).sqrt();
                p /= r;
                q /= r;

                // row modification
                for j in n - 1..nn {
                    z = h[(n - 1) * nn + j];
                    h[(n - 1) * nn + j] = q * z + p * h[n * nn + j];
                    h[n * nn + j] = q * h[n * nn + j] - p * z;
                }
                // column modification
                for i in 0..=n {
                    z = h[i * nn + n - 1];
                    h[i * nn + n - 1] = q * z + p * h[i * nn + n];
                    h[i * nn + n] = q * h[i * nn + n] - p * z;
                }
                // accumulate transformations
                for i in low as usize..=high {
                    z = v[i * nn + n - 1];
                    v[i * nn + n - 1] = q * z + p * v[i * nn + n];
                    v[i * nn + n] = q * v[i * nn + n] - p * z;
                }
            } else {
                // complex pair
                d[n - 1] = x + p;
                d[n] = x + p;
                e[n - 1] = z;
                e[n] = -z;
            }
            en -= 2;
            iter = 0;
        } else {
            // no convergence yet; form a shift
            x = h[n * nn + n];
            y = 0.0;
            w = 0.0;
            if l < n {
                y = h[(n - 1) * nn + n - 1];
                w = h[n * nn + n - 1] * h[(n - 1) * nn + n];
            }

            // Wilkinson's original ad hoc shift
            if iter == 10 {
                exshift += x;
                for i in low as usize..=n {
                    h[i * nn + i] -= x;
                }
                s = h[n * nn + n - 1].abs() + h[(n - 1) * nn + n - 2].abs();
                x = 0.75 * s;
                y = x;
                w = -0.4375 * s * s;
            }

            // MATLAB's new ad hoc shift
            if iter == 30 {
                s = (y - x) / 2.0;
                s = s * s + w;
                if s > 0.0 {
                    s = s.sqrt();
                    if y < x {
                        s = -s;
                    }
                    s = x - w / ((y - x) / 2.0 + s);
                    for i in low as usize..=n {
                        h[i * nn + i] -= s;
                    }
                    exshift += s;
                    x = 0.964;
                    y = 0.964;
                    w = 0.964;
                }
            }

            iter += 1;

            // look for two consecutive small sub-diagonal elements
            let mut m = n as isize - 2;
            while m >= l as isize {
                let mu = m as usize;
                z = h[mu * nn + mu];
                r = x - z;
                s = y - z;
                p = (r * s - w) / h[(mu + 1) * nn + mu] + h[mu * nn + mu + 1];
                q = h[(mu + 1) * nn + mu + 1] - z - r - s;
                r = h[(mu + 2) * nn + mu + 1];
                s = p.abs() + q.abs() + r.abs();
                p /= s;
                q /= s;
                r /= s;
                if mu == l {
                    break;
                }
                if h[mu * nn + mu - 1].abs() * (q.abs() + r.abs())
                    < eps
                        * (p.abs()
                            * (h[(mu - 1) * nn + mu - 1].abs()
                                + z.abs()
                                + h[(mu + 1) * nn + mu + 1].abs()))
                {
                    break;
                }
                m -= 1;
            }
            let m = m as usize;

            for i in m + 2..=n {
                h[i * nn + i - 2] = 0.0;
                if i > m + 2 {
                    h[i * nn + i - 3] = 0.0;
                }
            }

            // double QR step over rows l..n and columns m..n
            for k in m..n {
                let notlast = k != n - 1;
                if k != m {
                    p = h[k * nn + k - 1];
                    q = h[(k + 1) * nn + k - 1];
                    r = if notlast { h[(k + 2) * nn + k - 1] } else { 0.0 };
                    x = p.abs() + q.abs() + r.abs();
                    if x == 0.0 {
                        continue;
                    }
                    p /= x;
                    q /= x;
                    r /= x;
                }

                s = (p * p + q * q + r * r).sqrt();
                if p < 0.0 {
                    s = -s;
                }
                if s != 0.0 {
                    if k != m {
                        h[k * nn + k - 1] = -s * x;
                    } else if l != m {
                        h[k * nn + k - 1] = -h[k * nn + k - 1];
                    }
                    p += s;
                    x = p / s;
                    y = q / s;
                    z = r / s;
                    q /= p;
                    r /= p;

                    // row modification
                    for j in k..nn {
                        p = h[k * nn + j] + q * h[(k + 1) * nn + j];
                        if notlast {
                            p += r * h[(k + 2) * nn + j];
                            h[(k + 2) * nn + j] -= p * z;
                        }
                        h[k * nn + j] -= p * x;
                        h[(k + 1) * nn + j] -= p * y;
                    }
                    // column modification
                    for i in 0..=n.min(k + 3) {
                        p = x * h[i * nn + k] + y * h[i * nn + k + 1];
                        if notlast {
                            p += z * h[i * nn + k + 2];
                            h[i * nn + k + 2] -= p * r;
                        }
                        h[i * nn + k] -= p;
                        h[i * nn + k + 1] -= p * q;
                    }
                    // accumulate transformations
                    for i in low as usize..=high {
                        p = x * v[i * nn + k] + y * v[i * nn + k + 1];
                        if notlast {
                            p += z * v[i * nn + k + 2];
                            v[i * nn + k + 2] -= p * r;
                        }
                        v[i * nn + k] -= p;
                        v[i * nn + k + 1] -= p * q;
                    }
                }
            }
        }
    }

    // backsubstitute to find the vectors of the upper triangular form
    if norm == 0.0 {
        return;
    }

    for n in (0..nn).rev() {
        p = d[n];
        q = e[n];

        if q == 0.0 {
            // real vector
            let mut l = n;
            h[n * nn + n] = 1.0;
            for i in (0..n).rev() {
                w = h[i * nn + i] - p;
                r = 0.0;
                for j in l..=n {
                    r += h[i * nn + j] * h[j * nn + n];
                }
                if e[i] < 0.0 {
                    z = w;
                    s = r;
                } else {
                    l = i;
                    if e[i] == 0.0 {
                        if w != 0.0 {
                            h[i * nn + n] = -r / w;
                        } else {
                            h[i * nn + n] = -r / (eps * norm);
                        }
                    } else {
                        // solve the real 2x2 system
                        x = h[i * nn + i + 1];
                        y = h[(i + 1) * nn + i];
                        q = (d[i] - p) * (d[i] - p) + e[i] * e[i];
                        t = (x * s - z * r) / q;
                        h[i * nn + n] = t;
                        if x.abs() > z.abs() {
                            h[(i + 1) * nn + n] = (-r - w * t) / x;
                        } else {
                            h[(i + 1) * nn + n] = (-s - y * t) / z;
                        }
                    }

                    // overflow control
                    t = h[i * nn + n].abs();
                    if (eps * t) * t > 1.0 {
                        for j in i..=n {
                            h[j * nn + n] /= t;
                        }
                    }
                }
            }
        } else if q < 0.0 {
            // complex vector; last component imaginary so the matrix is triangular
            let mut l = n - 1;
            if h[n * nn + n - 1].abs() > h[(n - 1) * nn + n].abs() {
                h[(n - 1) * nn + n - 1] = q / h[n * nn + n - 1];
                h[(n - 1) * nn + n] = -(h[n * nn + n] - p) / h[n * nn + n - 1];
            } else {
                let (cr, ci) = cdiv(0.0, -h[(n - 1) * nn + n], h[(n - 1) * nn + n - 1] - p, q);
                h[(n - 1) * nn + n - 1] = cr;
                h[(n - 1) * nn + n] = ci;
            }
            h[n * nn + n - 1] = 0.0;
            h[n * nn + n] = 1.0;
            for i in (0..n.saturating_sub(1)).rev() {
                let mut ra = 0.0f64;
                let mut sa = 0.0f64;
                for j in l..=n {
                    ra += h[i * nn + j] * h[j * nn + n - 1];
                    sa += h[i * nn + j] * h[j * nn + n];
                }
                w = h[i * nn + i] - p;

                if e[i] < 0.0 {
                    z = w;
                    r = ra;
                    s = sa;
                } else {
                    l = i;
                    if e[i] == 0.0 {
                        let (cr, ci) = cdiv(-ra, -sa, w, q);
                        h[i * nn + n - 1] = cr;
                        h[i * nn + n] = ci;
                    } else {
                        // solve the complex 2x2 system
                        x = h[i * nn + i + 1];
                        y = h[(i + 1) * nn + i];
                        let mut vr = (d[i] - p) * (d[i] - p) + e[i] * e[i] - q * q;
                        let vi = (d[i] - p) * 2.0 * q;
                        if vr == 0.0 && vi == 0.0 {
                            vr = eps * norm * (w.abs() + q.abs() + x.abs() + y.abs() + z.abs());
                        }
                        let (cr, ci) =
                            cdiv(x * r - z * ra + q * sa, x * s - z * sa - q * ra, vr, vi);
                        h[i * nn + n - 1] = cr;
                        h[i * nn + n] = ci;
                        if x.abs() > z.abs() + q.abs() {
                            h[(i + 1) * nn + n - 1] =
                                (-ra - w * h[i * nn + n - 1] + q * h[i * nn + n]) / x;
                            h[(i + 1) * nn + n] =
                                (-sa - w * h[i * nn + n] - q * h[i * nn + n - 1]) / x;
                        } else {
                            let (cr, ci) =
                                cdiv(-r - y * h[i * nn + n - 1], -s - y * h[i * nn + n], z, q);
                            h[(i + 1) * nn + n - 1] = cr;
                            h[(i + 1) * nn + n] = ci;
                        }
                    }

                    // overflow control
                    t = h[i * nn + n - 1].abs().max(h[i * nn + n].abs());
                    if (eps * t) * t > 1.0 {
                        for j in i..=n {
                            h[j * nn + n - 1] /= t;
                            h[j * nn + n] /= t;
                        }
                    }
                }
            }
        }
    }

    // back transformation to get the eigenvectors of the original matrix
    for j in (low as usize..nn).rev() {
        for i in low as usize..=high {
            z = 0.0;
            for k in low as usize..=j.min(high) {
                z += v[i * nn + k] * h[k * nn + j];
            }
            v[i * nn + j] = z;
        }
    }
}

// Reverse the eigenvalue order, columns of V following their values.
fn reverse_order(n: usize, v: &mut [f64], d: &mut [f64], e: &mut [f64]) {
    for i in 0..n / 2 {
        let k = n - 1 - i;
        d.swap(i, k);
        e.swap(i, k);
        for j in 0..n {
            v.swap(j * n + i, j * n + k);
        }
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

    fn symmetric_matrix(n: usize, seed: u64) -> Tensor<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let g: Tensor<f64> = Engine::default().random_normal([n, n], &mut rng);
        g.add(&g.t()).unwrap()
    }

    #[test]
    fn test_symmetric_reconstruction() {
        let a = symmetric_matrix(6, 17);
        let eig = a.eig().unwrap();
        let v: Tensor<f64> = eig.v();
        let d: Tensor<f64> = eig.d();
        let rebuilt = v.mm(&d).unwrap().mm(&v.t()).unwrap();
        assert!(close(&a, &rebuilt, 1e-10));
        // all eigenvalues real
        assert!(!eig.is_complex());
    }

    #[test]
    fn test_symmetric_descending_order() {
        let a = symmetric_matrix(5, 23);
        let eig = a.eig().unwrap();
        let vals: Vec<f64> = eig.real().to_vec(Order::C);
        assert!(vals.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_orthonormal_vectors_for_symmetric() {
        let a = symmetric_matrix(4, 29);
        let v: Tensor<f64> = a.eig().unwrap().v();
        let vtv = v.t().mm(&v).unwrap();
        let eye: Tensor<f64> = Engine::default().eye(4);
        assert!(close(&vtv, &eye, 1e-10));
    }

    #[test]
    fn test_general_satisfies_av_eq_vd() {
        let mut rng = StdRng::seed_from_u64(31);
        let a: Tensor<f64> = Engine::default().random_normal([5, 5], &mut rng);
        let eig = a.eig().unwrap();
        let v: Tensor<f64> = eig.v();
        let d: Tensor<f64> = eig.d();
        let av = a.mm(&v).unwrap();
        let vd = v.mm(&d).unwrap();
        assert!(close(&av, &vd, 1e-8));
    }

    #[test]
    fn test_rotation_has_complex_pair() {
        // planar rotation has eigenvalues +/- i
        let a: Tensor<f64> = Engine::default()
            .from_slice([2, 2], &[0.0, -1.0, 1.0, 0.0])
            .unwrap();
        let eig = a.eig().unwrap();
        assert!(eig.is_complex());
        let imag: Vec<f64> = eig.imag().to_vec(Order::C);
        assert!((imag[0].abs() - 1.0).abs() < 1e-12);
        assert!((imag[0] + imag[1]).abs() < 1e-12);
        let v: Tensor<f64> = eig.v();
        let d: Tensor<f64> = eig.d();
        assert!(close(&a.mm(&v).unwrap(), &v.mm(&d).unwrap(), 1e-10));
    }

    #[test]
    fn test_power() {
        let a = symmetric_matrix(4, 37);
        let cubed = a.eig().unwrap().power(3.0).unwrap();
        let direct = a.mm(&a).unwrap().mm(&a).unwrap();
        assert!(close(&cubed, &direct, 1e-8));
    }

    #[test]
    fn test_nan_rejected() {
        let e = Engine::default();
        let a: Tensor<f64> = e.from_slice([2, 2], &[1.0, f64::NAN, 0.0, 1.0]).unwrap();
        assert!(a.eig().is_err());
    }

    #[test]
    fn test_non_square_rejected() {
        let a: Tensor<f64> = Engine::default().zeros([2, 3]);
        assert!(a.eig().is_err());
    }
}
