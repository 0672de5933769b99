//! One dimensional interpolants through (x, y) samples with strictly
//! increasing x.
use super::{segment, Kind, Method};
use crate::error::{Error, Result};

/// A function of one variable reconstructed from samples.
pub trait Curve {
    fn at(&self, x: f64) -> f64;

    fn sample(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.at(x)).collect()
    }
}

/// Fit the 1-D scheme named by `method` (with `kind` for interp1d).
pub(crate) fn fit(method: Method, kind: Kind, xs: &[f64], ys: &[f64]) -> Result<Box<dyn Curve>> {
    check_samples(xs, ys)?;
    let (xs, ys) = (xs.to_vec(), ys.to_vec());

    let curve: Box<dyn Curve> = match method {
        Method::Interp1d => match kind {
            Kind::Linear => Box::new(Linear { xs, ys }),
            Kind::Nearest => Box::new(Nearest { xs, ys }),
            Kind::Cubic => Box::new(CubicSpline::new(xs, ys)),
        },
        Method::Pchip => Box::new(Hermite::pchip(xs, ys)),
        Method::Akima => Box::new(Hermite::akima(xs, ys)),
        Method::Krogh => Box::new(Newton::new(xs, ys)),
        Method::Barycentric => Box::new(Barycentric::new(xs, ys)),
        other => {
            return Err(Error::InvalidArgument(format!(
                "{other} is not a one dimensional scheme"
            )))
        }
    };
    Ok(curve)
}

fn check_samples(xs: &[f64], ys: &[f64]) -> Result<()> {
    if xs.len() != ys.len() {
        return Err(Error::InvalidArgument(format!(
            "{} abscissae for {} ordinates",
            xs.len(),
            ys.len()
        )));
    }
    if xs.len() < 2 {
        return Err(Error::InvalidArgument(
            "at least two samples are needed to interpolate".to_owned(),
        ));
    }
    if xs.windows(2).any(|pair| !(pair[1] > pair[0])) {
        return Err(Error::InvalidArgument(
            "sample abscissae must be strictly increasing".to_owned(),
        ));
    }
    Ok(())
}

fn slopes(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    xs.windows(2)
        .zip(ys.windows(2))
        .map(|(x, y)| (y[1] - y[0]) / (x[1] - x[0]))
        .collect()
}

pub(crate) struct Linear {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl Curve for Linear {
    fn at(&self, x: f64) -> f64 {
        let i = segment(&self.xs, x);
        let t = (x - self.xs[i]) / (self.xs[i + 1] - self.xs[i]);
        self.ys[i] + t * (self.ys[i + 1] - self.ys[i])
    }
}

pub(crate) struct Nearest {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl Curve for Nearest {
    /// Halfway points go to the lower sample.
    fn at(&self, x: f64) -> f64 {
        let i = segment(&self.xs, x);
        if x - self.xs[i] <= self.xs[i + 1] - x {
            self.ys[i]
        } else {
            self.ys[i + 1]
        }
    }
}

/// Interpolating cubic spline with natural (zero curvature) ends.
pub(crate) struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// second derivative at every knot
    curvature: Vec<f64>,
}

impl CubicSpline {
    pub(crate) fn new(xs: Vec<f64>, ys: Vec<f64>) -> Self {
        let n = xs.len();
        let mut curvature = vec![0.0; n];
        if n > 2 {
            // tridiagonal system for the interior knots, Thomas algorithm
            let h = xs.windows(2).map(|w| w[1] - w[0]).collect::<Vec<_>>();
            let m = slopes(&xs, &ys);
            let mut diagonal = vec![0.0; n];
            let mut rhs = vec![0.0; n];
            for i in 1..n - 1 {
                diagonal[i] = 2.0 * (h[i - 1] + h[i]);
                rhs[i] = 6.0 * (m[i] - m[i - 1]);
            }
            for i in 2..n - 1 {
                let w = h[i - 1] / diagonal[i - 1];
                diagonal[i] -= w * h[i - 1];
                rhs[i] -= w * rhs[i - 1];
            }
            for i in (1..n - 1).rev() {
                let upper = if i + 1 < n - 1 { h[i] * curvature[i + 1] } else { 0.0 };
                curvature[i] = (rhs[i] - upper) / diagonal[i];
            }
        }

        Self { xs, ys, curvature }
    }
}

impl Curve for CubicSpline {
    fn at(&self, x: f64) -> f64 {
        let i = segment(&self.xs, x);
        let h = self.xs[i + 1] - self.xs[i];
        let a = (self.xs[i + 1] - x) / h;
        let b = (x - self.xs[i]) / h;
        a * self.ys[i]
            + b * self.ys[i + 1]
            + ((a * a * a - a) * self.curvature[i] + (b * b * b - b) * self.curvature[i + 1]) * h * h
                / 6.0
    }
}

/// Piecewise cubic through the samples with prescribed first derivatives.
pub(crate) struct Hermite {
    xs: Vec<f64>,
    ys: Vec<f64>,
    derivatives: Vec<f64>,
}

impl Hermite {
    /// Fritsch-Carlson monotone derivatives: a zero derivative at every local
    /// extremum, a weighted harmonic mean of the neighbouring slopes elsewhere.
    pub(crate) fn pchip(xs: Vec<f64>, ys: Vec<f64>) -> Self {
        let n = xs.len();
        let m = slopes(&xs, &ys);
        let derivatives = if n == 2 {
            vec![m[0]; 2]
        } else {
            let h = xs.windows(2).map(|w| w[1] - w[0]).collect::<Vec<_>>();
            let mut d = vec![0.0; n];
            for k in 1..n - 1 {
                if m[k - 1] * m[k] > 0.0 {
                    let w1 = 2.0 * h[k] + h[k - 1];
                    let w2 = h[k] + 2.0 * h[k - 1];
                    d[k] = (w1 + w2) / (w1 / m[k - 1] + w2 / m[k]);
                }
            }
            d[0] = pchip_end(h[0], h[1], m[0], m[1]);
            d[n - 1] = pchip_end(h[n - 2], h[n - 3], m[n - 2], m[n - 3]);
            d
        };

        Self { xs, ys, derivatives }
    }

    /// Akima's derivatives, weighting the neighbouring slopes by how much
    /// the slopes on the far side change.
    pub(crate) fn akima(xs: Vec<f64>, ys: Vec<f64>) -> Self {
        let n = xs.len();
        let m = slopes(&xs, &ys);
        if n == 2 {
            return Self {
                derivatives: vec![m[0]; 2],
                xs,
                ys,
            };
        }

        // two ghost slopes on either end, extrapolated linearly
        let mut extended = Vec::with_capacity(n + 3);
        let before = 2.0 * m[0] - m[1];
        extended.push(2.0 * before - m[0]);
        extended.push(before);
        extended.extend_from_slice(&m);
        let after = 2.0 * m[n - 2] - m[n - 3];
        extended.push(after);
        extended.push(2.0 * after - m[n - 2]);

        let dm = extended.windows(2).map(|w| (w[1] - w[0]).abs()).collect::<Vec<_>>();
        let largest = (0..n).map(|i| dm[i + 2] + dm[i]).fold(0.0, f64::max);

        let derivatives = (0..n)
            .map(|i| {
                let (f1, f2) = (dm[i + 2], dm[i]);
                if f1 + f2 > 1e-9 * largest {
                    (f1 * extended[i + 1] + f2 * extended[i + 2]) / (f1 + f2)
                } else {
                    0.5 * (extended[i + 1] + extended[i + 2])
                }
            })
            .collect();

        Self { xs, ys, derivatives }
    }
}

/// One-sided three point estimate, kept from overshooting.
fn pchip_end(h0: f64, h1: f64, m0: f64, m1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * m0 - h0 * m1) / (h0 + h1);
    if sign(d) != sign(m0) {
        0.0
    } else if sign(m0) != sign(m1) && d.abs() > 3.0 * m0.abs() {
        3.0 * m0
    } else {
        d
    }
}

/// -1, 0 or 1
fn sign(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

impl Curve for Hermite {
    fn at(&self, x: f64) -> f64 {
        let i = segment(&self.xs, x);
        hermite(
            self.xs[i],
            self.xs[i + 1],
            self.ys[i],
            self.ys[i + 1],
            self.derivatives[i],
            self.derivatives[i + 1],
            x,
        )
    }
}

/// Cubic Hermite basis on [x0, x1].
#[inline(always)]
fn hermite(x0: f64, x1: f64, y0: f64, y1: f64, d0: f64, d1: f64, x: f64) -> f64 {
    let h = x1 - x0;
    let t = (x - x0) / h;
    let t2 = t * t;
    let t3 = t2 * t;
    (2.0 * t3 - 3.0 * t2 + 1.0) * y0
        + (t3 - 2.0 * t2 + t) * h * d0
        + (-2.0 * t3 + 3.0 * t2) * y1
        + (t3 - t2) * h * d1
}

/// The interpolating polynomial in Newton form.
pub(crate) struct Newton {
    xs: Vec<f64>,
    coefficients: Vec<f64>,
}

impl Newton {
    pub(crate) fn new(xs: Vec<f64>, ys: Vec<f64>) -> Self {
        let n = xs.len();
        let mut coefficients = ys;
        for order in 1..n {
            for i in (order..n).rev() {
                coefficients[i] =
                    (coefficients[i] - coefficients[i - 1]) / (xs[i] - xs[i - order]);
            }
        }
        Self { xs, coefficients }
    }
}

impl Curve for Newton {
    fn at(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .zip(&self.xs)
            .rev()
            .fold(0.0, |acc, (&c, &xi)| acc * (x - xi) + c)
    }
}

/// The interpolating polynomial in barycentric form.
pub(crate) struct Barycentric {
    xs: Vec<f64>,
    ys: Vec<f64>,
    weights: Vec<f64>,
}

impl Barycentric {
    pub(crate) fn new(xs: Vec<f64>, ys: Vec<f64>) -> Self {
        let weights = xs
            .iter()
            .enumerate()
            .map(|(j, &xj)| {
                xs.iter()
                    .enumerate()
                    .filter(|&(k, _)| k != j)
                    .map(|(_, &xk)| xj - xk)
                    .product::<f64>()
                    .recip()
            })
            .collect();

        Self { xs, ys, weights }
    }
}

impl Curve for Barycentric {
    fn at(&self, x: f64) -> f64 {
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for ((&xj, &yj), &wj) in self.xs.iter().zip(&self.ys).zip(&self.weights) {
            let dx = x - xj;
            if dx == 0.0 {
                return yj;
            }
            numerator += wj / dx * yj;
            denominator += wj / dx;
        }
        numerator / denominator
    }
}
