//! Schemes that interpolate the pivoted grid as a surface.
use nalgebra::DMatrix;

use super::{segment, separable, AxisOrder, Kind, Method, Pivot};
use crate::error::{Error, Result};

/// Resample `pivot` at every (newx, newy) pair; the result is indexed [y][x].
pub(crate) fn resample(
    method: Method,
    kind: Kind,
    pivot: &Pivot,
    newx: &[f64],
    newy: &[f64],
) -> Result<DMatrix<f64>> {
    let pointwise = |f: &dyn Fn(&Pivot, f64, f64) -> f64| {
        DMatrix::from_fn(newy.len(), newx.len(), |iy, ix| f(pivot, newx[ix], newy[iy]))
    };

    match (method, kind) {
        (Method::Bivariate, _) | (Method::Interp2d, Kind::Cubic) => separable(
            Method::Interp1d,
            Kind::Cubic,
            AxisOrder::XFirst,
            pivot,
            newx,
            newy,
        ),
        (Method::Interp2d, Kind::Linear) | (Method::Regulargrid, _) => Ok(pointwise(&bilinear)),
        (Method::Interp2d, Kind::Nearest) => Ok(pointwise(&nearest)),
        (Method::Griddata, _) => Ok(pointwise(&triangulated)),
        (Method::Cloughtocher, _) => {
            let gradients = Gradients::new(pivot);
            Ok(pointwise(&|pivot, x, y| gradients.at(pivot, x, y)))
        }
        (other, _) => Err(Error::InvalidArgument(format!(
            "{other} is not a two dimensional scheme"
        ))),
    }
}

/// Cell containing (x, y) and the local coordinates within it.
fn cell(pivot: &Pivot, x: f64, y: f64) -> (usize, usize, f64, f64) {
    let i = segment(&pivot.x, x);
    let j = segment(&pivot.y, y);
    let t = (x - pivot.x[i]) / (pivot.x[i + 1] - pivot.x[i]);
    let u = (y - pivot.y[j]) / (pivot.y[j + 1] - pivot.y[j]);
    (i, j, t, u)
}

fn bilinear(pivot: &Pivot, x: f64, y: f64) -> f64 {
    let (i, j, t, u) = cell(pivot, x, y);
    let z = &pivot.z;
    (1.0 - t) * (1.0 - u) * z[(i, j)]
        + t * (1.0 - u) * z[(i + 1, j)]
        + (1.0 - t) * u * z[(i, j + 1)]
        + t * u * z[(i + 1, j + 1)]
}

fn nearest(pivot: &Pivot, x: f64, y: f64) -> f64 {
    let (i, j, t, u) = cell(pivot, x, y);
    let i = if t <= 0.5 { i } else { i + 1 };
    let j = if u <= 0.5 { j } else { j + 1 };
    pivot.z[(i, j)]
}

/// Linear on the two triangles each cell splits into along its (0, 0) - (1, 1)
/// diagonal.
fn triangulated(pivot: &Pivot, x: f64, y: f64) -> f64 {
    let (i, j, t, u) = cell(pivot, x, y);
    let z = &pivot.z;
    let (z00, z10, z01, z11) = (z[(i, j)], z[(i + 1, j)], z[(i, j + 1)], z[(i + 1, j + 1)]);
    if t >= u {
        z00 + t * (z10 - z00) + u * (z11 - z10)
    } else {
        z00 + u * (z01 - z00) + t * (z11 - z01)
    }
}

/// Derivative estimates at every node, for a C1 bicubic Hermite surface.
struct Gradients {
    dx: DMatrix<f64>,
    dy: DMatrix<f64>,
    dxy: DMatrix<f64>,
}

impl Gradients {
    fn new(pivot: &Pivot) -> Self {
        let (nx, ny) = pivot.z.shape();
        let dx = DMatrix::from_fn(nx, ny, |i, j| {
            difference(&pivot.x, i, |i| pivot.z[(i, j)])
        });
        let dy = DMatrix::from_fn(nx, ny, |i, j| {
            difference(&pivot.y, j, |j| pivot.z[(i, j)])
        });
        let dxy = DMatrix::from_fn(nx, ny, |i, j| difference(&pivot.x, i, |i| dy[(i, j)]));
        Self { dx, dy, dxy }
    }

    fn at(&self, pivot: &Pivot, x: f64, y: f64) -> f64 {
        let (i, j, t, u) = cell(pivot, x, y);
        let hx = pivot.x[i + 1] - pivot.x[i];
        let hy = pivot.y[j + 1] - pivot.y[j];

        // value and derivative weights of the two ends, per direction
        let weights = |s: f64, h: f64| {
            let s2 = s * s;
            let s3 = s2 * s;
            (
                [2.0 * s3 - 3.0 * s2 + 1.0, -2.0 * s3 + 3.0 * s2],
                [(s3 - 2.0 * s2 + s) * h, (s3 - s2) * h],
            )
        };
        let (vx, gx) = weights(t, hx);
        let (vy, gy) = weights(u, hy);

        let mut total = 0.0;
        for (a, b) in itertools::iproduct!(0..2, 0..2) {
            let node = (i + a, j + b);
            total += vx[a] * vy[b] * pivot.z[node]
                + gx[a] * vy[b] * self.dx[node]
                + vx[a] * gy[b] * self.dy[node]
                + gx[a] * gy[b] * self.dxy[node];
        }
        total
    }
}

/// Centered difference inside, one sided at the ends.
fn difference(axis: &[f64], i: usize, value: impl Fn(usize) -> f64) -> f64 {
    let last = axis.len() - 1;
    let (lo, hi) = (i.saturating_sub(1), (i + 1).min(last));
    (value(hi) - value(lo)) / (axis[hi] - axis[lo])
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    use super::*;

    fn pivot(f: impl Fn(f64, f64) -> f64) -> Pivot {
        let x = vec![0.0, 1.0, 2.5, 3.0];
        let y = vec![-1.0, 0.0, 1.0];
        let z = DMatrix::from_fn(x.len(), y.len(), |i, j| f(x[i], y[j]));
        Pivot { x, y, z }
    }

    #[test]
    fn planes_are_reproduced() {
        let plane = |x: f64, y: f64| 0.5 * x - 2.0 * y + 1.0;
        let pivot = pivot(plane);
        let newx = [0.0, 0.7, 1.9, 3.0];
        let newy = [-1.0, -0.2, 0.6];

        for (method, kind) in [
            (Method::Bivariate, Kind::Cubic),
            (Method::Interp2d, Kind::Linear),
            (Method::Interp2d, Kind::Cubic),
            (Method::Regulargrid, Kind::Cubic),
            (Method::Griddata, Kind::Cubic),
            (Method::Cloughtocher, Kind::Cubic),
        ] {
            let z = resample(method, kind, &pivot, &newx, &newy).unwrap();
            assert_eq!(z.shape(), (3, 4));
            for (iy, &y) in newy.iter().enumerate() {
                for (ix, &x) in newx.iter().enumerate() {
                    assert_relative_eq!(z[(iy, ix)], plane(x, y), epsilon = 1e-10);
                }
            }
        }
    }

    #[test]
    fn bilinear_handles_cross_terms() {
        let saddle = |x: f64, y: f64| x * y;
        let pivot = pivot(saddle);
        let z = resample(Method::Regulargrid, Kind::Linear, &pivot, &[0.4, 2.8], &[0.3]).unwrap();
        assert_relative_eq!(z[(0, 0)], 0.12, epsilon = 1e-12);
        assert_relative_eq!(z[(0, 1)], 0.84, epsilon = 1e-12);
    }

    #[test]
    fn nearest_picks_grid_values() {
        let pivot = pivot(|x, y| 10.0 * x + y);
        let z = resample(Method::Interp2d, Kind::Nearest, &pivot, &[0.4, 2.9], &[0.6]).unwrap();
        assert_eq!(z[(0, 0)], 1.0);
        assert_eq!(z[(0, 1)], 31.0);
    }

    #[test]
    fn one_dimensional_methods_are_rejected() {
        let pivot = pivot(|x, _| x);
        assert!(resample(Method::Pchip, Kind::Linear, &pivot, &[0.0], &[0.0]).is_err());
    }
}
