//! Resampling of scattered (x, y, z) samples onto a dense square grid.
//!
//! The samples are pivoted into a rectangular grid of z values, which is then
//! either interpolated as a surface or by applying a one dimensional scheme
//! along one axis and then the other. The two axis orders of the latter do
//! not commute in general and are both available through [`AxisOrder`].
mod curve;
mod savgol;
mod surface;

use std::{collections::BTreeMap, fmt, io::BufRead, str::FromStr};

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

pub use curve::Curve;
pub use savgol::savgol_filter;

use crate::error::{Error, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Method {
    /// tensor product cubic spline
    Bivariate,
    /// bilinear, nearest or cubic spline depending on [`Kind`]
    Interp2d,
    /// C1 bicubic surface through finite difference gradients
    Cloughtocher,
    /// linear on a triangulation of the grid
    Griddata,
    /// bilinear
    Regulargrid,
    Interp1d,
    Pchip,
    Krogh,
    Akima,
    Barycentric,
}

const METHODS: [(Method, &str); 10] = [
    (Method::Bivariate, "bivariate"),
    (Method::Interp2d, "interp2d"),
    (Method::Cloughtocher, "cloughtocher"),
    (Method::Griddata, "griddata"),
    (Method::Regulargrid, "regulargrid"),
    (Method::Interp1d, "interp1d"),
    (Method::Pchip, "pchip"),
    (Method::Krogh, "krogh"),
    (Method::Akima, "akima"),
    (Method::Barycentric, "barycentric"),
];

impl Method {
    pub fn name(self) -> &'static str {
        METHODS[self as usize].1
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        METHODS.iter().map(|&(_, name)| name)
    }

    /// Whether the scheme works along one axis at a time.
    pub fn is_one_dimensional(self) -> bool {
        matches!(
            self,
            Method::Interp1d | Method::Pchip | Method::Krogh | Method::Akima | Method::Barycentric
        )
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        METHODS
            .iter()
            .find(|&&(_, name)| name == s)
            .map(|&(method, _)| method)
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "unsupported interpolation method {s:?}, expected one of {}",
                    Method::names().collect::<Vec<_>>().join(", ")
                ))
            })
    }
}

impl TryFrom<String> for Method {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Method> for String {
    fn from(value: Method) -> Self {
        value.name().to_owned()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Flavour of `interp1d` and `interp2d`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Linear,
    Nearest,
    #[default]
    Cubic,
}

impl FromStr for Kind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear" => Ok(Kind::Linear),
            "nearest" => Ok(Kind::Nearest),
            "cubic" => Ok(Kind::Cubic),
            _ => Err(Error::InvalidArgument(format!(
                "unsupported kind {s:?}, expected one of linear, nearest, cubic"
            ))),
        }
    }
}

/// Which axis the one dimensional schemes run along first.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AxisOrder {
    #[default]
    XFirst,
    YFirst,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub method: Method,
    pub kind: Kind,
    pub order: AxisOrder,
    /// points per axis of the output grid
    pub dim: usize,
    /// also trace the minimum along y of every output column
    pub minimum: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            method: Method::Interp2d,
            kind: Kind::Cubic,
            order: AxisOrder::XFirst,
            dim: 21,
            minimum: false,
        }
    }
}

/// Named columns of equal length.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Samples {
    columns: BTreeMap<String, Vec<f64>>,
}

impl Samples {
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.columns.insert(name.into(), values);
        self
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Whitespace separated columns under a header line of column names.
    pub fn parse(reader: impl BufRead) -> Result<Self> {
        let mut lines = reader
            .lines()
            .enumerate()
            .filter(|(_, line)| line.as_ref().map_or(true, |line| !line.trim().is_empty()));

        let Some((_, header)) = lines.next() else {
            return Ok(Self::default());
        };
        let names = header?
            .split_whitespace()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        let mut values = vec![Vec::new(); names.len()];

        for (index, line) in lines {
            let line = line?;
            let fields = line.split_whitespace().collect::<Vec<_>>();
            if fields.len() != names.len() {
                return Err(Error::Parse {
                    line: index + 1,
                    message: format!("expected {} columns, found {}", names.len(), fields.len()),
                });
            }
            for (column, field) in values.iter_mut().zip(fields) {
                column.push(field.parse::<f64>().map_err(|e| Error::Parse {
                    line: index + 1,
                    message: format!("{field:?}: {e}"),
                })?);
            }
        }

        Ok(Self {
            columns: names.into_iter().zip(values).collect(),
        })
    }

    /// Arrange the samples on the rectangular grid spanned by the distinct
    /// values of the `x` and `y` columns.
    pub fn pivot(&self, x: &str, y: &str, z: &str) -> Result<Pivot> {
        let (xs, ys, zs) = self.columns3(x, y, z)?;

        let xdat = distinct(xs);
        let ydat = distinct(ys);
        if xdat.len() < 2 || ydat.len() < 2 {
            return Err(Error::InvalidArgument(format!(
                "samples span {} distinct {x} and {} distinct {y} values, at least two of each are needed",
                xdat.len(),
                ydat.len()
            )));
        }

        let mut grid = DMatrix::from_element(xdat.len(), ydat.len(), f64::NAN);
        for ((&xv, &yv), &zv) in xs.iter().zip(ys).zip(zs) {
            // NaN marks holes in the grid below
            if !(xv.is_finite() && yv.is_finite() && zv.is_finite()) {
                return Err(Error::InvalidArgument(format!(
                    "sample ({xv}, {yv}, {zv}) is not finite"
                )));
            }
            let i = position(&xdat, xv);
            let j = position(&ydat, yv);
            if !grid[(i, j)].is_nan() {
                return Err(Error::InvalidArgument(format!(
                    "more than one sample at ({xv}, {yv})"
                )));
            }
            grid[(i, j)] = zv;
        }

        if let Some(index) = grid.iter().position(|v| v.is_nan()) {
            // column major storage
            let (i, j) = (index % xdat.len(), index / xdat.len());
            return Err(Error::InvalidArgument(format!(
                "no sample at ({}, {})",
                xdat[i], ydat[j]
            )));
        }

        Ok(Pivot {
            x: xdat,
            y: ydat,
            z: grid,
        })
    }

    fn columns3(&self, x: &str, y: &str, z: &str) -> Result<(&[f64], &[f64], &[f64])> {
        match (self.column(x), self.column(y), self.column(z)) {
            (Some(xs), Some(ys), Some(zs)) if xs.len() == ys.len() && ys.len() == zs.len() => {
                Ok((xs, ys, zs))
            }
            (Some(_), Some(_), Some(_)) => Err(Error::InvalidArgument(format!(
                "columns {x:?}, {y:?} and {z:?} differ in length"
            ))),
            _ => {
                let missing = [x, y, z]
                    .into_iter()
                    .filter(|name| self.column(name).is_none())
                    .collect::<Vec<_>>();
                Err(Error::InvalidArgument(format!(
                    "{x:?}, {y:?} and {z:?} must all be sample columns, missing {missing:?}"
                )))
            }
        }
    }
}

fn distinct(values: &[f64]) -> Vec<f64> {
    let mut values = values.to_vec();
    values.sort_by(f64::total_cmp);
    values.dedup();
    values
}

fn position(sorted: &[f64], value: f64) -> usize {
    sorted.partition_point(|&v| v < value)
}

/// Samples on a rectangular grid: `z[(i, j)]` is the value at `(x[i], y[j])`.
#[derive(Clone, Debug, PartialEq)]
pub struct Pivot {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: DMatrix<f64>,
}

/// The minimum along y of every output column.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Minima {
    pub x: Vec<f64>,
    /// smoothed
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Interpolated {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// `z[(iy, ix)]` is the value at `(x[ix], y[iy])`
    pub z: DMatrix<f64>,
    pub minima: Option<Minima>,
}

/// Resample the `columns` = [x, y, z] of `samples` on a `dim` x `dim` grid
/// spanning the same ranges.
pub fn interpolate(samples: &Samples, columns: [&str; 3], options: &Options) -> Result<Interpolated> {
    let [x, y, z] = columns;
    let pivot = samples.pivot(x, y, z)?;
    if options.dim < 2 {
        return Err(Error::InvalidArgument(format!(
            "output grid needs at least two points per axis, got {}",
            options.dim
        )));
    }

    let newx = linspace(pivot.x[0], pivot.x[pivot.x.len() - 1], options.dim);
    let newy = linspace(pivot.y[0], pivot.y[pivot.y.len() - 1], options.dim);
    log::debug!(
        "interpolating a {}x{} grid onto {dim}x{dim} with {}",
        pivot.x.len(),
        pivot.y.len(),
        options.method,
        dim = options.dim
    );

    let newz = if options.method.is_one_dimensional() {
        separable(options.method, options.kind, options.order, &pivot, &newx, &newy)?
    } else {
        surface::resample(options.method, options.kind, &pivot, &newx, &newy)?
    };

    let minima = options
        .minimum
        .then(|| minima(&newx, &newy, &newz))
        .transpose()?;

    Ok(Interpolated {
        x: newx,
        y: newy,
        z: newz,
        minima,
    })
}

/// [`interpolate`] over the alpha, gamma and j2 columns.
pub fn interpolate_j2(samples: &Samples, options: &Options) -> Result<J2Surface> {
    let Interpolated { x, y, z, minima } = interpolate(samples, ["alpha", "gamma", "j2"], options)?;
    Ok(J2Surface {
        alpha: x,
        gamma: y,
        j2: z,
        minima,
    })
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct J2Surface {
    pub alpha: Vec<f64>,
    pub gamma: Vec<f64>,
    pub j2: DMatrix<f64>,
    pub minima: Option<Minima>,
}

/// Apply a one dimensional scheme along one axis, then along the other.
pub(crate) fn separable(
    method: Method,
    kind: Kind,
    order: AxisOrder,
    pivot: &Pivot,
    newx: &[f64],
    newy: &[f64],
) -> Result<DMatrix<f64>> {
    let (nx, ny) = pivot.z.shape();
    let mut newz = DMatrix::zeros(newy.len(), newx.len());

    match order {
        AxisOrder::XFirst => {
            // partial[(j, ix)]: along x at every y sample
            let mut partial = DMatrix::zeros(ny, newx.len());
            for j in 0..ny {
                let column = pivot.z.column(j).iter().copied().collect::<Vec<_>>();
                let curve = curve::fit(method, kind, &pivot.x, &column)?;
                for (ix, value) in curve.sample(newx).into_iter().enumerate() {
                    partial[(j, ix)] = value;
                }
            }
            for ix in 0..newx.len() {
                let column = partial.column(ix).iter().copied().collect::<Vec<_>>();
                let curve = curve::fit(method, kind, &pivot.y, &column)?;
                for (iy, value) in curve.sample(newy).into_iter().enumerate() {
                    newz[(iy, ix)] = value;
                }
            }
        }
        AxisOrder::YFirst => {
            // partial[(i, iy)]: along y at every x sample
            let mut partial = DMatrix::zeros(nx, newy.len());
            for i in 0..nx {
                let row = pivot.z.row(i).iter().copied().collect::<Vec<_>>();
                let curve = curve::fit(method, kind, &pivot.y, &row)?;
                for (iy, value) in curve.sample(newy).into_iter().enumerate() {
                    partial[(i, iy)] = value;
                }
            }
            for iy in 0..newy.len() {
                let column = partial.column(iy).iter().copied().collect::<Vec<_>>();
                let curve = curve::fit(method, kind, &pivot.x, &column)?;
                for (ix, value) in curve.sample(newx).into_iter().enumerate() {
                    newz[(iy, ix)] = value;
                }
            }
        }
    }

    Ok(newz)
}

/// Lowest point of every x column, with the y positions smoothed.
fn minima(newx: &[f64], newy: &[f64], newz: &DMatrix<f64>) -> Result<Minima> {
    let dim = newx.len();
    let mut minima = Minima::default();
    for (ix, &x) in newx.iter().enumerate() {
        let column = newz.column(ix);
        if let Some(iy) = column.iter().position(|z| !z.is_finite()) {
            return Err(Error::InvalidArgument(format!(
                "interpolated value at ({x}, {}) is not finite",
                newy[iy]
            )));
        }
        let (iy, z) = column
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::INFINITY), |best, (iy, z)| if z < best.1 { (iy, z) } else { best });
        minima.x.push(x);
        minima.y.push(newy[iy]);
        minima.z.push(z);
    }

    let window = if dim % 2 == 0 { dim - 1 } else { dim };
    minima.y = savgol_filter(&minima.y, window, 3)?;
    Ok(minima)
}

/// `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut values = (0..n).map(|i| start + step * i as f64).collect::<Vec<_>>();
            values[n - 1] = end;
            values
        }
    }
}

/// Index i of the interval [xs[i], xs[i + 1]] holding `x`, clamped to the
/// first and last interval outside the samples.
#[inline]
pub(crate) fn segment(xs: &[f64], x: f64) -> usize {
    xs.partition_point(|&v| v <= x)
        .saturating_sub(1)
        .min(xs.len() - 2)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    /// a shuffled 5 x 4 grid of f(alpha, gamma)
    fn samples(f: impl Fn(f64, f64) -> f64) -> Samples {
        let mut rows = itertools::iproduct!([0.0, 0.5, 1.0, 1.5, 2.0], [0.0, 1.0, 2.0, 3.0])
            .collect::<Vec<_>>();
        rows.reverse();
        rows.swap(3, 11);

        let alpha = rows.iter().map(|r| r.0).collect::<Vec<_>>();
        let gamma = rows.iter().map(|r| r.1).collect::<Vec<_>>();
        let j2 = rows.iter().map(|&(a, g)| f(a, g)).collect::<Vec<_>>();
        Samples::default()
            .with_column("alpha", alpha)
            .with_column("gamma", gamma)
            .with_column("j2", j2)
    }

    #[test]
    fn unknown_method_lists_the_supported_ones() {
        let error = "bogus".parse::<Method>().unwrap_err();
        let message = error.to_string();
        for name in Method::names() {
            assert!(message.contains(name), "{message}");
        }
        assert_eq!("akima".parse::<Method>().unwrap(), Method::Akima);
        assert_eq!(Method::Cloughtocher.to_string(), "cloughtocher");
    }

    #[test]
    fn missing_columns_are_named() {
        let samples = Samples::default()
            .with_column("x", vec![0.0, 1.0])
            .with_column("y", vec![0.0, 1.0]);
        let error = interpolate(&samples, ["x", "y", "z"], &Options::default()).unwrap_err();
        assert!(matches!(error, Error::InvalidArgument(_)));
        let message = error.to_string();
        assert!(message.contains(r#""x", "y" and "z""#), "{message}");
        assert!(message.contains(r#"missing ["z"]"#), "{message}");
    }

    #[test]
    fn pivot_sorts_and_checks_holes() {
        let pivot = samples(|a, g| a + 10.0 * g).pivot("alpha", "gamma", "j2").unwrap();
        assert_eq!(pivot.x, vec![0.0, 0.5, 1.0, 1.5, 2.0]);
        assert_eq!(pivot.y, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(pivot.z[(3, 2)], 21.5);

        let holey = Samples::default()
            .with_column("x", vec![0.0, 1.0, 0.0])
            .with_column("y", vec![0.0, 0.0, 1.0])
            .with_column("z", vec![1.0, 2.0, 3.0]);
        assert!(holey.pivot("x", "y", "z").is_err());

        let mut j2 = samples(|a, g| a + g).column("j2").unwrap().to_vec();
        j2[7] = f64::NAN;
        let nan = samples(|a, g| a + g).with_column("j2", j2);
        let error = nan.pivot("alpha", "gamma", "j2").unwrap_err();
        assert!(error.to_string().contains("not finite"), "{error}");
    }

    #[test]
    fn every_method_reproduces_a_plane() {
        let plane = |a: f64, g: f64| 2.0 * a - 0.5 * g + 3.0;
        let samples = samples(plane);

        for method in METHODS.map(|(method, _)| method) {
            for order in [AxisOrder::XFirst, AxisOrder::YFirst] {
                let options = Options {
                    method,
                    kind: Kind::Linear,
                    order,
                    dim: 9,
                    minimum: false,
                };
                let out = interpolate_j2(&samples, &options).unwrap();
                assert_eq!(out.j2.shape(), (9, 9));
                assert_eq!(out.alpha[8], 2.0);
                assert_eq!(out.gamma[8], 3.0);
                for (iy, &g) in out.gamma.iter().enumerate() {
                    for (ix, &a) in out.alpha.iter().enumerate() {
                        assert_relative_eq!(out.j2[(iy, ix)], plane(a, g), epsilon = 1e-9);
                    }
                }
                assert!(out.minima.is_none());
            }
        }
    }

    #[test]
    fn axis_orders_agree_for_linear_schemes() {
        let samples = samples(|a, g| (a * g).sin() + a);
        let run = |order| {
            let options = Options {
                method: Method::Interp1d,
                kind: Kind::Linear,
                order,
                dim: 7,
                minimum: false,
            };
            interpolate(&samples, ["alpha", "gamma", "j2"], &options).unwrap().z
        };
        // piecewise linear along each axis is bilinear either way
        let (x_first, y_first) = (run(AxisOrder::XFirst), run(AxisOrder::YFirst));
        for (a, b) in x_first.iter().zip(y_first.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn minima_follow_the_valley() {
        let valley = |a: f64, g: f64| (g - 1.0).powi(2) + a;
        let samples = samples(valley);
        let options = Options {
            method: Method::Regulargrid,
            dim: 7,
            minimum: true,
            ..Options::default()
        };

        let out = interpolate_j2(&samples, &options).unwrap();
        let minima = out.minima.unwrap();
        assert_eq!(minima.x, out.alpha);
        for ((&y, &z), &a) in minima.y.iter().zip(&minima.z).zip(&out.alpha) {
            assert_relative_eq!(y, 1.0, epsilon = 1e-9);
            assert_relative_eq!(z, a, epsilon = 1e-9);
        }
    }

    #[test]
    fn too_small_outputs_are_rejected() {
        let samples = samples(|a, g| a + g);
        let options = Options {
            dim: 4,
            minimum: true,
            method: Method::Griddata,
            ..Options::default()
        };
        // a window of 3 cannot hold a cubic
        assert!(interpolate_j2(&samples, &options).is_err());

        let options = Options { dim: 1, ..Options::default() };
        assert!(interpolate_j2(&samples, &options).is_err());
    }

    #[test]
    fn parses_whitespace_columns() {
        let text = "alpha gamma j2\n0.0 0.0 1.5\n\n1.0 0.0 2.5\n";
        let samples = Samples::parse(text.as_bytes()).unwrap();
        assert_eq!(samples.names().collect::<Vec<_>>(), vec!["alpha", "gamma", "j2"]);
        assert_eq!(samples.column("j2"), Some(&[1.5, 2.5][..]));

        let error = Samples::parse("a b\n1.0\n".as_bytes()).unwrap_err();
        assert!(matches!(error, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn segments_clamp() {
        let xs = [0.0, 1.0, 2.0];
        assert_eq!(segment(&xs, -1.0), 0);
        assert_eq!(segment(&xs, 0.5), 0);
        assert_eq!(segment(&xs, 1.0), 1);
        assert_eq!(segment(&xs, 2.0), 1);
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }
}
