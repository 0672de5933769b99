//! Scalar fields sampled on parallelepiped grids, following the cube file
//! convention: an origin, three voxel vectors and nx * ny * nz values with x
//! varying slowest and z fastest.
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    expr::{Axis, Program},
    geometry::parallelepiped_volume,
};

/// Where the samples of one field sit in space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldGeometry {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub origin: Vector3<f64>,
    /// voxel vector along the first grid index (dxi, dxj, dxk)
    pub a: Vector3<f64>,
    /// (dyi, dyj, dyk)
    pub b: Vector3<f64>,
    /// (dzi, dzj, dzk)
    pub c: Vector3<f64>,
    pub frame: usize,
    pub label: String,
}

impl FieldGeometry {
    pub fn point_count(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// Volume of one voxel.
    pub fn dv(&self) -> f64 {
        parallelepiped_volume(&self.a, &self.b, &self.c)
    }

    pub fn validate(&self) -> Result<()> {
        if self.point_count() == 0 {
            return Err(Error::InvalidGeometry(format!(
                "field {:?} has dimensions {}x{}x{}",
                self.label, self.nx, self.ny, self.nz
            )));
        }
        if self.dv() <= 1e-12 * self.a.norm() * self.b.norm() * self.c.norm() {
            return Err(Error::InvalidGeometry(format!(
                "voxel vectors of field {:?} are linearly dependent",
                self.label
            )));
        }
        Ok(())
    }

    /// origin + i a + j b + k c for every sample, x slowest and z fastest.
    pub fn points(&self) -> Vec<Vector3<f64>> {
        let mut points = Vec::with_capacity(self.point_count());
        for (i, j, k) in itertools::iproduct!(0..self.nx, 0..self.ny, 0..self.nz) {
            points.push(self.origin + self.a * i as f64 + self.b * j as f64 + self.c * k as f64);
        }
        points
    }
}

/// Parameters for a programmatically generated rectangular grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldParams {
    /// (min, max, n) per axis
    pub axes: [(f64, f64, usize); 3],
    /// number of identical fields to make
    pub nrfps: usize,
    pub frame: usize,
    pub label: String,
}

impl FieldParams {
    /// The same range on every axis.
    pub fn cube(rmin: f64, rmax: f64, nr: usize) -> Self {
        Self {
            axes: [(rmin, rmax, nr); 3],
            nrfps: 1,
            frame: 0,
            label: String::new(),
        }
    }

    pub fn with_axis(mut self, axis: Axis, min: f64, max: f64, n: usize) -> Self {
        self.axes[axis.index()] = (min, max, n);
        self
    }

    pub fn with_copies(self, nrfps: usize) -> Self {
        Self { nrfps, ..self }
    }

    /// Samples start at `min` and are spaced (max - min) / n apart.
    pub fn geometry(&self) -> Result<FieldGeometry> {
        for (axis, &(min, max, n)) in Axis::ALL.iter().zip(&self.axes) {
            if n == 0 || !(max > min) {
                return Err(Error::InvalidGeometry(format!(
                    "{} axis from {min} to {max} with {n} points",
                    axis.name()
                )));
            }
        }

        let [(xmin, xmax, nx), (ymin, ymax, ny), (zmin, zmax, nz)] = self.axes;
        Ok(FieldGeometry {
            nx,
            ny,
            nz,
            origin: Vector3::new(xmin, ymin, zmin),
            a: Vector3::new((xmax - xmin) / nx as f64, 0.0, 0.0),
            b: Vector3::new(0.0, (ymax - ymin) / ny as f64, 0.0),
            c: Vector3::new(0.0, 0.0, (zmax - zmin) / nz as f64),
            frame: self.frame,
            label: self.label.clone(),
        })
    }
}

/// Any number of fields, each with its own geometry and values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldGrid {
    geometry: Vec<FieldGeometry>,
    values: Vec<Vec<f64>>,
    /// volume element of every field, once computed
    dv: Option<Vec<f64>>,
}

impl FieldGrid {
    pub fn new(geometry: FieldGeometry, values: Vec<f64>) -> Result<Self> {
        let mut grid = Self::default();
        grid.push(geometry, values)?;
        Ok(grid)
    }

    /// `nrfps` zero-valued fields laid out by `params`.
    pub fn from_params(params: &FieldParams) -> Result<Self> {
        let geometry = params.geometry()?;
        let mut grid = Self::default();
        for _ in 0..params.nrfps {
            let values = vec![0.0; geometry.point_count()];
            grid.push(geometry.clone(), values)?;
        }
        Ok(grid)
    }

    /// One field per program, each evaluated at every point of the grid
    /// described by `params`.
    pub fn evaluate<'a>(
        programs: impl IntoIterator<Item = &'a Program>,
        params: &FieldParams,
    ) -> Result<Self> {
        let geometry = params.geometry()?;
        let points = geometry.points();
        log::debug!(
            "evaluating on a {}x{}x{} grid",
            geometry.nx,
            geometry.ny,
            geometry.nz
        );

        let mut grid = Self::default();
        for program in programs {
            grid.push(geometry.clone(), program.eval_many(&points))?;
        }
        Ok(grid)
    }

    /// Append a field. Fails if the geometry is degenerate or the values do
    /// not cover it exactly.
    pub fn push(&mut self, geometry: FieldGeometry, values: Vec<f64>) -> Result<()> {
        geometry.validate()?;
        if values.len() != geometry.point_count() {
            return Err(Error::InvalidGeometry(format!(
                "field {:?} has {} values for {} grid points",
                geometry.label,
                values.len(),
                geometry.point_count()
            )));
        }

        if let Some(dv) = &mut self.dv {
            dv.push(geometry.dv());
        }
        self.geometry.push(geometry);
        self.values.push(values);
        Ok(())
    }

    pub fn extend(&mut self, other: FieldGrid) -> Result<()> {
        for (geometry, values) in other.geometry.into_iter().zip(other.values) {
            self.push(geometry, values)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn geometry(&self, field: usize) -> Result<&FieldGeometry> {
        self.geometry.get(field).ok_or(Error::IndexOutOfRange {
            index: field,
            len: self.len(),
        })
    }

    pub fn values(&self, field: usize) -> Result<&[f64]> {
        self.values
            .get(field)
            .map(Vec::as_slice)
            .ok_or(Error::IndexOutOfRange {
                index: field,
                len: self.len(),
            })
    }

    pub fn points(&self, field: usize) -> Result<Vec<Vector3<f64>>> {
        Ok(self.geometry(field)?.points())
    }

    /// The volume elements, if they have been computed.
    pub fn volume_elements(&self) -> Option<&[f64]> {
        self.dv.as_deref()
    }

    /// Compute |a . (b x c)| for every field, replacing earlier results.
    pub fn compute_volume_element(&mut self) -> &[f64] {
        let dv = self.geometry.iter().map(FieldGeometry::dv).collect();
        self.dv.insert(dv)
    }

    /// dv * sum(v^2) for every field; 1 for a normalized orbital.
    pub fn integrate(&mut self) -> Vec<f64> {
        if self.dv.is_none() {
            self.compute_volume_element();
        }

        let dv = self.dv.as_deref().unwrap_or_default();
        dv.iter()
            .zip(&self.values)
            .map(|(dv, values)| dv * values.iter().map(|v| v * v).sum::<f64>())
            .collect()
    }

    /// A new grid holding the single field cos(angle) A + sin(angle) B, laid
    /// out like A.
    pub fn rotate(&self, a: usize, b: usize, angle: f64) -> Result<FieldGrid> {
        let (fa, fb) = (self.values(a)?, self.values(b)?);
        if fa.len() != fb.len() {
            return Err(Error::InvalidGeometry(format!(
                "cannot mix fields of {} and {} points",
                fa.len(),
                fb.len()
            )));
        }

        let (sin, cos) = angle.sin_cos();
        let values = fa
            .iter()
            .zip(fb)
            .map(|(va, vb)| cos * va + sin * vb)
            .collect();

        FieldGrid::new(self.geometry[a].clone(), values)
    }
}
