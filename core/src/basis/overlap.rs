use std::collections::HashMap;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Overlap matrix elements between contracted basis functions. Only the upper
/// triangle (chi1 <= chi2) is stored, n (n + 1) / 2 entries for n functions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Overlap {
    pub chi1: Vec<usize>,
    pub chi2: Vec<usize>,
    pub coefficient: Vec<f64>,
}

impl Overlap {
    pub fn push(&mut self, chi1: usize, chi2: usize, coefficient: f64) {
        let (chi1, chi2) = if chi1 <= chi2 { (chi1, chi2) } else { (chi2, chi1) };
        self.chi1.push(chi1);
        self.chi2.push(chi2);
        self.coefficient.push(coefficient);
    }

    pub fn len(&self) -> usize {
        self.coefficient.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficient.is_empty()
    }

    /// Number of basis functions covered by the stored elements.
    pub fn basis_count(&self) -> usize {
        self.chi1
            .iter()
            .chain(&self.chi2)
            .max()
            .map_or(0, |&max| max + 1)
    }

    /// Reconstruct the full symmetric matrix. Elements may be stored in either
    /// orientation; those that were never stored are zero.
    pub fn square(&self) -> DMatrix<f64> {
        let n = self.basis_count();
        if self.len() != n * (n + 1) / 2 {
            log::warn!(
                "overlap holds {} elements, a full triangle of {n} functions has {}",
                self.len(),
                n * (n + 1) / 2
            );
        }

        let elements = self
            .chi1
            .iter()
            .zip(&self.chi2)
            .zip(&self.coefficient)
            .map(|((&i, &j), &value)| ((i.min(j), i.max(j)), value))
            .collect::<HashMap<_, _>>();

        symmetric_matrix(n, |i, j| elements.get(&(i, j)).copied().unwrap_or(0.0))
    }

    /// Store the upper triangle of a square matrix, row by row.
    pub fn from_square(matrix: &DMatrix<f64>) -> Result<Self> {
        if !matrix.is_square() {
            return Err(Error::InvalidArgument(format!(
                "overlap matrix must be square, got {}x{}",
                matrix.nrows(),
                matrix.ncols()
            )));
        }

        let n = matrix.nrows();
        let mut overlap = Self {
            chi1: Vec::with_capacity(n * (n + 1) / 2),
            chi2: Vec::with_capacity(n * (n + 1) / 2),
            coefficient: Vec::with_capacity(n * (n + 1) / 2),
        };
        for i in 0..n {
            for j in i..n {
                overlap.push(i, j, matrix[(i, j)]);
            }
        }
        Ok(overlap)
    }
}

/// Create a symmetric, square matrix. `func` is only called for the upper triangle.
#[inline(always)]
pub(crate) fn symmetric_matrix(n: usize, mut func: impl FnMut(usize, usize) -> f64) -> DMatrix<f64> {
    let m = DMatrix::from_fn(n, n, |i, j| if i <= j { func(i, j) } else { 0.0 });
    DMatrix::from_fn(n, n, |i, j| if i <= j { m[(i, j)] } else { m[(j, i)] })
}
