//! Molecular orbital coefficients and the fields built from them.
//!
//! An orbital is a linear combination of basis functions,
//!
//!   phi_o(r) = sum_chi C[chi, o] chi(r)
//!
//! so its field follows from the basis function fields without compiling
//! another expression.
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::{
    basis::BasisSetOrder,
    error::{Error, Result},
    field::FieldGrid,
};

/// Coefficients of basis function `chi` in orbital `orbital`, one row each.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MoMatrix {
    pub chi: Vec<usize>,
    pub orbital: Vec<usize>,
    pub coefficient: Vec<f64>,
    pub frame: Vec<usize>,
}

impl MoMatrix {
    /// anything less than this is considered zero
    const ZERO_CUTOFF: f64 = 1e-10;

    /// The non-zero elements of a (basis function x orbital) matrix.
    pub fn from_matrix(coefficients: &DMatrix<f64>, frame: usize) -> Self {
        let mut momatrix = Self::default();
        for (orbital, column) in coefficients.column_iter().enumerate() {
            for (chi, &coefficient) in column.iter().enumerate() {
                if coefficient.abs() > Self::ZERO_CUTOFF {
                    momatrix.push(chi, orbital, coefficient, frame);
                }
            }
        }
        momatrix
    }

    pub fn push(&mut self, chi: usize, orbital: usize, coefficient: f64, frame: usize) {
        self.chi.push(chi);
        self.orbital.push(orbital);
        self.coefficient.push(coefficient);
        self.frame.push(frame);
    }

    pub fn len(&self) -> usize {
        self.coefficient.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficient.is_empty()
    }

    fn rows(&self, frame: usize) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.chi
            .iter()
            .zip(&self.orbital)
            .zip(&self.coefficient)
            .zip(&self.frame)
            .filter(move |&(_, &f)| f == frame)
            .map(|(((&chi, &orbital), &coefficient), _)| (chi, orbital, coefficient))
    }

    /// Number of orbitals stored for `frame`.
    pub fn orbital_count(&self, frame: usize) -> usize {
        self.rows(frame).map(|(_, orbital, _)| orbital + 1).max().unwrap_or(0)
    }

    /// The dense (basis function x orbital) matrix of one frame. Fails if a
    /// row refers to a basis function at or beyond `basis_count`.
    pub fn square(&self, frame: usize, basis_count: usize) -> Result<DMatrix<f64>> {
        let mut matrix = DMatrix::zeros(basis_count, self.orbital_count(frame));
        for (chi, orbital, coefficient) in self.rows(frame) {
            if chi >= basis_count {
                return Err(Error::IndexOutOfRange {
                    index: chi,
                    len: basis_count,
                });
            }
            matrix[(chi, orbital)] += coefficient;
        }
        Ok(matrix)
    }

    /// Rows of `orbital` whose coefficient exceeds `tol` in magnitude, largest
    /// first.
    pub fn contributions(&self, orbital: usize, tol: f64, frame: usize) -> MoMatrix {
        let mut rows = self
            .rows(frame)
            .filter(|&(_, o, coefficient)| o == orbital && coefficient.abs() > tol)
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| b.2.abs().total_cmp(&a.2.abs()));

        let mut small = Self::default();
        for (chi, orbital, coefficient) in rows {
            small.push(chi, orbital, coefficient, frame);
        }
        small
    }
}

/// The basis functions that make up one orbital, joined with their place in
/// the basis set order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Contributions {
    pub chi: Vec<usize>,
    pub coefficient: Vec<f64>,
    pub symbol: Vec<String>,
    /// 1-based atom index
    pub center: Vec<usize>,
    /// (l, ml)
    pub kind: Vec<(u32, i32)>,
}

impl Contributions {
    pub fn join(small: &MoMatrix, order: &BasisSetOrder) -> Result<Self> {
        let mut joined = Self::default();
        for (&chi, &coefficient) in small.chi.iter().zip(&small.coefficient) {
            if chi >= order.len() {
                return Err(Error::IndexOutOfRange {
                    index: chi,
                    len: order.len(),
                });
            }
            joined.chi.push(chi);
            joined.coefficient.push(coefficient);
            joined.symbol.push(order.symbol[chi].clone());
            joined.center.push(order.center[chi]);
            joined.kind.push(order.kind[chi]);
        }
        Ok(joined)
    }

    pub fn len(&self) -> usize {
        self.chi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chi.is_empty()
    }
}

/// One field per orbital in `vector` (all orbitals if `None`), each the
/// coefficient-weighted sum of the basis function fields.
pub fn molecular_orbital_fields(
    basis_fields: &FieldGrid,
    momatrix: &MoMatrix,
    vector: Option<&[usize]>,
    frame: usize,
) -> Result<FieldGrid> {
    let coefficients = momatrix.square(frame, basis_fields.len())?;
    let all = (0..coefficients.ncols()).collect::<Vec<_>>();
    let vector = vector.unwrap_or(&all);

    let geometry = basis_fields.geometry(0)?;
    let mut orbitals = FieldGrid::default();
    for &orbital in vector {
        if orbital >= coefficients.ncols() {
            return Err(Error::IndexOutOfRange {
                index: orbital,
                len: coefficients.ncols(),
            });
        }

        let mut values = vec![0.0; geometry.point_count()];
        for (chi, &c) in coefficients.column(orbital).iter().enumerate() {
            if c == 0.0 {
                continue;
            }
            for (value, basis) in values.iter_mut().zip(basis_fields.values(chi)?) {
                *value += c * basis;
            }
        }

        let mut geometry = geometry.clone();
        geometry.label = format!("{}MO{orbital}", geometry.label);
        orbitals.push(geometry, values)?;
    }

    log::debug!("built {} orbital fields", orbitals.len());
    Ok(orbitals)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, Vector3};

    use super::*;
    use crate::field::FieldGeometry;

    fn geometry() -> FieldGeometry {
        FieldGeometry {
            nx: 2,
            ny: 1,
            nz: 2,
            origin: Vector3::zeros(),
            a: Vector3::new(0.5, 0.0, 0.0),
            b: Vector3::new(0.0, 0.5, 0.0),
            c: Vector3::new(0.0, 0.0, 0.5),
            frame: 0,
            label: String::new(),
        }
    }

    fn basis_fields() -> FieldGrid {
        let mut grid = FieldGrid::new(geometry(), vec![1.0, 0.0, 0.0, 1.0]).unwrap();
        grid.push(geometry(), vec![0.0, 1.0, 1.0, 0.0]).unwrap();
        grid
    }

    #[test]
    fn sparse_rows_from_a_matrix() {
        let c = DMatrix::from_row_slice(2, 2, &[0.6, 0.8, 0.0, -0.5]);
        let momatrix = MoMatrix::from_matrix(&c, 0);
        assert_eq!(momatrix.len(), 3);
        assert_eq!(momatrix.orbital_count(0), 2);
        assert_eq!(momatrix.orbital_count(1), 0);
        assert_eq!(momatrix.square(0, 2).unwrap(), c);
        assert!(matches!(
            momatrix.square(0, 1),
            Err(Error::IndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn orbital_fields_combine_basis_fields() {
        let c = DMatrix::from_row_slice(2, 2, &[0.6, 0.8, 0.8, -0.6]);
        let momatrix = MoMatrix::from_matrix(&c, 0);

        let mut orbitals = molecular_orbital_fields(&basis_fields(), &momatrix, None, 0).unwrap();
        assert_eq!(orbitals.len(), 2);
        assert_eq!(orbitals.values(0).unwrap(), &[0.6, 0.8, 0.8, 0.6]);
        assert_eq!(orbitals.values(1).unwrap(), &[0.8, -0.6, -0.6, 0.8]);
        assert_eq!(orbitals.geometry(1).unwrap().label, "MO1");

        // orthonormal coefficients keep the norms of orthonormal basis fields
        for norm in orbitals.integrate() {
            assert_relative_eq!(norm, 2.0 * 0.125, epsilon = 1e-12);
        }

        let second = molecular_orbital_fields(&basis_fields(), &momatrix, Some(&[1][..]), 0).unwrap();
        assert_eq!(second.len(), 1);
        assert!(molecular_orbital_fields(&basis_fields(), &momatrix, Some(&[2][..]), 0).is_err());
    }

    #[test]
    fn contributions_are_filtered_and_sorted() {
        let mut momatrix = MoMatrix::default();
        momatrix.push(0, 3, 0.05, 0);
        momatrix.push(1, 3, -0.7, 0);
        momatrix.push(2, 3, 0.4, 0);
        momatrix.push(2, 1, 0.9, 0);
        momatrix.push(2, 3, 0.9, 1);

        let small = momatrix.contributions(3, 0.1, 0);
        assert_eq!(small.chi, vec![1, 2]);
        assert_eq!(small.coefficient, vec![-0.7, 0.4]);

        let order = BasisSetOrder {
            shell_function: vec![0, 1, 2],
            symbol: vec!["O".to_owned(), "O".to_owned(), "H".to_owned()],
            center: vec![1, 1, 2],
            kind: vec![(0, 0), (1, -1), (0, 0)],
        };
        let joined = Contributions::join(&small, &order).unwrap();
        assert_eq!(joined.len(), 2);
        assert_eq!(joined.symbol, vec!["O", "H"]);
        assert_eq!(joined.kind, vec![(1, -1), (0, 0)]);

        let short = BasisSetOrder {
            shell_function: vec![0],
            symbol: vec!["O".to_owned()],
            center: vec![1],
            kind: vec![(0, 0)],
        };
        assert!(Contributions::join(&small, &short).is_err());
    }
}
