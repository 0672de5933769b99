use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{
    atom::AtomTable,
    error::{Error, Result},
    geometry::magnitude,
};

/// The names of the cell vector components, for error messages.
const CELL_COLUMNS: [&str; 9] = ["xi", "xj", "xk", "yi", "yj", "yk", "zi", "zj", "zk"];

/// Cell vectors of every frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitCell {
    pub x: Vec<Vector3<f64>>,
    pub y: Vec<Vector3<f64>>,
    pub z: Vec<Vector3<f64>>,
}

/// Lengths of the cell vectors of every frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CellMagnitudes {
    pub rx: Vec<f64>,
    pub ry: Vec<f64>,
    pub rz: Vec<f64>,
}

/// Per frame state. Everything but the atom count is optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameTable {
    pub atom_count: Vec<usize>,
    pub periodic: Option<Vec<bool>>,
    pub cell: Option<UnitCell>,
    /// cell origin (ox, oy, oz)
    pub origin: Option<Vec<Vector3<f64>>>,
    pub magnitudes: Option<CellMagnitudes>,
}

impl FrameTable {
    /// Only the number of atoms of each frame.
    pub fn minimal(atoms: &AtomTable) -> Self {
        let mut atom_count = vec![0; atoms.frame_count()];
        for &frame in &atoms.frame {
            atom_count[frame] += 1;
        }

        Self {
            atom_count,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.atom_count.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atom_count.is_empty()
    }

    /// |x|, |y| and |z| of every frame's cell.
    pub fn unit_cell_magnitudes(&self) -> Result<CellMagnitudes> {
        let cell = self
            .cell
            .as_ref()
            .ok_or_else(|| Error::missing_columns("Frame", CELL_COLUMNS))?;

        let lengths = |vectors: &[Vector3<f64>]| -> Vec<f64> { vectors.iter().map(magnitude).collect() };
        Ok(CellMagnitudes {
            rx: lengths(&cell.x),
            ry: lengths(&cell.y),
            rz: lengths(&cell.z),
        })
    }

    /// Store the cell magnitudes in the table.
    pub fn compute_unit_cell_magnitudes(&mut self) -> Result<&CellMagnitudes> {
        let magnitudes = self.unit_cell_magnitudes()?;
        Ok(self.magnitudes.insert(magnitudes))
    }

    pub fn is_periodic(&self) -> bool {
        self.periodic
            .as_ref()
            .map_or(false, |periodic| periodic.iter().any(|&p| p))
    }

    /// Whether any cell length changes between frames.
    pub fn is_variable_cell(&mut self) -> Result<bool> {
        let magnitudes = match self.magnitudes {
            Some(ref magnitudes) => magnitudes,
            None => self.compute_unit_cell_magnitudes()?,
        };

        let varies = |lengths: &[f64]| lengths.windows(2).any(|pair| pair[0] != pair[1]);
        Ok(varies(&magnitudes.rx) || varies(&magnitudes.ry) || varies(&magnitudes.rz))
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Vector3;

    use super::*;

    fn cubic(sides: &[f64]) -> UnitCell {
        UnitCell {
            x: sides.iter().map(|&a| Vector3::new(a, 0.0, 0.0)).collect(),
            y: sides.iter().map(|&a| Vector3::new(0.0, a, 0.0)).collect(),
            z: sides.iter().map(|&a| Vector3::new(0.0, 0.0, a)).collect(),
        }
    }

    #[test]
    fn minimal_frames_count_atoms() {
        let mut atoms = AtomTable::default();
        for (frame, index) in [(0, 0), (0, 1), (1, 0), (1, 1), (1, 2)] {
            atoms.push(frame, index, "C", Vector3::zeros());
        }

        let frames = FrameTable::minimal(&atoms);
        assert_eq!(frames.atom_count, vec![2, 3]);
        assert!(!frames.is_periodic());
        assert!(frames.cell.is_none());
    }

    #[test]
    fn magnitudes_need_cell_vectors() {
        let frames = FrameTable {
            atom_count: vec![1],
            ..FrameTable::default()
        };
        let error = frames.unit_cell_magnitudes().unwrap_err();
        assert!(matches!(error, Error::MissingColumns { table: "Frame", ref columns } if columns.len() == 9));
    }

    #[test]
    fn variable_cells() {
        let mut fixed = FrameTable {
            atom_count: vec![1, 1],
            periodic: Some(vec![true, true]),
            cell: Some(cubic(&[10.0, 10.0])),
            ..FrameTable::default()
        };
        assert!(fixed.is_periodic());
        assert!(!fixed.is_variable_cell().unwrap());
        assert_eq!(fixed.magnitudes.as_ref().unwrap().ry, vec![10.0, 10.0]);

        let mut breathing = FrameTable {
            cell: Some(cubic(&[10.0, 10.5])),
            ..fixed
        };
        breathing.magnitudes = None;
        assert!(breathing.is_variable_cell().unwrap());
    }
}
