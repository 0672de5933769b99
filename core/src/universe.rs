//! The container tying atoms, frames, fields and basis set data together.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    atom::AtomTable,
    basis::{
        basis_function_expression, BasisDims, BasisFunction, BasisSetMap, BasisSetOrder,
        BasisSetSummary, ComponentOrder, GaussianBasisSet, Overlap, Representation, SphericalOrder,
    },
    error::{Error, Result},
    expr::ProgramCache,
    field::{FieldGrid, FieldParams},
    frame::FrameTable,
    orbital::{molecular_orbital_fields, Contributions, MoMatrix},
    xyz::Xyz,
};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    pub name: Option<String>,
    pub atoms: AtomTable,
    pub frames: FrameTable,
    pub fields: Option<FieldGrid>,
    pub basis_set: Option<GaussianBasisSet>,
    pub overlap: Option<Overlap>,
    pub momatrix: Option<MoMatrix>,
    pub comments: Vec<String>,
}

impl Universe {
    pub fn new(atoms: AtomTable) -> Self {
        Self {
            frames: FrameTable::minimal(&atoms),
            atoms,
            ..Self::default()
        }
    }

    pub fn with_basis_set(self, basis_set: GaussianBasisSet) -> Self {
        Self {
            basis_set: Some(basis_set),
            ..self
        }
    }

    pub fn with_momatrix(self, momatrix: MoMatrix) -> Self {
        Self {
            momatrix: Some(momatrix),
            ..self
        }
    }

    /// Whether any frame is periodic. A periodic universe must carry cell
    /// magnitudes and origins.
    pub fn check_periodic(&self) -> Result<bool> {
        if !self.frames.is_periodic() {
            return Ok(false);
        }

        let mut missing = Vec::new();
        if self.frames.magnitudes.is_none() {
            missing.extend(["rx", "ry", "rz"]);
        }
        if self.frames.origin.is_none() {
            missing.extend(["ox", "oy", "oz"]);
        }
        if !missing.is_empty() {
            return Err(Error::missing_columns("Frame", missing));
        }
        Ok(true)
    }

    /// Attach fields, appending to any already present.
    pub fn add_field(&mut self, field: FieldGrid) -> Result<()> {
        match &mut self.fields {
            Some(fields) => fields.extend(field),
            None => {
                self.fields = Some(field);
                Ok(())
            }
        }
    }

    /// Chemical formula of one frame, e.g. "H(2)O(1)".
    pub fn formula(&self, frame: usize) -> String {
        formula_string(&self.atoms.symbol_counts(frame))
    }

    fn frame_symbols(&self, frame: usize) -> impl Iterator<Item = &str> {
        self.atoms.frame_atoms(frame).map(|atom| atom.symbol)
    }

    fn require_basis_set(&self) -> Result<&GaussianBasisSet> {
        self.basis_set
            .as_ref()
            .ok_or_else(|| Error::InvalidArgument("the universe has no basis set".to_owned()))
    }

    pub fn basis_set_summary(&self, frame: usize) -> Result<BasisSetSummary> {
        let set = self.require_basis_set()?;
        BasisSetSummary::new(set, self.frame_symbols(frame))
    }

    pub fn basis_set_order(&self, frame: usize, order: &SphericalOrder) -> Result<BasisSetOrder> {
        let set = self.require_basis_set()?;
        BasisSetOrder::from_atoms(set, self.frame_symbols(frame), order)
    }

    /// Primitive and contracted function counts of one frame.
    pub fn basis_dims(&self, frame: usize) -> Result<BasisDims> {
        BasisDims::new(self.require_basis_set()?, self.frame_symbols(frame))
    }

    pub fn basis_set_map(&self, spherical: bool) -> Result<BasisSetMap> {
        Ok(BasisSetMap::from_basis_set(self.require_basis_set()?, spherical))
    }

    /// Every basis function of one frame, centered on its atoms, in atom
    /// order and then shell order.
    pub fn basis_functions(
        &self,
        frame: usize,
        representation: Representation,
        order: &ComponentOrder,
    ) -> Result<Vec<BasisFunction>> {
        let set = self.require_basis_set()?;

        let mut functions = Vec::new();
        for atom in self.atoms.frame_atoms(frame) {
            let basis = set.for_atom(atom.index, atom.symbol)?;
            functions.extend(basis.basis_functions(*atom.position(), representation, order));
        }
        Ok(functions)
    }

    /// Evaluate the normalized basis functions of `frame` on the grid
    /// described by `params`, one field each.
    pub fn basis_function_fields(
        &self,
        frame: usize,
        params: &FieldParams,
        representation: Representation,
        precision: usize,
    ) -> Result<FieldGrid> {
        let functions = self.basis_functions(frame, representation, &ComponentOrder::default())?;

        let mut cache = ProgramCache::new();
        let programs = functions
            .iter()
            .map(|function| {
                let expr = basis_function_expression(&function.normalized(), Some(precision))?;
                Ok(cache.get_or_compile(&expr, precision))
            })
            .collect::<Result<Vec<_>>>()?;
        log::debug!(
            "compiled {} programs for {} basis functions ({} shared)",
            cache.len(),
            functions.len(),
            cache.hits()
        );

        let params = FieldParams {
            frame,
            ..params.clone()
        };
        FieldGrid::evaluate(programs.iter().map(|program| program.as_ref()), &params)
    }

    fn require_momatrix(&self) -> Result<&MoMatrix> {
        self.momatrix
            .as_ref()
            .ok_or_else(|| Error::InvalidArgument("the universe has no orbital coefficients".to_owned()))
    }

    /// Evaluate the orbitals in `vector` (all of them if `None`) of `frame`
    /// and attach them as fields, replacing earlier fields if `replace`.
    ///
    /// Orbital coefficients refer to the spherical basis functions in the
    /// default component order.
    pub fn add_molecular_orbitals(
        &mut self,
        params: &FieldParams,
        vector: Option<&[usize]>,
        frame: usize,
        precision: usize,
        replace: bool,
    ) -> Result<()> {
        let momatrix = self.require_momatrix()?;
        let basis_fields =
            self.basis_function_fields(frame, params, Representation::Spherical, precision)?;
        let orbitals = molecular_orbital_fields(&basis_fields, momatrix, vector, frame)?;
        log::info!("adding {} orbitals of frame {frame}", orbitals.len());

        if replace {
            self.fields = None;
        }
        self.add_field(orbitals)
    }

    /// The basis functions contributing more than `tol` to `orbital`, joined
    /// with their atoms and (l, ml) in the default spherical order.
    pub fn basis_function_contributions(
        &self,
        orbital: usize,
        tol: f64,
        frame: usize,
    ) -> Result<Contributions> {
        let small = self.require_momatrix()?.contributions(orbital, tol, frame);
        let order = self.basis_set_order(frame, &ComponentOrder::default().spherical)?;
        Contributions::join(&small, &order)
    }
}

impl From<Xyz> for Universe {
    fn from(xyz: Xyz) -> Self {
        Self {
            atoms: xyz.atoms,
            frames: xyz.frames,
            comments: xyz.comments,
            ..Self::default()
        }
    }
}

/// Concatenate "symbol(count)" ordered by the first letter of the symbol.
pub fn formula_string(counts: &BTreeMap<String, usize>) -> String {
    let mut entries = counts.iter().collect::<Vec<_>>();
    entries.sort_by_key(|(symbol, _)| symbol.chars().next());
    entries
        .into_iter()
        .map(|(symbol, count)| format!("{symbol}({count})"))
        .collect()
}
