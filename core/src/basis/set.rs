use std::collections::BTreeMap;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::{
    functions::{Angular, BasisFunction, Contraction, Primitive, RadialKind},
    order::{cartesian_lexicographic, spherical_ascending, CartesianOrder, SphericalOrder},
    shell::{Representation, Shell, MAX_L},
};
use crate::error::{Error, Result};

/// One row of a gaussian basis set: a primitive belonging to contracted
/// function `function` of the atoms labelled `symbol`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveRecord {
    pub symbol: String,
    pub shell: Shell,
    pub alpha: f64,
    /// contraction coefficient
    pub d: f64,
    pub function: usize,
}

/// The primitives of a gaussian basis set, one row each.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBasisSet")]
pub struct GaussianBasisSet {
    pub name: Option<String>,
    pub id: Option<String>,
    primitives: Vec<PrimitiveRecord>,
}

/// Serialized form of [`GaussianBasisSet`], checked by [`GaussianBasisSet::new`].
#[derive(Deserialize)]
struct RawBasisSet {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    id: Option<String>,
    primitives: Vec<PrimitiveRecord>,
}

impl TryFrom<RawBasisSet> for GaussianBasisSet {
    type Error = Error;

    fn try_from(raw: RawBasisSet) -> Result<Self> {
        let mut set = Self::new(raw.primitives)?;
        set.name = raw.name;
        set.id = raw.id;
        Ok(set)
    }
}

impl GaussianBasisSet {
    /// Rows of one contracted function must agree on their shell and every
    /// exponent must be positive.
    pub fn new(primitives: Vec<PrimitiveRecord>) -> Result<Self> {
        let mut shells = BTreeMap::new();
        for (row, primitive) in primitives.iter().enumerate() {
            if !(primitive.alpha > 0.0) {
                return Err(Error::InvalidArgument(format!(
                    "primitive {row} has non-positive exponent {}",
                    primitive.alpha
                )));
            }

            let key = (primitive.symbol.as_str(), primitive.function);
            match shells.insert(key, primitive.shell) {
                Some(shell) if shell != primitive.shell => {
                    return Err(Error::InvalidArgument(format!(
                        "function {} of {} mixes {shell} and {} primitives",
                        primitive.function, primitive.symbol, primitive.shell
                    )))
                }
                _ => {}
            }
        }

        Ok(Self {
            name: None,
            id: None,
            primitives,
        })
    }

    pub fn primitives(&self) -> &[PrimitiveRecord] {
        &self.primitives
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// The contracted functions of each symbol, keyed by (symbol, function id).
    fn functions(&self) -> BTreeMap<(&str, usize), (Shell, Vec<&PrimitiveRecord>)> {
        let mut functions = BTreeMap::<_, (Shell, Vec<_>)>::new();
        for primitive in &self.primitives {
            functions
                .entry((primitive.symbol.as_str(), primitive.function))
                .or_insert_with(|| (primitive.shell, Vec::new()))
                .1
                .push(primitive);
        }
        functions
    }

    /// Number of spherical basis functions per symbol: 2l + 1 for every
    /// contracted function.
    pub fn basis_count(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for ((symbol, _), (shell, _)) in self.functions() {
            *counts.entry(symbol.to_owned()).or_default() += shell.spherical_count();
        }
        counts
    }

    /// Like [`GaussianBasisSet::for_symbol`], naming the atom if the set does
    /// not cover it.
    pub(crate) fn for_atom(&self, atom: usize, symbol: &str) -> Result<AtomicBasis> {
        self.for_symbol(symbol)
            .ok_or_else(|| unknown_symbol(atom, symbol))
    }

    /// The shells of one symbol in function order, or `None` if the set does
    /// not cover it.
    pub fn for_symbol(&self, symbol: &str) -> Option<AtomicBasis> {
        let shells = self
            .functions()
            .into_iter()
            .filter(|((s, _), _)| *s == symbol)
            .map(|(_, (shell, primitives))| ElectronShell {
                shell,
                contraction: primitives
                    .into_iter()
                    .map(|primitive| Primitive {
                        alpha: primitive.alpha,
                        coefficient: primitive.d,
                    })
                    .collect(),
            })
            .collect::<Vec<_>>();

        (!shells.is_empty()).then_some(AtomicBasis { shells })
    }

    /// Largest angular momentum in the set.
    pub fn lmax(&self) -> u32 {
        self.primitives
            .iter()
            .map(|primitive| primitive.shell.l())
            .max()
            .unwrap_or(0)
    }
}

fn unknown_symbol(atom: usize, symbol: &str) -> Error {
    Error::InvalidArgument(format!("no basis functions for atom {} ({symbol})", atom + 1))
}

/// Represents the contracted shells of a single element.
#[derive(Clone, Debug, PartialEq)]
pub struct AtomicBasis {
    pub shells: Vec<ElectronShell>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ElectronShell {
    pub shell: Shell,
    pub contraction: Contraction,
}

impl AtomicBasis {
    /// Expand every shell into its components, in the order fixed by `order`,
    /// centered on `position`.
    pub fn basis_functions(
        &self,
        position: Vector3<f64>,
        representation: Representation,
        order: &ComponentOrder,
    ) -> Vec<BasisFunction> {
        self.shells
            .iter()
            .flat_map(|shell| {
                order
                    .components(shell.shell, representation)
                    .into_iter()
                    .map(move |angular| BasisFunction {
                        contraction: shell.contraction.clone(),
                        angular,
                        radial: RadialKind::Gaussian,
                        position,
                    })
            })
            .collect()
    }

    pub fn function_count(&self, representation: Representation) -> usize {
        self.shells
            .iter()
            .map(|shell| shell.shell.count(representation))
            .sum()
    }
}

/// Component order of every shell, in both representations.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentOrder {
    pub cartesian: CartesianOrder,
    pub spherical: SphericalOrder,
}

impl ComponentOrder {
    pub fn new(cartesian: CartesianOrder, spherical: SphericalOrder) -> Self {
        Self {
            cartesian,
            spherical,
        }
    }

    pub fn components(&self, shell: Shell, representation: Representation) -> Vec<Angular> {
        match representation {
            Representation::Cartesian => self
                .cartesian
                .for_l(shell.l())
                .map(|(i, j, k)| Angular::Cartesian(i, j, k))
                .collect(),
            Representation::Spherical => self
                .spherical
                .symbolic_keys(Some(shell.l()))
                .into_iter()
                .map(|(l, ml)| Angular::Spherical { l, ml })
                .collect(),
        }
    }
}

impl Default for ComponentOrder {
    /// Descending cartesian powers and ascending ml for every labelled shell.
    fn default() -> Self {
        Self::new(
            CartesianOrder::from_lmax_order(MAX_L, cartesian_lexicographic),
            SphericalOrder::from_lmax_order(MAX_L, spherical_ascending),
        )
    }
}

/// The basis set(s) used by a universe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BasisSetSummary {
    pub id: String,
    pub name: String,
    /// total number of spherical basis functions over all atoms
    pub function_count: usize,
}

impl BasisSetSummary {
    /// Fails if any symbol is not covered by the set.
    pub fn new<'a>(set: &GaussianBasisSet, symbols: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let counts = set.basis_count();
        let mut function_count = 0;
        for (atom, symbol) in symbols.into_iter().enumerate() {
            let Some(&count) = counts.get(symbol) else {
                return Err(unknown_symbol(atom, symbol));
            };
            function_count += count;
        }

        Ok(Self {
            id: set.id.clone().unwrap_or_default(),
            name: set.name.clone().unwrap_or_default(),
            function_count,
        })
    }
}

/// Basis dimensions summed over the atoms of a frame.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasisDims {
    /// primitives, counting every cartesian component
    pub npc: usize,
    /// primitives, counting every spherical component
    pub nps: usize,
    /// contracted cartesian functions
    pub ncc: usize,
    /// contracted spherical functions
    pub ncs: usize,
}

impl BasisDims {
    pub fn new<'a>(set: &GaussianBasisSet, symbols: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut dims = Self::default();
        for (atom, symbol) in symbols.into_iter().enumerate() {
            for shell in &set.for_atom(atom, symbol)?.shells {
                let cartesian = shell.shell.cartesian_count();
                let spherical = shell.shell.spherical_count();
                dims.npc += cartesian * shell.contraction.len();
                dims.nps += spherical * shell.contraction.len();
                dims.ncc += cartesian;
                dims.ncs += spherical;
            }
        }
        Ok(dims)
    }
}

/// The order of basis functions over a whole universe: one row per
/// component of every shell of every atom.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BasisSetOrder {
    pub shell_function: Vec<usize>,
    pub symbol: Vec<String>,
    /// 1-based atom index
    pub center: Vec<usize>,
    /// (l, ml)
    pub kind: Vec<(u32, i32)>,
}

impl BasisSetOrder {
    pub fn from_atoms<'a>(
        set: &GaussianBasisSet,
        symbols: impl IntoIterator<Item = &'a str>,
        order: &SphericalOrder,
    ) -> Result<Self> {
        let mut table = Self::default();
        for (atom, symbol) in symbols.into_iter().enumerate() {
            let basis = set.for_atom(atom, symbol)?;
            for shell in &basis.shells {
                for key in order.symbolic_keys(Some(shell.shell.l())) {
                    table.shell_function.push(table.shell_function.len());
                    table.symbol.push(symbol.to_owned());
                    table.center.push(atom + 1);
                    table.kind.push(key);
                }
            }
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.shell_function.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shell_function.is_empty()
    }
}

/// Per contracted shell, how many primitives go into how many functions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BasisSetMap {
    pub symbol: Vec<String>,
    pub shell: Vec<Shell>,
    pub nprim: Vec<usize>,
    pub nbasis: Vec<usize>,
    pub cartesian: Vec<bool>,
    pub spherical: Vec<bool>,
}

impl BasisSetMap {
    pub fn from_basis_set(set: &GaussianBasisSet, spherical: bool) -> Self {
        let representation = if spherical {
            Representation::Spherical
        } else {
            Representation::Cartesian
        };

        let mut map = Self::default();
        for ((symbol, _), (shell, primitives)) in set.functions() {
            map.symbol.push(symbol.to_owned());
            map.shell.push(shell);
            map.nprim.push(primitives.len());
            map.nbasis.push(shell.count(representation));
            map.cartesian.push(!spherical);
            map.spherical.push(spherical);
        }
        map
    }

    pub fn len(&self) -> usize {
        self.symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbol.is_empty()
    }
}
