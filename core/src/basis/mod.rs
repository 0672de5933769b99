pub mod functions;
pub mod generator;
pub mod harmonics;
pub mod order;
pub mod overlap;
pub mod set;
pub mod shell;

pub use functions::{norm, Angular, BasisFunction, Contraction, Primitive, RadialKind};
pub use generator::{basis_function_expression, AtomCenter};
pub use order::{CartesianOrder, SphericalOrder};
pub use overlap::Overlap;
pub use set::{
    AtomicBasis, BasisDims, BasisSetMap, BasisSetOrder, BasisSetSummary, ComponentOrder, ElectronShell,
    GaussianBasisSet, PrimitiveRecord,
};
pub use shell::{Representation, Shell};
