//! Serde representations of the JSON inputs, converted into the library types
//! with `TryFrom` / `From`.
pub use basis_set::ConfigBasisSet;
pub use field::ConfigFieldParams;

mod basis_set;
mod field;
