pub mod atom;
pub mod basis;
pub mod config;
pub mod error;
pub mod expr;
pub mod field;
pub mod frame;
pub mod geometry;
pub mod interpolate;
pub mod orbital;
pub mod universe;
pub mod xyz;

pub use error::{Error, Result};

pub mod testing {
    use serde::{Deserialize, Serialize};

    use crate::{
        basis::{BasisFunction, ComponentOrder, Representation},
        universe::Universe,
        Result,
    };

    /// The normalized basis functions of one frame, the fixed input of the
    /// benchmarks.
    #[derive(Serialize, Deserialize)]
    pub struct TestInstance {
        pub name: String,
        basis_functions: Vec<BasisFunction>,
    }

    impl TestInstance {
        pub fn new(
            name: String,
            universe: &Universe,
            frame: usize,
            representation: Representation,
        ) -> Result<Self> {
            let basis_functions = universe
                .basis_functions(frame, representation, &ComponentOrder::default())?
                .iter()
                .map(BasisFunction::normalized)
                .collect();

            Ok(Self {
                name,
                basis_functions,
            })
        }

        pub fn basis_functions(&self) -> &[BasisFunction] {
            &self.basis_functions
        }
    }
}
