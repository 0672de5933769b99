use std::collections::BTreeMap;

use serde::Deserialize;

use crate::{
    basis::{GaussianBasisSet, PrimitiveRecord, Shell},
    error::{Error, Result},
};

/// A gaussian basis set, given either as flat primitive rows, grouped by
/// element the way basis set exchange files are, or both.
#[derive(Clone, Debug, Deserialize)]
pub struct ConfigBasisSet {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    primitives: Vec<PrimitiveRecord>,
    #[serde(default)]
    elements: BTreeMap<String, ConfigElement>,
}

#[derive(Clone, Debug, Deserialize)]
struct ConfigElement {
    electron_shells: Vec<ConfigElectronShell>,
}

/// Exponents shared by one contraction per entry of `angular_momentum`.
#[derive(Clone, Debug, Deserialize)]
struct ConfigElectronShell {
    angular_momentum: Vec<u32>,
    exponents: Vec<String>,
    coefficients: Vec<Vec<String>>,
}

impl TryFrom<ConfigBasisSet> for GaussianBasisSet {
    type Error = Error;

    fn try_from(value: ConfigBasisSet) -> Result<Self> {
        let mut primitives = value.primitives;

        // grouped shells are numbered after any rows given for the same symbol
        let mut next_function = BTreeMap::<String, usize>::new();
        for record in &primitives {
            let next = next_function.entry(record.symbol.clone()).or_default();
            *next = (*next).max(record.function + 1);
        }

        for (symbol, element) in value.elements {
            let function = next_function.entry(symbol.clone()).or_default();

            for electron_shell in &element.electron_shells {
                if electron_shell.coefficients.len() != electron_shell.angular_momentum.len() {
                    return Err(Error::InvalidArgument(format!(
                        "{symbol} shell has {} coefficient sets for {} angular momenta",
                        electron_shell.coefficients.len(),
                        electron_shell.angular_momentum.len()
                    )));
                }

                for (&l, coefficients) in electron_shell
                    .angular_momentum
                    .iter()
                    .zip(&electron_shell.coefficients)
                {
                    let shell = Shell::new(l)?;
                    if coefficients.len() != electron_shell.exponents.len() {
                        return Err(Error::InvalidArgument(format!(
                            "{symbol} {shell} shell has {} coefficients for {} exponents",
                            coefficients.len(),
                            electron_shell.exponents.len()
                        )));
                    }

                    for (alpha, d) in electron_shell.exponents.iter().zip(coefficients) {
                        primitives.push(PrimitiveRecord {
                            symbol: symbol.clone(),
                            shell,
                            alpha: parse_number(alpha)?,
                            d: parse_number(d)?,
                            function: *function,
                        });
                    }
                    *function += 1;
                }
            }
        }

        let mut set = GaussianBasisSet::new(primitives)?;
        set.name = value.name;
        set.id = value.id;
        Ok(set)
    }
}

fn parse_number(text: &str) -> Result<f64> {
    // fortran style exponents show up in older basis set files
    text.replace(['D', 'd'], "E")
        .parse()
        .map_err(|_| Error::InvalidArgument(format!("{text:?} is not a number")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouped_shells() {
        let config: ConfigBasisSet = serde_json::from_str(
            r#"{
                "name": "6-31G",
                "elements": {
                    "C": {
                        "electron_shells": [
                            {
                                "angular_momentum": [0],
                                "exponents": ["3047.5249", "457.36952"],
                                "coefficients": [["0.0018347", "0.0140373"]]
                            },
                            {
                                "angular_momentum": [0, 1],
                                "exponents": ["7.8682724", "1.8812885D+00"],
                                "coefficients": [["-0.1193324", "-0.1608542"], ["0.0689991", "0.3164240"]]
                            }
                        ]
                    }
                }
            }"#,
        )
        .unwrap();

        let set = GaussianBasisSet::try_from(config).unwrap();
        assert_eq!(set.name.as_deref(), Some("6-31G"));
        assert_eq!(set.len(), 6);
        assert_eq!(set.basis_count()["C"], 5);
        assert_eq!(set.primitives()[3].alpha, 1.8812885);

        let carbon = set.for_symbol("C").unwrap();
        let shells = carbon.shells.iter().map(|shell| shell.shell).collect::<Vec<_>>();
        assert_eq!(shells, [Shell::S, Shell::S, Shell::P]);
    }

    #[test]
    fn rows_and_groups_share_numbering() {
        let config: ConfigBasisSet = serde_json::from_str(
            r#"{
                "primitives": [{"symbol": "H", "shell": "s", "alpha": 1.0, "d": 1.0, "function": 0}],
                "elements": {
                    "H": {"electron_shells": [{"angular_momentum": [1], "exponents": ["0.8"], "coefficients": [["1.0"]]}]}
                }
            }"#,
        )
        .unwrap();

        let set = GaussianBasisSet::try_from(config).unwrap();
        assert_eq!(set.primitives()[1].function, 1);
        assert_eq!(set.lmax(), 1);
    }

    #[test]
    fn mismatched_coefficients() {
        let config: ConfigBasisSet = serde_json::from_str(
            r#"{"elements": {"H": {"electron_shells": [{"angular_momentum": [0], "exponents": ["1.0", "2.0"], "coefficients": [["1.0"]]}]}}}"#,
        )
        .unwrap();
        assert!(GaussianBasisSet::try_from(config).is_err());
    }
}
