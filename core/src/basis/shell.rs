use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Shell labels in order of angular momentum. `j` is skipped by convention.
const LABELS: [char; 10] = ['s', 'p', 'd', 'f', 'g', 'h', 'i', 'k', 'l', 'm'];

/// The largest angular momentum with a shell label.
pub const MAX_L: u32 = LABELS.len() as u32 - 1;

/// Whether the angular part of a shell is expanded in cartesian monomials or
/// in real solid harmonics.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Representation {
    Cartesian,
    Spherical,
}

/// An angular momentum shell, identified by its quantum number l.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Shell(u32);

impl Shell {
    pub const S: Shell = Shell(0);
    pub const P: Shell = Shell(1);
    pub const D: Shell = Shell(2);
    pub const F: Shell = Shell(3);

    pub fn new(l: u32) -> Result<Self> {
        if l > MAX_L {
            return Err(Error::InvalidArgument(format!(
                "angular momentum {l} exceeds the largest labelled shell ({MAX_L})"
            )));
        }
        Ok(Self(l))
    }

    pub const fn l(self) -> u32 {
        self.0
    }

    pub const fn label(self) -> char {
        LABELS[self.0 as usize]
    }

    /// 2l + 1
    pub const fn spherical_count(self) -> usize {
        2 * self.0 as usize + 1
    }

    /// (l + 1)(l + 2) / 2
    pub const fn cartesian_count(self) -> usize {
        let l = self.0 as usize;
        (l + 1) * (l + 2) / 2
    }

    pub const fn count(self, representation: Representation) -> usize {
        match representation {
            Representation::Cartesian => self.cartesian_count(),
            Representation::Spherical => self.spherical_count(),
        }
    }
}

impl FromStr for Shell {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // p shells are sometimes labelled by component
        if matches!(s, "px" | "py" | "pz") {
            return Ok(Self::P);
        }

        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => LABELS
                .iter()
                .position(|&label| label == c.to_ascii_lowercase())
                .map(|l| Self(l as u32))
                .ok_or_else(|| Error::InvalidArgument(format!("unknown shell label {s:?}"))),
            _ => Err(Error::InvalidArgument(format!("unknown shell label {s:?}"))),
        }
    }
}

impl TryFrom<String> for Shell {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Shell> for String {
    fn from(value: Shell) -> Self {
        value.label().to_string()
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
