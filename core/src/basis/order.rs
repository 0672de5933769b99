//! Tables fixing the order of the angular components within each shell.
//!
//! Every program orders the components of a shell its own way, so the tables
//! are built from an ordering function that returns the components of one l.
use serde::{Deserialize, Serialize};

use super::shell::{Representation, Shell};
use crate::error::{Error, Result};

/// Cartesian powers (x, y, z) for every component of shells 0..=lmax.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartesianOrder {
    pub x: Vec<u32>,
    pub y: Vec<u32>,
    pub z: Vec<u32>,
    /// number of rows contributed by each l, in order
    shell_lengths: Vec<usize>,
}

impl CartesianOrder {
    /// Concatenate `ordering(l)` for l = 0..=lmax. The ordering function is
    /// trusted; see [`CartesianOrder::validate`].
    pub fn from_lmax_order<F>(lmax: u32, ordering: F) -> Self
    where
        F: Fn(u32) -> Vec<(u32, u32, u32)>,
    {
        let mut order = Self::default();
        for l in 0..=lmax {
            let components = ordering(l);
            order.shell_lengths.push(components.len());
            for (x, y, z) in components {
                order.x.push(x);
                order.y.push(y);
                order.z.push(z);
            }
        }

        log::debug!("cartesian order up to l = {lmax} has {} rows", order.len());
        order
    }

    /// Like [`CartesianOrder::from_lmax_order`], rejecting malformed shells.
    pub fn from_lmax_order_checked<F>(lmax: u32, ordering: F) -> Result<Self>
    where
        F: Fn(u32) -> Vec<(u32, u32, u32)>,
    {
        let order = Self::from_lmax_order(lmax, ordering);
        order.validate()?;
        Ok(order)
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        self.x
            .iter()
            .zip(&self.y)
            .zip(&self.z)
            .map(|((&x, &y), &z)| (x, y, z))
    }

    /// The rows belonging to shell `l`.
    pub fn for_l(&self, l: u32) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        let l = l as usize;
        let start = self.shell_lengths.iter().take(l).sum::<usize>();
        let len = self.shell_lengths.get(l).copied().unwrap_or(0);
        self.rows().skip(start).take(len)
    }

    /// "x" repeated x times, then "y" and "z" likewise: `""`, `"x"`, `"xxyy"`, ...
    pub fn symbolic_keys(&self) -> Vec<String> {
        self.rows()
            .map(|(x, y, z)| {
                let mut key = String::with_capacity((x + y + z) as usize);
                key.extend(std::iter::repeat('x').take(x as usize));
                key.extend(std::iter::repeat('y').take(y as usize));
                key.extend(std::iter::repeat('z').take(z as usize));
                key
            })
            .collect()
    }

    /// Check every shell holds (l + 1)(l + 2) / 2 distinct components of degree l.
    pub fn validate(&self) -> Result<()> {
        let mut start = 0;
        for (l, &len) in self.shell_lengths.iter().enumerate() {
            let shell = Shell::new(l as u32)?;
            let expected = shell.count(Representation::Cartesian);
            if len != expected {
                return Err(Error::InvalidArgument(format!(
                    "cartesian {shell} shell has {len} components, expected {expected}"
                )));
            }

            let rows = self.rows().skip(start).take(len).collect::<Vec<_>>();
            if let Some(&(x, y, z)) = rows.iter().find(|&&(x, y, z)| (x + y + z) as usize != l) {
                return Err(Error::InvalidArgument(format!(
                    "component ({x}, {y}, {z}) does not belong to the {shell} shell"
                )));
            }
            if has_duplicates(&rows) {
                return Err(Error::InvalidArgument(format!(
                    "cartesian {shell} shell repeats a component"
                )));
            }
            start += len;
        }
        Ok(())
    }
}

/// (l, ml) for every component of shells 0..=lmax.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SphericalOrder {
    pub l: Vec<u32>,
    pub ml: Vec<i32>,
    /// largest l the table was built for, even if its shell came back empty
    #[serde(default)]
    lmax: u32,
}

impl SphericalOrder {
    pub fn from_lmax_order<F>(lmax: u32, ordering: F) -> Self
    where
        F: Fn(u32) -> Vec<i32>,
    {
        let mut order = Self {
            lmax,
            ..Self::default()
        };
        for l in 0..=lmax {
            for ml in ordering(l) {
                order.l.push(l);
                order.ml.push(ml);
            }
        }

        log::debug!("spherical order up to l = {lmax} has {} rows", order.len());
        order
    }

    pub fn from_lmax_order_checked<F>(lmax: u32, ordering: F) -> Result<Self>
    where
        F: Fn(u32) -> Vec<i32>,
    {
        let order = Self::from_lmax_order(lmax, ordering);
        order.validate()?;
        Ok(order)
    }

    pub fn len(&self) -> usize {
        self.l.len()
    }

    pub fn is_empty(&self) -> bool {
        self.l.is_empty()
    }

    /// (l, ml) pairs in table order, optionally only those of one shell.
    pub fn symbolic_keys(&self, l: Option<u32>) -> Vec<(u32, i32)> {
        self.l
            .iter()
            .copied()
            .zip(self.ml.iter().copied())
            .filter(|&(row_l, _)| l.map_or(true, |l| l == row_l))
            .collect()
    }

    /// Check every shell up to the requested lmax holds each ml in -l..=l
    /// exactly once.
    pub fn validate(&self) -> Result<()> {
        let lmax = self.l.iter().copied().fold(self.lmax, u32::max);
        for l in 0..=lmax {
            let shell = Shell::new(l)?;
            let mut mls = self
                .symbolic_keys(Some(l))
                .into_iter()
                .map(|(_, ml)| ml)
                .collect::<Vec<_>>();
            mls.sort_unstable();

            let expected = spherical_ascending(l);
            if mls != expected {
                return Err(Error::InvalidArgument(format!(
                    "spherical {shell} shell has components {mls:?}, expected a permutation of {expected:?}"
                )));
            }
        }
        Ok(())
    }
}

fn has_duplicates(rows: &[(u32, u32, u32)]) -> bool {
    let mut sorted = rows.to_vec();
    sorted.sort_unstable();
    sorted.windows(2).any(|pair| pair[0] == pair[1])
}

/// All (i, j, k) with i + j + k = l, in descending powers of x, then y:
/// xx, xy, xz, yy, yz, zz for d shells.
pub fn cartesian_lexicographic(l: u32) -> Vec<(u32, u32, u32)> {
    let mut powers = itertools::iproduct!(0..=l, 0..=l)
        .filter(|&(i, j)| i + j <= l)
        .map(|(i, j)| (i, j, l - i - j))
        .collect::<Vec<_>>();
    powers.sort_unstable_by(|a, b| b.cmp(a));
    powers
}

/// -l, ..., 0, ..., l
pub fn spherical_ascending(l: u32) -> Vec<i32> {
    let l = l as i32;
    (-l..=l).collect()
}

/// 0, 1, -1, 2, -2, ..., l, -l
pub fn spherical_pople(l: u32) -> Vec<i32> {
    let l = l as i32;
    std::iter::once(0)
        .chain((1..=l).flat_map(|m| [m, -m]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cartesian_row_counts() {
        for lmax in 0..=6u32 {
            let order = CartesianOrder::from_lmax_order(lmax, cartesian_lexicographic);
            let expected = (0..=lmax)
                .map(|l| ((l + 1) * (l + 2) / 2) as usize)
                .sum::<usize>();
            assert_eq!(order.len(), expected);
            order.validate().unwrap();
        }
    }

    #[test]
    fn spherical_row_counts() {
        for lmax in 0..=6u32 {
            let expected = (0..=lmax).map(|l| (2 * l + 1) as usize).sum::<usize>();
            let ascending = SphericalOrder::from_lmax_order(lmax, spherical_ascending);
            let pople = SphericalOrder::from_lmax_order(lmax, spherical_pople);
            assert_eq!(ascending.len(), expected);
            assert_eq!(pople.len(), expected);
            ascending.validate().unwrap();
            pople.validate().unwrap();
        }
    }

    #[test]
    fn cartesian_keys() {
        let order = CartesianOrder::from_lmax_order(2, cartesian_lexicographic);
        assert_eq!(
            order.symbolic_keys(),
            vec!["", "x", "y", "z", "xx", "xy", "xz", "yy", "yz", "zz"]
        );
        assert_eq!(
            order.for_l(1).collect::<Vec<_>>(),
            vec![(1, 0, 0), (0, 1, 0), (0, 0, 1)]
        );
        assert_eq!(order.for_l(3).count(), 0);
    }

    #[test]
    fn spherical_keys() {
        let order = SphericalOrder::from_lmax_order(2, spherical_pople);
        assert_eq!(order.symbolic_keys(Some(1)), vec![(1, 0), (1, 1), (1, -1)]);
        assert_eq!(order.symbolic_keys(None)[0], (0, 0));
        assert_eq!(order.symbolic_keys(None).len(), 9);
        assert!(order.symbolic_keys(Some(5)).is_empty());
    }

    #[test]
    fn malformed_orderings_are_rejected() {
        let short = CartesianOrder::from_lmax_order_checked(1, |l| {
            cartesian_lexicographic(l).into_iter().take(1).collect()
        });
        assert!(short.is_err());

        let repeated = CartesianOrder::from_lmax_order_checked(1, |l| {
            if l == 1 {
                vec![(1, 0, 0), (1, 0, 0), (0, 0, 1)]
            } else {
                cartesian_lexicographic(l)
            }
        });
        assert!(repeated.is_err());

        let spherical = SphericalOrder::from_lmax_order_checked(2, |l| {
            let mut mls = spherical_ascending(l);
            mls.pop();
            mls
        });
        assert!(spherical.is_err());

        let missing_d = SphericalOrder::from_lmax_order_checked(2, |l| {
            if l == 2 {
                vec![]
            } else {
                spherical_ascending(l)
            }
        });
        assert!(missing_d.is_err());

        let missing_f = CartesianOrder::from_lmax_order_checked(3, |l| {
            if l == 3 {
                vec![]
            } else {
                cartesian_lexicographic(l)
            }
        });
        assert!(missing_f.is_err());

        // unchecked construction trusts the ordering function
        let trusted = CartesianOrder::from_lmax_order(1, |_| vec![(0, 0, 0)]);
        assert_eq!(trusted.len(), 2);
    }
}
