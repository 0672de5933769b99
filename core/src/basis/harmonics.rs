//! Real regular solid harmonics as cartesian polynomials.
//!
//! Normalization follows Racah (S(l, m) at r = 1 has the same norm as the
//! spherical harmonic times sqrt(4 pi / (2l + 1))), so S(1, 1) = x and
//! S(2, -2) = sqrt(3) x y.
//!
//! Reference:
//!
//! [1] Helgaker, T., Jørgensen, P., Olsen, J. Molecular Electronic-Structure Theory,
//!     eq. 6.4.47 - 6.4.50.
use std::{collections::BTreeMap, sync::OnceLock};

use super::{functions::factorial, shell::MAX_L};
use crate::error::{Error, Result};

/// c * x^a * y^b * z^c
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Monomial {
    pub coefficient: f64,
    pub powers: (u32, u32, u32),
}

/// Anything smaller than this is a cancelled term
const ZERO_CUTOFF: f64 = 1e-12;

/// The polynomial for S(l, ml), for l up to the largest labelled shell and
/// |ml| <= l.
pub fn solid_harmonic(l: u32, ml: i32) -> Result<&'static [Monomial]> {
    if l > MAX_L || ml.unsigned_abs() > l {
        return Err(Error::UnsupportedAngularMomentum { l, ml });
    }

    static TABLE: OnceLock<Vec<Vec<Monomial>>> = OnceLock::new();
    let table = TABLE.get_or_init(|| {
        log::debug!("tabulating solid harmonics up to l = {MAX_L}");
        (0..=MAX_L)
            .flat_map(|l| (-(l as i32)..=l as i32).map(move |ml| expand(l, ml)))
            .collect()
    });

    Ok(&table[index(l, ml)])
}

/// Position of (l, ml) in a table ordered by l, then ml ascending.
#[inline(always)]
const fn index(l: u32, ml: i32) -> usize {
    (l * l) as usize + (l as i32 + ml) as usize
}

fn binomial(n: i32, k: i32) -> f64 {
    if k < 0 || k > n {
        return 0.0;
    }
    factorial(n) / (factorial(k) * factorial(n - k))
}

fn expand(l: u32, ml: i32) -> Vec<Monomial> {
    let l = l as i32;
    let m = ml.abs();
    // twice v_m
    let vm2 = if ml < 0 { 1 } else { 0 };

    let norm = (2.0 * factorial(l + m) * factorial(l - m) / if m == 0 { 2.0 } else { 1.0 })
        .sqrt()
        / (2f64.powi(m) * factorial(l));

    let mut terms = BTreeMap::<(u32, u32, u32), f64>::new();
    for t in 0..=(l - m) / 2 {
        for u in 0..=t {
            // w = 2v runs over vm2, vm2 + 2, ... up to |m|
            for w in (vm2..=m).step_by(2) {
                let sign = if (t + (w - vm2) / 2) % 2 == 0 { 1.0 } else { -1.0 };
                let c = sign
                    * 0.25f64.powi(t)
                    * binomial(l, t)
                    * binomial(l - t, m + t)
                    * binomial(t, u)
                    * binomial(m, w);

                let powers = (
                    (2 * t + m - 2 * u - w) as u32,
                    (2 * u + w) as u32,
                    (l - 2 * t - m) as u32,
                );
                *terms.entry(powers).or_default() += norm * c;
            }
        }
    }

    // descending x, then y
    terms
        .into_iter()
        .rev()
        .filter(|(_, c)| c.abs() > ZERO_CUTOFF)
        .map(|(powers, coefficient)| Monomial {
            coefficient,
            powers,
        })
        .collect()
}
