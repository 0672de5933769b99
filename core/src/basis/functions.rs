use std::f64::consts::PI;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::Shell;

/// One exponent and its contraction coefficient.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    pub alpha: f64,
    /// The contraction coefficient, optionally including the normalization constant
    pub coefficient: f64,
}

/// Linear combination of many [`Primitive`]s sharing one center and shell.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Contraction(pub SmallVec<[Primitive; 6]>);

impl Contraction {
    pub fn primitives(&self) -> &[Primitive] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Primitive> for Contraction {
    fn from_iter<T: IntoIterator<Item = Primitive>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Radial decay of the primitives: exp(-alpha r^2) or exp(-alpha r)
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RadialKind {
    #[default]
    Gaussian,
    Slater,
}

/// The angular part of a basis function.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Angular {
    /// x^i y^j z^k
    Cartesian(u32, u32, u32),
    /// Real solid harmonic S(l, ml)
    Spherical { l: u32, ml: i32 },
}

impl Angular {
    pub fn l(&self) -> u32 {
        match *self {
            Angular::Cartesian(i, j, k) => i + j + k,
            Angular::Spherical { l, .. } => l,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BasisFunction {
    pub contraction: Contraction,
    pub angular: Angular,
    pub radial: RadialKind,
    /// The position of the atom this function is centered on, in natural units
    pub position: Vector3<f64>,
}

impl BasisFunction {
    pub fn shell(&self) -> Option<Shell> {
        Shell::new(self.angular.l()).ok()
    }

    /// A copy of this function with every contraction coefficient multiplied
    /// by the normalization constant of its primitive.
    pub fn normalized(&self) -> Self {
        let contraction = self
            .contraction
            .primitives()
            .iter()
            .map(|&primitive| Primitive {
                coefficient: primitive.coefficient
                    * norm(primitive.alpha, self.angular, self.radial),
                ..primitive
            })
            .collect();

        Self {
            contraction,
            ..self.clone()
        }
    }
}

/// Normalization constant of a single primitive.
pub fn norm(alpha: f64, angular: Angular, radial: RadialKind) -> f64 {
    match (angular, radial) {
        (Angular::Cartesian(i, j, k), RadialKind::Gaussian) => {
            let (i, j, k) = (i as i32, j as i32, k as i32);
            (std::f64::consts::FRAC_2_PI * alpha)
                .powi(3)
                .sqrt()
                .sqrt()
                * f64::sqrt(
                    (8.0 * alpha).powi(i + j + k)
                        / ((i + 1..=2 * i).map(f64::from).product::<f64>()
                            * (j + 1..=2 * j).map(f64::from).product::<f64>()
                            * (k + 1..=2 * k).map(f64::from).product::<f64>()),
                )
        }
        (Angular::Spherical { l, .. }, RadialKind::Gaussian) => {
            // solid harmonics integrate to 4 pi / (2l + 1) over the sphere
            let l = l as i32;
            let b = 2.0 * alpha;
            let integral = 4.0 * PI * double_factorial(2 * l - 1)
                / (2f64.powi(l + 2) * b.powi(l + 1))
                * (PI / b).sqrt();
            integral.sqrt().recip()
        }
        (Angular::Spherical { l, .. }, RadialKind::Slater) => {
            let l = l as i32;
            let integral = 4.0 * PI / f64::from(2 * l + 1) * factorial(2 * l + 2)
                / (2.0 * alpha).powi(2 * l + 3);
            integral.sqrt().recip()
        }
        (Angular::Cartesian(i, j, k), RadialKind::Slater) => {
            // angular integral of x^2i y^2j z^2k over the unit sphere
            let (i, j, k) = (i as i32, j as i32, k as i32);
            let l = i + j + k;
            let angular = 4.0 * PI
                * double_factorial(2 * i - 1)
                * double_factorial(2 * j - 1)
                * double_factorial(2 * k - 1)
                / double_factorial(2 * l + 1);
            let integral = angular * factorial(2 * l + 2) / (2.0 * alpha).powi(2 * l + 3);
            integral.sqrt().recip()
        }
    }
}

pub(crate) fn factorial(n: i32) -> f64 {
    (2..=n).map(f64::from).product()
}

/// n!!, with (-1)!! = 1
pub(crate) fn double_factorial(n: i32) -> f64 {
    (1..=n).rev().step_by(2).map(f64::from).product()
}
