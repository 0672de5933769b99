//! Builds closed-form expressions for basis functions.
//!
//! A primitive centered on atom A is
//!
//!   angular(x - Ax, y - Ay, z - Az) * c * exp(-alpha * r^n)
//!
//! with n = 2 for gaussians and n = 1 for slater functions; a contracted basis
//! function is the sum of its primitives.
use nalgebra::Vector3;

use crate::{
    error::Result,
    expr::{round_to, Axis, Expr},
};

use super::{
    functions::{Angular, BasisFunction, Primitive, RadialKind},
    harmonics::solid_harmonic,
};

/// An atomic position used to build relative-coordinate expressions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AtomCenter {
    position: Vector3<f64>,
    /// decimals the coordinates are rounded to, if any
    precision: Option<usize>,
}

impl AtomCenter {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            precision: None,
        }
    }

    pub fn with_precision(self, precision: usize) -> Self {
        Self {
            precision: Some(precision),
            ..self
        }
    }

    pub fn position(&self) -> &Vector3<f64> {
        &self.position
    }

    fn coordinate(&self, axis: Axis) -> f64 {
        let value = self.position[axis.index()];
        match self.precision {
            Some(precision) => round_to(value, precision),
            None => value,
        }
    }

    /// `x` if the coordinate is zero, `(x - Ax)` otherwise.
    pub fn relative(&self, axis: Axis) -> Expr {
        let coordinate = self.coordinate(axis);
        if coordinate == 0.0 {
            Expr::var(axis)
        } else {
            Expr::sum([Expr::var(axis), Expr::constant(-coordinate)])
        }
    }

    /// Sum of the squared relative coordinates.
    pub fn r2(&self) -> Expr {
        Expr::Sum(
            Axis::ALL
                .iter()
                .map(|&axis| Expr::pow(self.relative(axis), 2.0))
                .collect(),
        )
    }

    pub fn r(&self) -> Expr {
        self.r2().sqrt()
    }

    /// The radial variable matching a kind of decay.
    pub fn radial(&self, kind: RadialKind) -> Expr {
        match kind {
            RadialKind::Gaussian => self.r2(),
            RadialKind::Slater => self.r(),
        }
    }
}

impl From<Vector3<f64>> for AtomCenter {
    fn from(position: Vector3<f64>) -> Self {
        Self {
            position,
            precision: None,
        }
    }
}

/// Angular part of a spherical function: the solid harmonic S(l, ml) with the
/// placeholders x, y, z replaced by coordinates relative to `center`.
///
/// Unit coefficients are dropped, so S(1, 1) on an atom at the origin is just `x`.
pub fn spherical_prefactor(center: &AtomCenter, l: u32, ml: i32) -> Result<Expr> {
    let terms = solid_harmonic(l, ml)?
        .iter()
        .map(|monomial| {
            let coefficient = (monomial.coefficient != 1.0).then(|| Expr::constant(monomial.coefficient));
            let (a, b, c) = monomial.powers;
            Expr::product(coefficient.into_iter().chain(powers(center, a, b, c)))
        })
        .collect::<Vec<_>>();

    Ok(Expr::sum(terms))
}

/// Angular part of a cartesian function: `prefactor * (x-Ax)^i * (y-Ay)^j * (z-Az)^k`.
pub fn cartesian_prefactor(center: &AtomCenter, prefactor: Option<f64>, i: u32, j: u32, k: u32) -> Expr {
    Expr::product(prefactor.map(Expr::constant).into_iter().chain(powers(center, i, j, k)))
}

fn powers(center: &AtomCenter, i: u32, j: u32, k: u32) -> impl Iterator<Item = Expr> + '_ {
    Axis::ALL
        .into_iter()
        .zip([i, j, k])
        .filter(|&(_, power)| power > 0)
        .map(|(axis, power)| Expr::pow(center.relative(axis), f64::from(power)))
}

/// Combine an angular part with contracted radial terms:
///
///   (angular * c1 * exp(-a1 * r) + angular * c2 * exp(-a2 * r) + ...)
///
/// `radial` is r2 for gaussians and r for slater functions.
pub fn contracted(angular: &Expr, primitives: &[Primitive], radial: &Expr) -> Expr {
    let angular_factors = match angular {
        Expr::Constant(value) if *value == 1.0 => Vec::new(),
        Expr::Product(factors) => factors.clone(),
        other => vec![other.clone()],
    };

    let terms = primitives
        .iter()
        .map(|primitive| {
            let decay = Expr::exp(Expr::product([
                Expr::constant(-primitive.alpha),
                radial.clone(),
            ]));
            let mut factors = angular_factors.clone();
            factors.push(Expr::constant(primitive.coefficient));
            factors.push(decay);
            Expr::Product(factors)
        })
        .collect();

    Expr::Sum(terms)
}

/// The full expression of a contracted basis function.
pub fn basis_function_expression(function: &BasisFunction, precision: Option<usize>) -> Result<Expr> {
    let mut center = AtomCenter::from(function.position);
    if let Some(precision) = precision {
        center = center.with_precision(precision);
    }

    let angular = match function.angular {
        Angular::Cartesian(i, j, k) => cartesian_prefactor(&center, None, i, j, k),
        Angular::Spherical { l, ml } => spherical_prefactor(&center, l, ml)?,
    };

    log::trace!(
        "building {:?} function with {} primitives",
        function.angular,
        function.contraction.len()
    );
    Ok(contracted(
        &angular,
        function.contraction.primitives(),
        &center.radial(function.radial),
    ))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use rand::Rng;

    use super::*;
    use crate::basis::functions::Contraction;

    fn primitives(pairs: &[(f64, f64)]) -> Vec<Primitive> {
        pairs
            .iter()
            .map(|&(alpha, coefficient)| Primitive { alpha, coefficient })
            .collect()
    }

    #[test]
    fn relative_coordinates_at_origin() {
        let zeros = AtomCenter::new(0.0, 0.0, 0.0);
        assert_eq!(zeros.relative(Axis::X).render(4), "x");
        assert_eq!(zeros.relative(Axis::Z).render(4), "z");
        assert_eq!(zeros.r2().render(4), "(x**2+y**2+z**2)");
        assert_eq!(zeros.r().render(4), "(x**2+y**2+z**2)**0.5");
    }

    #[test]
    fn relative_coordinates_off_origin() {
        let center = AtomCenter::new(1.0, -2.0, 3.0);
        assert_eq!(center.relative(Axis::X).render(1), "(x-1.0)");
        assert_eq!(center.relative(Axis::Y).render(1), "(y+2.0)");
        assert_eq!(center.relative(Axis::Z).render(1), "(z-3.0)");
        assert_eq!(center.r2().render(1), "((x-1.0)**2+(y+2.0)**2+(z-3.0)**2)");
        assert_eq!(center.r().render(1), "((x-1.0)**2+(y+2.0)**2+(z-3.0)**2)**0.5");

        let rounded = AtomCenter::new(1.0, -2.1111111, 3.0).with_precision(4);
        assert_eq!(rounded.relative(Axis::Y).render(4), "(y+2.1111)");
        assert_eq!(rounded.relative(Axis::Y).eval(0.0, 0.0, 0.0), 2.1111);
    }

    #[test]
    fn offsets_below_the_printed_precision_vanish() {
        let unrounded = AtomCenter::new(1e-9, -3e-7, 0.25);
        assert_eq!(unrounded.relative(Axis::X).render(4), "x");
        assert_eq!(unrounded.relative(Axis::Y).render(4), "y");
        assert_eq!(unrounded.relative(Axis::Z).render(4), "(z-0.2500)");
        assert_eq!(unrounded.relative(Axis::Y).render(8), "(y+0.00000030)");

        let rounded = AtomCenter::new(1e-9, 0.0, 0.0).with_precision(4);
        assert_eq!(rounded.relative(Axis::X), Expr::var(Axis::X));
    }

    #[test]
    fn unsupported_spherical_components() {
        let function = BasisFunction {
            contraction: Contraction::from_iter(primitives(&[(1.0, 1.0)])),
            angular: Angular::Spherical { l: 10, ml: 0 },
            radial: RadialKind::Gaussian,
            position: Vector3::zeros(),
        };
        assert!(basis_function_expression(&function, Some(4)).is_err());

        let center = AtomCenter::new(0.0, 0.0, 0.0);
        assert!(spherical_prefactor(&center, 1, 2).is_err());
    }

    #[test]
    fn spherical_prefactors() {
        let center = AtomCenter::new(0.0, 0.5, 0.0);
        let render = |l, ml| spherical_prefactor(&center, l, ml).unwrap().render(6);

        assert_eq!(render(0, 0), "1.000000");
        assert_eq!(render(1, -1), "(y-0.500000)");
        assert_eq!(render(1, 0), "z");
        assert_eq!(render(1, 1), "x");
        assert_eq!(render(2, -2), "1.732051*x*(y-0.500000)");
        assert_eq!(render(2, -1), "1.732051*(y-0.500000)*z");
        assert_eq!(render(2, 1), "1.732051*x*z");
        assert_eq!(render(3, -2), "3.872983*x*(y-0.500000)*z");
    }

    #[test]
    fn cartesian_prefactors() {
        let origin = AtomCenter::new(0.0, 0.0, 0.0);
        let shifted = AtomCenter::new(0.5, 0.5, 0.5);
        let render = |center: &AtomCenter, prefactor, i, j, k| {
            cartesian_prefactor(center, prefactor, i, j, k).render(1)
        };

        assert_eq!(render(&origin, None, 0, 0, 0), "1.0");
        assert_eq!(render(&origin, None, 1, 0, 0), "x");
        assert_eq!(render(&origin, None, 0, 1, 0), "y");
        assert_eq!(render(&origin, None, 0, 0, 1), "z");
        assert_eq!(render(&origin, None, 2, 0, 0), "x**2");
        assert_eq!(render(&origin, None, 1, 1, 0), "x*y");
        assert_eq!(render(&origin, None, 1, 0, 1), "x*z");
        assert_eq!(render(&origin, None, 0, 1, 1), "y*z");
        assert_eq!(render(&origin, None, 0, 0, 2), "z**2");
        assert_eq!(render(&shifted, None, 1, 0, 0), "(x-0.5)");
        assert_eq!(render(&shifted, None, 2, 0, 0), "(x-0.5)**2");
        assert_eq!(render(&shifted, None, 1, 1, 0), "(x-0.5)*(y-0.5)");
        assert_eq!(render(&shifted, Some(1.0), 1, 1, 0), "1.0*(x-0.5)*(y-0.5)");
    }

    #[test]
    fn contracted_expressions() {
        let origin = AtomCenter::new(0.0, 0.0, 0.0);
        let s = Expr::ONE;

        let uncontracted = contracted(&s, &primitives(&[(1.0, 1.0)]), &origin.r2());
        assert_eq!(uncontracted.render(0), "(1*exp(-1*(x**2+y**2+z**2)))");

        let slater = contracted(&s, &primitives(&[(1.0, 1.0)]), &origin.r());
        assert_eq!(slater.render(1), "(1.0*exp(-1.0*(x**2+y**2+z**2)**0.5))");

        let contraction = contracted(&s, &primitives(&[(1.0, 1.0), (2.0, 4.0)]), &origin.r2());
        assert_eq!(
            contraction.render(2),
            "(1.00*exp(-1.00*(x**2+y**2+z**2))+4.00*exp(-2.00*(x**2+y**2+z**2)))"
        );

        let px = cartesian_prefactor(&origin, None, 1, 0, 0);
        let p = contracted(&px, &primitives(&[(0.5, 2.0)]), &origin.r2());
        assert_eq!(p.render(1), "(x*2.0*exp(-0.5*(x**2+y**2+z**2)))");
    }

    #[test]
    fn s_function_at_origin_is_a_plain_gaussian() {
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let alpha = rng.gen_range(0.05..5.0);
            let coefficient = rng.gen_range(-2.0..2.0);
            let function = BasisFunction {
                contraction: Contraction::from_iter([Primitive { alpha, coefficient }]),
                angular: Angular::Spherical { l: 0, ml: 0 },
                radial: RadialKind::Gaussian,
                position: Vector3::zeros(),
            };
            let expr = basis_function_expression(&function, None).unwrap();

            let (x, y, z) = (
                rng.gen_range(-2.0..2.0),
                rng.gen_range(-2.0..2.0),
                rng.gen_range(-2.0..2.0),
            );
            let expected = coefficient * (-alpha * (x * x + y * y + z * z)).exp();
            assert_relative_eq!(expr.eval(x, y, z), expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn spherical_and_cartesian_p_functions_agree() {
        let position = Vector3::new(0.3, -1.2, 0.8);
        let contraction = Contraction::from_iter(primitives(&[(1.2, 0.4), (0.3, 0.7)]));
        let spherical = BasisFunction {
            contraction: contraction.clone(),
            angular: Angular::Spherical { l: 1, ml: -1 },
            radial: RadialKind::Gaussian,
            position,
        };
        let cartesian = BasisFunction {
            angular: Angular::Cartesian(0, 1, 0),
            ..spherical.clone()
        };

        let a = basis_function_expression(&spherical, None).unwrap();
        let b = basis_function_expression(&cartesian, None).unwrap();
        assert_eq!(a, b);
        assert_relative_eq!(a.eval(0.1, 0.2, 0.3), b.eval(0.1, 0.2, 0.3));
    }
}
