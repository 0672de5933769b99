//! Closed-form expressions in the three cartesian coordinates.
//!
//! Basis functions are built as [`Expr`] trees, printed with [`Expr::render`] and
//! compiled with [`Program::compile`] for repeated evaluation on grids.
mod program;
mod render;

use serde::{Deserialize, Serialize};

pub use program::{Program, ProgramCache};

/// A cartesian axis, doubling as the name of a free variable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub const fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }

    #[inline(always)]
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// Expression tree over the variables x, y and z.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Constant(f64),
    Variable(Axis),
    Sum(Vec<Expr>),
    Product(Vec<Expr>),
    Power(Box<Expr>, f64),
    Exp(Box<Expr>),
}

impl Expr {
    pub const ONE: Expr = Expr::Constant(1.0);

    pub fn constant(value: f64) -> Self {
        Self::Constant(value)
    }

    pub fn var(axis: Axis) -> Self {
        Self::Variable(axis)
    }

    /// Sum of `terms`. A single term is returned as is, no terms give zero.
    pub fn sum(terms: impl IntoIterator<Item = Expr>) -> Self {
        let mut terms = terms.into_iter().collect::<Vec<_>>();
        match terms.len() {
            0 => Self::Constant(0.0),
            1 => terms.remove(0),
            _ => Self::Sum(terms),
        }
    }

    /// Product of `factors`. A single factor is returned as is, no factors give one.
    pub fn product(factors: impl IntoIterator<Item = Expr>) -> Self {
        let mut factors = factors.into_iter().collect::<Vec<_>>();
        match factors.len() {
            0 => Self::ONE,
            1 => factors.remove(0),
            _ => Self::Product(factors),
        }
    }

    /// `base ** exponent`, folding the exponents 0 and 1.
    pub fn pow(base: Expr, exponent: f64) -> Self {
        if exponent == 0.0 {
            Self::ONE
        } else if exponent == 1.0 {
            base
        } else {
            Self::Power(Box::new(base), exponent)
        }
    }

    pub fn exp(argument: Expr) -> Self {
        Self::Exp(Box::new(argument))
    }

    pub fn sqrt(self) -> Self {
        Self::pow(self, 0.5)
    }

    /// Evaluate the tree directly at `(x, y, z)`.
    pub fn eval(&self, x: f64, y: f64, z: f64) -> f64 {
        self.eval_at(&[x, y, z])
    }

    fn eval_at(&self, point: &[f64; 3]) -> f64 {
        match self {
            Expr::Constant(value) => *value,
            Expr::Variable(axis) => point[axis.index()],
            Expr::Sum(terms) => terms.iter().map(|term| term.eval_at(point)).sum(),
            Expr::Product(factors) => factors.iter().map(|factor| factor.eval_at(point)).product(),
            Expr::Power(base, exponent) => power(base.eval_at(point), *exponent),
            Expr::Exp(argument) => argument.eval_at(point).exp(),
        }
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        1 + match self {
            Expr::Constant(_) | Expr::Variable(_) => 0,
            Expr::Sum(children) | Expr::Product(children) => {
                children.iter().map(Expr::node_count).sum()
            }
            Expr::Power(child, _) | Expr::Exp(child) => child.node_count(),
        }
    }
}

#[inline(always)]
pub(crate) fn power(base: f64, exponent: f64) -> f64 {
    if exponent.fract() == 0.0 && exponent.abs() <= i32::MAX as f64 {
        base.powi(exponent as i32)
    } else {
        base.powf(exponent)
    }
}

/// Round `value` to `precision` decimal places, so that evaluation agrees with
/// the printed literal.
pub fn round_to(value: f64, precision: usize) -> f64 {
    let scale = 10f64.powi(precision.min(15) as i32);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{round_to, Axis, Expr};

    #[test]
    fn smart_constructors_fold_trivial_cases() {
        assert_eq!(Expr::pow(Expr::var(Axis::X), 0.0), Expr::ONE);
        assert_eq!(Expr::pow(Expr::var(Axis::X), 1.0), Expr::var(Axis::X));
        assert_eq!(Expr::product([]), Expr::ONE);
        assert_eq!(Expr::sum([Expr::var(Axis::Z)]), Expr::var(Axis::Z));
        assert_eq!(Expr::sum([]), Expr::Constant(0.0));
    }

    #[test]
    fn tree_evaluation() {
        // 2 * x * y**2 * exp(-(z - 1))
        let expr = Expr::product([
            Expr::constant(2.0),
            Expr::var(Axis::X),
            Expr::pow(Expr::var(Axis::Y), 2.0),
            Expr::exp(Expr::product([
                Expr::constant(-1.0),
                Expr::sum([Expr::var(Axis::Z), Expr::constant(-1.0)]),
            ])),
        ]);

        assert_relative_eq!(expr.eval(0.5, 3.0, 2.0), 9.0 * (-1.0f64).exp(), epsilon = 1e-14);
        assert_eq!(expr.node_count(), 11);
    }

    #[test]
    fn square_root_of_sum() {
        let r = Expr::sum([
            Expr::pow(Expr::var(Axis::X), 2.0),
            Expr::pow(Expr::var(Axis::Y), 2.0),
        ])
        .sqrt();
        assert_relative_eq!(r.eval(3.0, 4.0, 100.0), 5.0);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(-2.1111111, 4), -2.1111);
        assert_eq!(round_to(0.49, 0), 0.0);
    }
}
