use std::fmt::Write;

use super::{round_to, Expr};

impl Expr {
    /// Print the expression with every numeric literal at `precision` decimals.
    ///
    /// Sums are always parenthesized, powers use `**` and exponentials print as
    /// `exp(...)`, so the output reads like
    /// `(1.00*exp(-1.00*(x**2+y**2+z**2))+4.00*exp(-2.00*(x**2+y**2+z**2)))`.
    pub fn render(&self, precision: usize) -> String {
        let mut out = String::new();
        self.write(&mut out, precision);
        out
    }

    fn write(&self, out: &mut String, precision: usize) {
        match self {
            Expr::Constant(value) => write_number(out, *value, precision),
            Expr::Variable(axis) => out.push_str(axis.name()),
            Expr::Sum(terms) => {
                // constants that print as zero are dropped, unless nothing else is left
                let visible = terms
                    .iter()
                    .filter(|term| !matches!(term, Expr::Constant(c) if round_to(*c, precision) == 0.0))
                    .collect::<Vec<_>>();
                let visible = if visible.is_empty() {
                    terms.iter().collect()
                } else {
                    visible
                };

                if let [Expr::Variable(axis)] = visible[..] {
                    out.push_str(axis.name());
                    return;
                }

                out.push('(');
                for (i, term) in visible.into_iter().enumerate() {
                    term.write_signed(out, precision, i == 0);
                }
                out.push(')');
            }
            Expr::Product(factors) => {
                for (i, factor) in factors.iter().enumerate() {
                    match factor {
                        Expr::Constant(value) if i == 0 => write_number(out, *value, precision),
                        _ => {
                            if i > 0 {
                                out.push('*');
                            }
                            factor.write_factor(out, precision);
                        }
                    }
                }
            }
            Expr::Power(base, exponent) => {
                base.write_base(out, precision);
                out.push_str("**");
                write_exponent(out, *exponent);
            }
            Expr::Exp(argument) => {
                out.push_str("exp(");
                argument.write(out, precision);
                out.push(')');
            }
        }
    }

    /// Write a term of a sum, folding a leading negative constant into the
    /// separating sign.
    fn write_signed(&self, out: &mut String, precision: usize, first: bool) {
        let negative = match self {
            Expr::Constant(value) => *value < 0.0,
            Expr::Product(factors) => matches!(factors.first(), Some(Expr::Constant(c)) if *c < 0.0),
            _ => false,
        };

        if negative {
            out.push('-');
            self.negated().write(out, precision);
        } else {
            if !first {
                out.push('+');
            }
            self.write(out, precision);
        }
    }

    /// Factors of a product: anything that would bind looser than `*` gets
    /// parentheses.
    fn write_factor(&self, out: &mut String, precision: usize) {
        let parenthesize = match self {
            Expr::Product(_) => true,
            Expr::Constant(value) => *value < 0.0,
            _ => false,
        };
        self.write_wrapped(out, precision, parenthesize);
    }

    /// Base of a power, which binds tighter than anything but a bare atom.
    fn write_base(&self, out: &mut String, precision: usize) {
        let parenthesize = match self {
            Expr::Product(_) | Expr::Power(..) => true,
            Expr::Constant(value) => *value < 0.0,
            _ => false,
        };
        self.write_wrapped(out, precision, parenthesize);
    }

    fn write_wrapped(&self, out: &mut String, precision: usize, parenthesize: bool) {
        if parenthesize {
            out.push('(');
            self.write(out, precision);
            out.push(')');
        } else {
            self.write(out, precision);
        }
    }

    fn negated(&self) -> Expr {
        match self {
            Expr::Constant(value) => Expr::Constant(-value),
            Expr::Product(factors) => {
                let mut factors = factors.clone();
                if let Some(Expr::Constant(c)) = factors.first_mut() {
                    *c = -*c;
                }
                Expr::Product(factors)
            }
            other => Expr::product([Expr::Constant(-1.0), other.clone()]),
        }
    }
}

fn write_number(out: &mut String, value: f64, precision: usize) {
    // `{:.p}` keeps the sign of negative zero, which reads badly in a polynomial
    let value = if value == 0.0 { 0.0 } else { value };
    let _ = write!(out, "{value:.precision$}");
}

fn write_exponent(out: &mut String, exponent: f64) {
    if exponent.fract() == 0.0 && exponent.abs() < 1e15 {
        let _ = write!(out, "{}", exponent as i64);
    } else {
        let _ = write!(out, "{exponent}");
    }
}
