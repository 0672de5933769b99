use std::{collections::HashMap, sync::Arc};

use nalgebra::Vector3;
use smallvec::SmallVec;

use super::{power, Axis, Expr};

#[derive(Copy, Clone, Debug, PartialEq)]
enum Op {
    Const(f64),
    Var(Axis),
    /// pop n values, push their sum
    Add(u32),
    /// pop n values, push their product
    Mul(u32),
    PowI(i32),
    PowF(f64),
    Exp,
}

/// An [`Expr`] flattened into postfix instructions for a small stack machine.
///
/// Constant subtrees are folded during compilation, so evaluating a program
/// is cheaper than walking the tree it was compiled from.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    ops: Vec<Op>,
    max_depth: usize,
}

impl Program {
    pub fn compile(expr: &Expr) -> Self {
        let mut ops = Vec::with_capacity(expr.node_count());
        emit(&fold(expr), &mut ops);

        let mut depth = 0usize;
        let mut max_depth = 0usize;
        for op in &ops {
            match op {
                Op::Const(_) | Op::Var(_) => depth += 1,
                Op::Add(n) | Op::Mul(n) => depth -= *n as usize - 1,
                Op::PowI(_) | Op::PowF(_) | Op::Exp => {}
            }
            max_depth = max_depth.max(depth);
        }

        log::trace!("compiled {} expression nodes into {} ops", expr.node_count(), ops.len());
        Self { ops, max_depth }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Deepest stack the program needs.
    pub fn depth(&self) -> usize {
        self.max_depth
    }

    pub fn eval(&self, x: f64, y: f64, z: f64) -> f64 {
        let point = [x, y, z];
        let mut stack = SmallVec::<[f64; 16]>::with_capacity(self.max_depth);

        for op in &self.ops {
            match *op {
                Op::Const(value) => stack.push(value),
                Op::Var(axis) => stack.push(point[axis.index()]),
                Op::Add(n) => {
                    let start = stack.len() - n as usize;
                    let value = stack[start..].iter().sum::<f64>();
                    stack.truncate(start);
                    stack.push(value);
                }
                Op::Mul(n) => {
                    let start = stack.len() - n as usize;
                    let value = stack[start..].iter().product::<f64>();
                    stack.truncate(start);
                    stack.push(value);
                }
                Op::PowI(exponent) => {
                    if let Some(top) = stack.last_mut() {
                        *top = top.powi(exponent);
                    }
                }
                Op::PowF(exponent) => {
                    if let Some(top) = stack.last_mut() {
                        *top = top.powf(exponent);
                    }
                }
                Op::Exp => {
                    if let Some(top) = stack.last_mut() {
                        *top = top.exp();
                    }
                }
            }
        }

        stack.pop().unwrap_or(0.0)
    }

    pub fn eval_point(&self, point: &Vector3<f64>) -> f64 {
        self.eval(point.x, point.y, point.z)
    }

    /// Evaluate at every point, in order.
    pub fn eval_many(&self, points: &[Vector3<f64>]) -> Vec<f64> {
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            points.par_iter().map(|point| self.eval_point(point)).collect()
        }
        #[cfg(not(feature = "rayon"))]
        {
            points.iter().map(|point| self.eval_point(point)).collect()
        }
    }
}

/// Fold constant subtrees, leaving the shape of the rest untouched.
fn fold(expr: &Expr) -> Expr {
    match expr {
        Expr::Constant(_) | Expr::Variable(_) => expr.clone(),
        Expr::Sum(terms) => {
            let (constants, mut rest): (Vec<_>, Vec<_>) =
                terms.iter().map(fold).partition(|term| matches!(term, Expr::Constant(_)));
            let total = constants.iter().map(constant_value).sum::<f64>();
            if rest.is_empty() {
                return Expr::Constant(total);
            }
            if total != 0.0 {
                rest.push(Expr::Constant(total));
            }
            Expr::sum(rest)
        }
        Expr::Product(factors) => {
            let (constants, mut rest): (Vec<_>, Vec<_>) =
                factors.iter().map(fold).partition(|factor| matches!(factor, Expr::Constant(_)));
            let total = constants.iter().map(constant_value).product::<f64>();
            if rest.is_empty() || total == 0.0 {
                return Expr::Constant(total);
            }
            if total != 1.0 {
                rest.insert(0, Expr::Constant(total));
            }
            Expr::product(rest)
        }
        Expr::Power(base, exponent) => match fold(base) {
            Expr::Constant(value) => Expr::Constant(power(value, *exponent)),
            base => Expr::pow(base, *exponent),
        },
        Expr::Exp(argument) => match fold(argument) {
            Expr::Constant(value) => Expr::Constant(value.exp()),
            argument => Expr::exp(argument),
        },
    }
}

fn constant_value(expr: &Expr) -> f64 {
    match expr {
        Expr::Constant(value) => *value,
        _ => unreachable!("partitioned on constants"),
    }
}

fn emit(expr: &Expr, ops: &mut Vec<Op>) {
    match expr {
        Expr::Constant(value) => ops.push(Op::Const(*value)),
        Expr::Variable(axis) => ops.push(Op::Var(*axis)),
        Expr::Sum(terms) => {
            terms.iter().for_each(|term| emit(term, ops));
            ops.push(Op::Add(terms.len() as u32));
        }
        Expr::Product(factors) => {
            factors.iter().for_each(|factor| emit(factor, ops));
            ops.push(Op::Mul(factors.len() as u32));
        }
        Expr::Power(base, exponent) => {
            emit(base, ops);
            if exponent.fract() == 0.0 && exponent.abs() <= i32::MAX as f64 {
                ops.push(Op::PowI(*exponent as i32));
            } else {
                ops.push(Op::PowF(*exponent));
            }
        }
        Expr::Exp(argument) => {
            emit(argument, ops);
            ops.push(Op::Exp);
        }
    }
}

/// Compiled programs keyed by their printed form.
///
/// The printed form includes every literal at the chosen precision, so two
/// basis functions that print identically share one program.
#[derive(Debug, Default)]
pub struct ProgramCache {
    programs: HashMap<String, Arc<Program>>,
    hits: usize,
}

impl ProgramCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compile(&mut self, expr: &Expr, precision: usize) -> Arc<Program> {
        let key = expr.render(precision);
        if let Some(program) = self.programs.get(&key) {
            self.hits += 1;
            return Arc::clone(program);
        }

        let program = Arc::new(Program::compile(expr));
        self.programs.insert(key, Arc::clone(&program));
        program
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Number of lookups answered without compiling.
    pub fn hits(&self) -> usize {
        self.hits
    }
}
