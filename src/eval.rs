use std::collections::BTreeMap;

use shrinkwraprs::Shrinkwrap;
use thiserror::Error;
use tracing::trace;

use crate::{
    error::ErrorKind,
    expr::{ArithOp, Expr, Var},
};

/// Read-only variable bindings for one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Shrinkwrap)]
pub struct Environment(BTreeMap<Var, f64>);

impl Environment {
    /// Binds both variables.
    pub fn new(x: f64, y: f64) -> Self {
        Self::default().with(Var::X, x).with(Var::Y, y)
    }
    pub fn with(mut self, var: Var, value: f64) -> Self {
        self.0.insert(var, value);
        self
    }
    pub fn lookup(&self, var: Var) -> Result<f64, EvalError> {
        self.get(&var).copied().ok_or(EvalError::UnboundVariable(var))
    }
}
impl FromIterator<(Var, f64)> for Environment {
    fn from_iter<T: IntoIterator<Item = (Var, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("variable {0} has no value")]
    UnboundVariable(Var),
    /// Part of the shared error taxonomy. [`Expr`] is a closed enum, so trees built by
    /// this crate never produce it.
    #[error("cannot evaluate {0} node")]
    UnsupportedNode(&'static str),
}
impl EvalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::UnboundVariable(_) => ErrorKind::UnboundVariable,
            EvalError::UnsupportedNode(_) => ErrorKind::UnsupportedNode,
        }
    }
}

/// Reduces `tree` to a single value. Division by zero and undefined powers give
/// infinities or NaN, which are results rather than errors.
pub fn evaluate(tree: &Expr, env: &Environment) -> Result<f64, EvalError> {
    let value = rec_eval(tree, env)?;
    trace!(%tree, value, "evaluated");
    Ok(value)
}

fn rec_eval(node: &Expr, env: &Environment) -> Result<f64, EvalError> {
    Ok(match node {
        Expr::Constant(v) => *v,
        Expr::Variable(var) => env.lookup(*var)?,
        Expr::Binary(op, lhs, rhs) => {
            let lhs = rec_eval(lhs, env)?;
            let rhs = rec_eval(rhs, env)?;
            apply(*op, lhs, rhs)
        }
        Expr::Negate(operand) => -rec_eval(operand, env)?,
    })
}

fn apply(op: ArithOp, lhs: f64, rhs: f64) -> f64 {
    match op {
        ArithOp::Add => lhs + rhs,
        ArithOp::Sub => lhs - rhs,
        ArithOp::Mul => lhs * rhs,
        ArithOp::Div => lhs / rhs,
        ArithOp::Pow => lhs.powf(rhs),
    }
}
