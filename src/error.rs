use serde::Serialize;
use thiserror::Error;

use crate::{eval::EvalError, translate::ParseError};

/// Flat tag for every way parsing or evaluation can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr, strum::Display, Serialize)]
pub enum ErrorKind {
    EmptyExpression,
    Syntax,
    DisallowedOperator,
    InvalidConstant,
    DisallowedVariable,
    UnsupportedNode,
    UnboundVariable,
}

/// Either phase's failure, for callers that run parse and evaluate back to back.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}
impl CalcError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CalcError::Parse(e) => e.kind(),
            CalcError::Eval(e) => e.kind(),
        }
    }
}
