//! Safe evaluation of short arithmetic expressions over the variables `X` and `Y`.
//!
//! Text goes through a general purpose expression parser ([`ast`]), is translated into a
//! restricted tree that can only hold `+ - * / **`, negation, numbers, `X` and `Y`
//! ([`translate`]), and is then evaluated against a binding of the two variables ([`eval`]).
pub mod ast;
pub mod error;
pub mod eval;
pub mod expr;
pub mod lexer;
pub mod request;
pub mod translate;
pub mod util;

pub use error::{CalcError, ErrorKind};
pub use eval::{evaluate, Environment, EvalError};
pub use expr::{ArithOp, Expr, Var};
pub use translate::{parse, parse_with_depth, ParseError};

#[cfg(test)]
mod tests;
