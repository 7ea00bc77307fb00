//! A calculation request: two expressions evaluated against one `X`/`Y` binding, with
//! every field supplied as raw text.
use serde::{ser::SerializeSeq, Deserialize, Serialize, Serializer};
use thiserror::Error;
use tracing::debug;

use crate::{
    error::{CalcError, ErrorKind},
    eval::{evaluate, Environment},
    expr::{Expr, Var},
    ast::parse_manager::MAX_NESTING,
    translate::{parse, parse_with_depth, ParseError},
};

pub const DEFAULT_EXPR1: &str = "X**2";
pub const DEFAULT_EXPR2: &str = "2*Y";

/// Parses the two default expressions.
pub fn default_trees() -> Result<(Expr, Expr), ParseError> {
    Ok((parse(DEFAULT_EXPR1)?, parse(DEFAULT_EXPR2)?))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalcRequest {
    #[serde(rename = "X", default)]
    pub x: String,
    #[serde(rename = "Y", default)]
    pub y: String,
    #[serde(default)]
    pub expr1: String,
    #[serde(default)]
    pub expr2: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Longest accepted expression, in bytes.
    pub max_expr_len: usize,
    /// Deepest accepted nesting of parentheses, prefix operators and `**` chains.
    pub max_depth: usize,
}
impl Default for Limits {
    fn default() -> Self {
        Self {
            max_expr_len: 1000,
            max_depth: MAX_NESTING,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("enter numeric values for X and Y ({var} was {value:?})")]
    InvalidNumber { var: Var, value: String },
    #[error("expression is {len} bytes long, the limit is {limit}")]
    TooLong { len: usize, limit: usize },
    #[error("error evaluating expressions: {0}")]
    Calc(#[from] CalcError),
}
impl RequestError {
    /// The core error kind, if the failure came from parsing or evaluation.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            RequestError::Calc(e) => Some(e.kind()),
            _ => None,
        }
    }
}
impl From<ParseError> for RequestError {
    fn from(value: ParseError) -> Self {
        RequestError::Calc(value.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalcResponse {
    #[serde(rename = "X")]
    pub x: String,
    #[serde(rename = "Y")]
    pub y: String,
    pub expr1: String,
    pub expr2: String,
    #[serde(serialize_with = "serialize_results")]
    pub results: Vec<f64>,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
}
impl CalcResponse {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// JSON has no infinities or NaN, so those are written as strings.
fn serialize_results<S: Serializer>(results: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(results.len()))?;
    for value in results {
        if value.is_finite() {
            seq.serialize_element(value)?;
        } else {
            seq.serialize_element(&format_value(*value))?;
        }
    }
    seq.end()
}

/// Renders a result the way the text report shows it: `9.0`, `inf`, `-inf`, `NaN`.
pub fn format_value(value: f64) -> String {
    format!("{:?}", value)
}

/// Falls back to `default` when the field is blank.
fn expression_or<'a>(field: &'a str, default: &'a str) -> &'a str {
    match field.trim() {
        "" => default,
        expr => expr,
    }
}

/// Parses a number the way Python's `float()` does: surrounding whitespace is ignored and
/// single `_` separators are allowed between digits.
fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    let bytes = text.as_bytes();
    let separators_ok = bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'_')
        .all(|(i, _)| {
            i > 0
                && bytes[i - 1].is_ascii_digit()
                && bytes.get(i + 1).is_some_and(u8::is_ascii_digit)
        });
    if !separators_ok {
        return None;
    }
    text.replace('_', "").parse().ok()
}

/// Converts the two text fields into bindings for `X` and `Y`.
pub fn bindings(x: &str, y: &str) -> Result<Environment, RequestError> {
    let number = |var: Var, value: &str| {
        parse_number(value).ok_or_else(|| RequestError::InvalidNumber {
            var,
            value: value.to_owned(),
        })
    };
    Ok(Environment::new(number(Var::X, x)?, number(Var::Y, y)?))
}

/// Parses every expression first, then evaluates them in order against `env`.
pub fn calculate(
    exprs: &[&str],
    env: &Environment,
    limits: &Limits,
) -> Result<Vec<f64>, RequestError> {
    let trees = exprs
        .iter()
        .map(|expr| {
            if expr.len() > limits.max_expr_len {
                return Err(RequestError::TooLong {
                    len: expr.len(),
                    limit: limits.max_expr_len,
                });
            }
            Ok(parse_with_depth(expr, limits.max_depth)?)
        })
        .collect::<Result<Vec<_>, _>>()?;
    trees
        .iter()
        .map(|tree| evaluate(tree, env).map_err(|e| RequestError::Calc(e.into())))
        .collect()
}

/// Runs a whole request. Failures are reported in the response, never as partial results.
pub fn handle(request: &CalcRequest, limits: &Limits) -> CalcResponse {
    let expr1 = expression_or(&request.expr1, DEFAULT_EXPR1);
    let expr2 = expression_or(&request.expr2, DEFAULT_EXPR2);
    debug!(x = %request.x, y = %request.y, expr1, expr2, "handling request");

    let outcome = bindings(&request.x, &request.y)
        .and_then(|env| calculate(&[expr1, expr2], &env, limits));
    let mut response = CalcResponse {
        x: request.x.clone(),
        y: request.y.clone(),
        expr1: expr1.to_owned(),
        expr2: expr2.to_owned(),
        results: Vec::new(),
        error: None,
        error_kind: None,
    };
    match outcome {
        Ok(results) => response.results = results,
        Err(e) => {
            debug!(error = %e, "request failed");
            response.error_kind = e.kind();
            response.error = Some(e.to_string());
        }
    }
    response
}
