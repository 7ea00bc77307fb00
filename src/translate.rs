//! Translation from the generic parse tree into the restricted [`Expr`] tree.
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    ast::{
        parse_manager::{ParseManager, MAX_NESTING},
        ASTNode, ASTNodeId, BinaryOp, UnaryOp, Value, AST,
    },
    error::ErrorKind,
    expr::{ArithOp, Expr, Var},
};

/// Generic binary operators that may appear in an expression, and what they become.
pub const ALLOWED_BINARY_OPS: [(BinaryOp, ArithOp); 5] = [
    (BinaryOp::Add, ArithOp::Add),
    (BinaryOp::Sub, ArithOp::Sub),
    (BinaryOp::Mul, ArithOp::Mul),
    (BinaryOp::Div, ArithOp::Div),
    (BinaryOp::Pow, ArithOp::Pow),
];
/// Names that may appear in an expression. Matching is case sensitive.
pub const ALLOWED_VARIABLES: [Var; 2] = [Var::X, Var::Y];
/// Deepest tree the translator builds. Left-leaning chains such as `X + X + ...` do not
/// nest in the parser, so they are bounded here instead.
pub const MAX_TREE_DEPTH: usize = 1000;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("expression is empty")]
    EmptyExpression,
    #[error("invalid syntax in `{expr}`: {detail}")]
    Syntax { expr: String, detail: String },
    #[error("operator `{op}` is not allowed in `{expr}`")]
    DisallowedOperator { op: &'static str, expr: String },
    #[error("only numbers are allowed as constants, found {found} in `{expr}`")]
    InvalidConstant { found: String, expr: String },
    #[error("only the variables X and Y are allowed, found `{name}` in `{expr}`")]
    DisallowedVariable { name: String, expr: String },
    #[error("unsupported syntax {kind} in `{expr}`")]
    UnsupportedNode { kind: &'static str, expr: String },
}
impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::EmptyExpression => ErrorKind::EmptyExpression,
            ParseError::Syntax { .. } => ErrorKind::Syntax,
            ParseError::DisallowedOperator { .. } => ErrorKind::DisallowedOperator,
            ParseError::InvalidConstant { .. } => ErrorKind::InvalidConstant,
            ParseError::DisallowedVariable { .. } => ErrorKind::DisallowedVariable,
            ParseError::UnsupportedNode { .. } => ErrorKind::UnsupportedNode,
        }
    }
}

/// Parses `text` as a single expression over `X` and `Y`.
///
/// Surrounding whitespace is ignored. Anything outside `+ - * / **`, unary `-`, numeric
/// literals and the two variable names is rejected.
pub fn parse(text: &str) -> Result<Expr, ParseError> {
    parse_with_depth(text, MAX_NESTING)
}

/// [`parse`] with a custom limit on parser nesting.
pub fn parse_with_depth(text: &str, max_depth: usize) -> Result<Expr, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::EmptyExpression);
    }
    let result = ParseManager::from_source(text)
        .with_max_depth(max_depth)
        .parse()
        .map_err(|e| ParseError::Syntax {
            expr: text.to_owned(),
            detail: format!("{:#}", e),
        })
        .and_then(|ast| {
            let tree = Translator::new(&ast, text).translate()?;
            // only logged once the translator has bounded its depth
            trace!(?ast, "parsed");
            Ok(tree)
        });
    if let Err(e) = &result {
        debug!(kind = %e.kind(), expr = text, "rejected expression");
    }
    result
}

/// Walks a generic [`AST`] and rebuilds it as an [`Expr`], enforcing the allow-lists.
#[derive(Debug)]
pub struct Translator<'borrow> {
    ast: &'borrow AST,
    source: &'borrow str,
}

impl<'borrow> Translator<'borrow> {
    pub fn new(ast: &'borrow AST, source: &'borrow str) -> Self {
        Self { ast, source }
    }
    pub fn translate(&self) -> Result<Expr, ParseError> {
        let root = self.ast.root.ok_or_else(|| ParseError::Syntax {
            expr: self.source.to_owned(),
            detail: "nothing was parsed".to_owned(),
        })?;
        self.rec_translate(root, 0)
    }
    fn rec_translate(&self, node: ASTNodeId, depth: usize) -> Result<Expr, ParseError> {
        if depth >= MAX_TREE_DEPTH {
            return Err(ParseError::Syntax {
                expr: self.source.to_owned(),
                detail: format!("expression is more than {} levels deep", MAX_TREE_DEPTH),
            });
        }
        let depth = depth + 1;
        let res = match &self.ast[node] {
            // expression statement wrapping the whole input
            ASTNode::Expr(inner) => self.rec_translate(*inner, depth)?,
            ASTNode::Binary(lhs, rhs, op) => {
                let op = ALLOWED_BINARY_OPS
                    .iter()
                    .find(|(generic, _)| generic == op)
                    .map(|(_, arith)| *arith)
                    .ok_or_else(|| self.disallowed_operator(op.into()))?;
                Expr::binary(
                    op,
                    self.rec_translate(*lhs, depth)?,
                    self.rec_translate(*rhs, depth)?,
                )
            }
            ASTNode::Unary(operand, UnaryOp::Neg) => {
                Expr::negate(self.rec_translate(*operand, depth)?)
            }
            ASTNode::Unary(_, op) => return Err(self.disallowed_operator(op.into())),
            ASTNode::Val(v) => match v {
                Value::ConstantI64(i) => Expr::Constant(*i as f64),
                Value::LargeInt(f) | Value::ConstantF64(f) => Expr::Constant(*f),
                Value::Ident(name) => Expr::Variable(
                    ALLOWED_VARIABLES
                        .into_iter()
                        .find(|var| var.as_ref() == name.as_str())
                        .ok_or_else(|| ParseError::DisallowedVariable {
                            name: name.to_string(),
                            expr: self.source.to_owned(),
                        })?,
                ),
                other => {
                    return Err(ParseError::InvalidConstant {
                        found: format!("{:?}", other),
                        expr: self.source.to_owned(),
                    })
                }
            },
            other => {
                return Err(ParseError::UnsupportedNode {
                    kind: other.into(),
                    expr: self.source.to_owned(),
                })
            }
        };
        Ok(res)
    }
    fn disallowed_operator(&self, op: &'static str) -> ParseError {
        ParseError::DisallowedOperator {
            op,
            expr: self.source.to_owned(),
        }
    }
}
