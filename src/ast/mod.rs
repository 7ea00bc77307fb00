//! Generic parse tree for a Python-flavoured expression language.
//!
//! This tree is deliberately broader than what `xycalc` evaluates: it represents calls,
//! comparisons, strings, lambdas, imports and so on, so that the translator (not the
//! parser) is the component that decides what is allowed.
pub mod parse_manager;

use anyhow::{bail, Context, Result};
//Re-export stuff from private scopes (used to keep enum name collisions down)
pub use bp::*;

use compact_str::CompactString;
use debug_tree::{AsTree, TreeBuilder, TreeConfig, TreeSymbols};

use std::{
    fmt::Debug,
    num::NonZeroU32,
    ops::{Deref, Index},
};
use thin_vec::ThinVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ASTNodeId(NonZeroU32);

#[derive(Clone, Debug, strum::AsRefStr, strum::IntoStaticStr)]
pub enum ASTNode {
    Val(Value),
    Binary(ASTNodeId, ASTNodeId, BinaryOp),
    // Unary operations
    Unary(ASTNodeId, UnaryOp),

    Call(ASTNodeId, ThinVec<ASTNodeId>), // Callee with its list of arguments
    Attribute(ASTNodeId, Ident),
    Subscript(ASTNodeId, ASTNodeId),

    List(ThinVec<ASTNodeId>),
    Tuple(ThinVec<ASTNodeId>),

    Lambda(ThinVec<Ident>, ASTNodeId),
    IfExp {
        test: ASTNodeId,
        body: ASTNodeId,
        orelse: ASTNodeId,
    },

    // Statements
    Expr(ASTNodeId),
    Assign(ASTNodeId, ASTNodeId),
    Import(ThinVec<Ident>),
    ImportFrom(Ident, ThinVec<Ident>),
    Module(ThinVec<ASTNodeId>),
}

mod ast_impl {
    use anyhow::{bail, Result};

    use super::{ASTNode as AN, ASTNodeId, BinaryOp as B, Opcode as OP, UnaryOp as U};

    impl AN {
        pub fn new_simple_binary(op: OP, arg0: ASTNodeId, arg1: ASTNodeId) -> Result<Self> {
            Ok(AN::Binary(
                arg0,
                arg1,
                match op {
                    OP::Add => B::Add,
                    OP::Sub => B::Sub,
                    OP::Mul => B::Mul,
                    OP::Div => B::Div,
                    OP::Pow => B::Pow,
                    OP::FloorDiv => B::FloorDiv,
                    OP::Mod => B::Mod,
                    OP::MatMul => B::MatMul,
                    OP::BitAnd => B::BitAnd,
                    OP::BitOr => B::BitOr,
                    OP::BitXor => B::BitXor,
                    OP::LShift => B::LShift,
                    OP::RShift => B::RShift,
                    OP::Eq => B::Eq,
                    OP::NotEq => B::NotEq,
                    OP::Lt => B::Lt,
                    OP::Le => B::Le,
                    OP::Gt => B::Gt,
                    OP::Ge => B::Ge,
                    OP::In => B::In,
                    OP::Is => B::Is,
                    OP::And => B::And,
                    OP::Or => B::Or,
                    t => bail!("{:?} not a binary operation", t),
                },
            ))
        }
        pub fn new_simple_unary(op: OP, inner: ASTNodeId) -> Result<Self> {
            Ok(AN::Unary(
                inner,
                match op {
                    OP::Neg => U::Neg,
                    OP::Pos => U::Pos,
                    OP::Invert => U::Invert,
                    OP::Not => U::Not,
                    t => bail!("{:?} not a unary operation", t),
                },
            ))
        }
    }
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::IntoStaticStr)]
pub enum UnaryOp {
    #[strum(serialize = "-")]
    Neg,
    #[strum(serialize = "+")]
    Pos,
    #[strum(serialize = "~")]
    Invert,
    #[strum(serialize = "not")]
    Not,
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::IntoStaticStr)]
pub enum BinaryOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "**")]
    Pow,
    #[strum(serialize = "//")]
    FloorDiv,
    #[strum(serialize = "%")]
    Mod,
    #[strum(serialize = "@")]
    MatMul,
    #[strum(serialize = "&")]
    BitAnd,
    #[strum(serialize = "|")]
    BitOr,
    #[strum(serialize = "^")]
    BitXor,
    #[strum(serialize = "<<")]
    LShift,
    #[strum(serialize = ">>")]
    RShift,
    // comparisons, chained ones are folded to the left
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    NotEq,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    Ge,
    #[strum(serialize = "in")]
    In,
    #[strum(serialize = "is")]
    Is,
    // boolean
    #[strum(serialize = "and")]
    And,
    #[strum(serialize = "or")]
    Or,
}

#[derive(Clone, PartialEq)]
pub enum Value {
    Ident(Ident),
    ConstantI64(i64),
    /// Integer literal too large for `i64`, kept as its nearest `f64`
    LargeInt(f64),
    ConstantF64(f64),
    /// Imaginary literal as written, e.g. `2j`
    Imaginary(CompactString),
    Str(CompactString),
    Bool(bool),
    NoneLit,
}
impl Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Ident(a) => f.write_str(a.as_str()),
            Value::ConstantF64(a) => a.fmt(f),
            Value::ConstantI64(a) => a.fmt(f),
            Value::LargeInt(a) => write!(f, "{:.0}", a),
            Value::Imaginary(a) => f.write_str(a.as_str()),
            Value::Str(a) => a.as_str().fmt(f),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::NoneLit => f.write_str("None"),
        }
    }
}
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Ident(CompactString);
impl Ident {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}
impl Deref for Ident {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::ConstantI64(value)
    }
}
impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::ConstantF64(value)
    }
}
impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Ident(value.into())
    }
}
impl From<&str> for Ident {
    fn from(value: &str) -> Self {
        Ident(value.into())
    }
}
impl From<String> for Ident {
    fn from(value: String) -> Self {
        Ident(value.into())
    }
}
#[derive(Clone, Default)]
pub struct AST {
    pub store: Vec<ASTNode>,
    pub root: Option<ASTNodeId>,
}
impl AST {
    pub fn new() -> Self {
        Self {
            store: Vec::with_capacity(10),
            root: None,
        }
    }
    pub fn place(&mut self, node: ASTNode) -> ASTNodeId {
        self.store.push(node);
        // ids are 1-based so that `Option<ASTNodeId>` stays pointer sized
        ASTNodeId(NonZeroU32::MIN.saturating_add(self.store.len() as u32 - 1))
    }
    pub fn get_node(&self, idx: ASTNodeId) -> Result<&ASTNode> {
        self.store
            .get(idx.0.get() as usize - 1)
            .context("invalid AST node reference")
    }
    pub fn root_node(&self) -> Result<&ASTNode> {
        self.get_node(self.root.context("AST has no root")?)
    }
    pub fn recursive_dbg(&self, builder: &mut TreeBuilder, nid: ASTNodeId) -> Result<()> {
        macro_rules! named_branch {
            ($bname:expr, $bctx:expr,$($child:expr),+) => {
                {let b = builder.add_branch(&format!("{}: {}", $bname, $bctx));
                $(
                self.recursive_dbg(builder, *$child)?;
                )*
                b}
            };
        }
        macro_rules! named_branch_list {
            ($bname:expr, $bctx:expr,$children:expr) => {{
                let b = builder.add_branch(&format!("{}: {}", $bname, $bctx));
                for child in $children {
                    self.recursive_dbg(builder, *child)?;
                }
                b
            }};
        }
        fn joined(names: &[Ident]) -> String {
            names
                .iter()
                .map(Ident::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        }

        let n = self.get_node(nid)?;
        match n {
            ASTNode::Val(v) => {
                builder.add_leaf(&format!("{:?}", v));
                return Ok(());
            }
            ASTNode::Import(names) => {
                builder.add_leaf(&format!("Import: {}", joined(names)));
                return Ok(());
            }
            ASTNode::ImportFrom(module, names) => {
                builder.add_leaf(&format!("ImportFrom {}: {}", module.as_str(), joined(names)));
                return Ok(());
            }
            _ => {}
        }
        let name = n.as_ref();
        let _s = match n {
            ASTNode::Binary(a, b, c) => named_branch!(name, c.as_ref(), a, b),
            ASTNode::Unary(a, c) => named_branch!(name, c.as_ref(), a),
            ASTNode::Call(f, args) => {
                let b = builder.add_branch(name);
                self.recursive_dbg(builder, *f)?;
                for arg in args {
                    self.recursive_dbg(builder, *arg)?;
                }
                b
            }
            ASTNode::Attribute(a, i) => named_branch!(name, i.as_str(), a),
            ASTNode::Subscript(a, i) => named_branch!(name, "", a, i),
            ASTNode::List(v) | ASTNode::Tuple(v) | ASTNode::Module(v) => {
                named_branch_list!(name, v.len(), v)
            }
            ASTNode::Lambda(params, body) => named_branch!(name, joined(params), body),
            ASTNode::IfExp { test, body, orelse } => named_branch!(name, "", test, body, orelse),
            ASTNode::Expr(a) => named_branch!(name, "", a),
            ASTNode::Assign(t, v) => named_branch!(name, "", t, v),
            _t => {
                bail!("incorrect AST node")
            }
        };
        Ok(())
    }
}
impl Index<ASTNodeId> for AST {
    type Output = ASTNode;
    fn index(&self, index: ASTNodeId) -> &Self::Output {
        &self.store[index.0.get() as usize - 1]
    }
}
impl Debug for AST {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Some(root) = self.root else {
            return f.write_str("<empty AST>");
        };
        f.write_str("\n")?;
        let mut builder = TreeBuilder::new();
        builder.set_config_override(TreeConfig::new().symbols(TreeSymbols::with_rounded()));
        self.recursive_dbg(&mut builder, root)
            .map_err(|_| std::fmt::Error)?;
        f.write_str(&builder.as_tree().string())?;
        Ok(())
    }
}

//Opcode structure for simple in/pre/postfix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    FloorDiv,
    Mod,
    MatMul,
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    Is,
    And,
    Or,
    Neg,
    Pos,
    Invert,
    Not,
    IfExp,
    Call,
    Subscript,
    Attribute,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InfixBP {
    pub left: u8,
    pub right: u8,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrefixBP(u8);
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PostfixBP(u8);
impl Deref for PrefixBP {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl Deref for PostfixBP {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
mod bp {
    use anyhow::{bail, Result};

    use super::{InfixBP, Opcode, Opcode::*, PostfixBP, PrefixBP};
    // Loosest to tightest: ternary, or, and, not, comparisons, |, ^, &, shifts,
    // additive, multiplicative, unary, **, postfix.
    impl Opcode {
        pub fn infix_bp(&self) -> Result<InfixBP> {
            match self {
                IfExp => Ok(InfixBP { left: 2, right: 1 }),
                Or => Ok(InfixBP { left: 3, right: 4 }),
                And => Ok(InfixBP { left: 5, right: 6 }),
                Eq | NotEq | Lt | Le | Gt | Ge | In | Is => Ok(InfixBP { left: 9, right: 10 }),
                BitOr => Ok(InfixBP { left: 11, right: 12 }),
                BitXor => Ok(InfixBP { left: 13, right: 14 }),
                BitAnd => Ok(InfixBP { left: 15, right: 16 }),
                LShift | RShift => Ok(InfixBP { left: 17, right: 18 }),
                Add | Sub => Ok(InfixBP { left: 19, right: 20 }),
                Mul | Div | FloorDiv | Mod | MatMul => Ok(InfixBP { left: 21, right: 22 }),
                // right associative, and binds tighter than a unary operator on its left
                Pow => Ok(InfixBP { left: 25, right: 24 }),
                t => bail!("bad op: {:?}", t),
            }
        }
        pub fn prefix_bp(&self) -> Result<PrefixBP> {
            match self {
                Not => Ok(PrefixBP(7)),
                Neg | Pos | Invert => Ok(PrefixBP(23)),
                t => bail!("bad op: {:?}", t),
            }
        }
        pub fn postfix_bp(&self) -> Result<PostfixBP> {
            match self {
                Call | Subscript | Attribute => Ok(PostfixBP(27)),
                t => bail!("bad op: {:?}", t),
            }
        }
    }
}
