//! The restricted expression tree.
//!
//! An [`Expr`] can only hold numbers, the variables `X` and `Y`, the five arithmetic
//! operators and negation. Anything else is unrepresentable, so a tree that exists has
//! already passed the allow-list.
use std::{collections::BTreeSet, fmt};

use debug_tree::{AsTree, TreeBuilder, TreeConfig, TreeSymbols};

/// The two variables an expression may reference.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::AsRefStr,
    strum::Display,
)]
pub enum Var {
    X,
    Y,
}

/// Binary arithmetic operators, displayed with their source symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr, strum::Display)]
pub enum ArithOp {
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
}

#[derive(Debug, Clone, PartialEq, strum::AsRefStr)]
pub enum Expr {
    Constant(f64),
    Variable(Var),
    Binary(ArithOp, Box<Expr>, Box<Expr>),
    Negate(Box<Expr>),
}

impl Expr {
    pub fn binary(op: ArithOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }
    pub fn negate(operand: Expr) -> Self {
        Expr::Negate(Box::new(operand))
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        match self {
            Expr::Constant(_) | Expr::Variable(_) => 1,
            Expr::Binary(_, lhs, rhs) => 1 + lhs.depth().max(rhs.depth()),
            Expr::Negate(operand) => 1 + operand.depth(),
        }
    }

    pub fn variables(&self) -> BTreeSet<Var> {
        let mut vars = BTreeSet::new();
        self.collect_variables(&mut vars);
        vars
    }
    fn collect_variables(&self, vars: &mut BTreeSet<Var>) {
        match self {
            Expr::Constant(_) => {}
            Expr::Variable(v) => {
                vars.insert(*v);
            }
            Expr::Binary(_, lhs, rhs) => {
                lhs.collect_variables(vars);
                rhs.collect_variables(vars);
            }
            Expr::Negate(operand) => operand.collect_variables(vars),
        }
    }

    /// Draws the tree with box characters, one node per line.
    pub fn render_tree(&self) -> String {
        let mut builder = TreeBuilder::new();
        builder.set_config_override(TreeConfig::new().symbols(TreeSymbols::with_rounded()));
        self.recursive_dbg(&mut builder);
        builder.as_tree().string()
    }
    fn recursive_dbg(&self, builder: &mut TreeBuilder) {
        match self {
            Expr::Constant(v) => builder.add_leaf(&format!("{:?}", v)),
            Expr::Variable(v) => builder.add_leaf(v.as_ref()),
            Expr::Binary(op, lhs, rhs) => {
                let _b = builder.add_branch(&format!("{}: {}", self.as_ref(), op));
                lhs.recursive_dbg(builder);
                rhs.recursive_dbg(builder);
            }
            Expr::Negate(operand) => {
                let _b = builder.add_branch(self.as_ref());
                operand.recursive_dbg(builder);
            }
        }
    }
}

/// Fully parenthesised infix form. Trees with finite constants parse back to an equal tree.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(v) => write!(f, "{:?}", v),
            Expr::Variable(v) => write!(f, "{}", v),
            Expr::Binary(op, lhs, rhs) => write!(f, "({} {} {})", lhs, op, rhs),
            Expr::Negate(operand) => write!(f, "(-{})", operand),
        }
    }
}
