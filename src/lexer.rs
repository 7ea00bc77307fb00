use logos::Lexer;

pub use categories::*;

/// Value of an integer literal. Literals past `i64` keep their nearest `f64`.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum IntLit {
    Small(i64),
    Big(f64),
}

/// Parses an integer literal, skipping its radix prefix and `_` separators.
fn int_literal(lex: &mut Lexer<Token>, radix: u32) -> Option<IntLit> {
    let slice = lex.slice();
    let digits: String = match radix {
        10 => slice,
        _ => &slice[2..],
    }
    .chars()
    .filter(|c| *c != '_')
    .collect();
    if let Ok(small) = i64::from_str_radix(&digits, radix) {
        return Some(IntLit::Small(small));
    }
    if radix == 10 {
        return digits.parse().ok().map(IntLit::Big);
    }
    if let Ok(wide) = u128::from_str_radix(&digits, radix) {
        return Some(IntLit::Big(wide as f64));
    }
    digits
        .chars()
        .try_fold(0.0, |acc: f64, c| {
            Some(acc * radix as f64 + c.to_digit(radix)? as f64)
        })
        .map(IntLit::Big)
}
fn float_literal(lex: &mut Lexer<Token>) -> Option<f64> {
    lex.slice().replace('_', "").parse().ok()
}

/// Lexer token
#[derive(logos::Logos, Debug, PartialEq, Clone, Copy)]
#[logos(skip r"([ \t\r\n\f]+|#[^\n]*)")]
#[logos(subpattern digits = r"[0-9](_?[0-9])*")]
#[logos(subpattern exponent = r"[eE][+-]?(?&digits)")]
pub enum Token {
    // LITERALS --------------------------------------------
    /// Floating point literal (`1.5`, `1.`, `.5`, `1e3`, `1_000.5`)
    #[regex(r"(?&digits)\.(?&digits)?(?&exponent)?", float_literal)]
    #[regex(r"\.(?&digits)(?&exponent)?", float_literal)]
    #[regex(r"(?&digits)(?&exponent)", float_literal)]
    FloatLit(f64),
    /// Integer literal in decimal, hex, octal or binary, any size
    #[regex(r"[1-9](_?[0-9])*|0(_?0)*", |lex| int_literal(lex, 10))]
    #[regex(r"0[xX](_?[0-9a-fA-F])+", |lex| int_literal(lex, 16))]
    #[regex(r"0[oO](_?[0-7])+", |lex| int_literal(lex, 8))]
    #[regex(r"0[bB](_?[01])+", |lex| int_literal(lex, 2))]
    IntegerLit(IntLit),
    /// Imaginary literal (`1j`, `2.5J`)
    #[regex(r"((?&digits)(\.(?&digits)?)?(?&exponent)?|\.(?&digits)(?&exponent)?)[jJ]")]
    ImaginaryLit,
    /// Single line string literal, either quote style
    #[regex(r#""[^"\n]*""#)]
    #[regex(r"'[^'\n]*'")]
    StringLit,
    #[token("True")]
    True,
    #[token("False")]
    False,
    #[token("None")]
    NoneLit,

    // IDENTIFIERS -----------------------------------------
    /// Variable identifier
    #[regex("[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    // KEYWORDS --------------------------------------------
    #[token("import")]
    Import,
    #[token("from")]
    From,
    #[token("lambda")]
    Lambda,
    #[token("not")]
    Not,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("in")]
    In,
    #[token("is")]
    Is,

    // SEPERATORS ------------------------------------------
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,
    #[token("=")]
    Assign,

    // COMPARISON OPERATORS --------------------------------
    #[token("==")]
    Eq,
    #[token("!=")]
    NotEq,
    #[token(">=")]
    Ge,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token("<")]
    Lt,

    // OPERATORS -------------------------------------------
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Mul,
    #[token("/")]
    Div,
    #[token("**")]
    Pow,
    #[token("//")]
    FloorDiv,
    #[token("%")]
    Mod,
    #[token("@")]
    MatMul,
    #[token("&")]
    BitAnd,
    #[token("|")]
    BitOr,
    #[token("^")]
    BitXor,
    #[token("~")]
    Invert,
    #[token("<<")]
    LShift,
    #[token(">>")]
    RShift,

    // Reserved punctuation. Lex errors are also reported as `Invalid` by `LexIter`.
    #[regex(r"[{}$?!`\\]")]
    Invalid,
}
mod categories {
    use crate::ast::Opcode;

    use super::Token;
    use super::Token::*;
    impl Token {
        /// Tokens that close the expression currently being parsed.
        pub fn ends_expr(&self) -> bool {
            matches!(
                self,
                RParen | RBracket | Comma | Colon | Semicolon | Assign | Else
            )
        }
        /// Tokens that close a comma separated expression list.
        pub fn ends_list(&self) -> bool {
            matches!(self, RParen | RBracket | Semicolon | Assign | Colon)
        }
        pub fn prefix_opcode(&self) -> Option<Opcode> {
            match self {
                Minus => Some(Opcode::Neg),
                Plus => Some(Opcode::Pos),
                Invert => Some(Opcode::Invert),
                Not => Some(Opcode::Not),
                _ => None,
            }
        }
        pub fn infix_opcode(&self) -> Option<Opcode> {
            Some(match self {
                Plus => Opcode::Add,
                Minus => Opcode::Sub,
                Mul => Opcode::Mul,
                Div => Opcode::Div,
                Pow => Opcode::Pow,
                FloorDiv => Opcode::FloorDiv,
                Mod => Opcode::Mod,
                MatMul => Opcode::MatMul,
                BitAnd => Opcode::BitAnd,
                BitOr => Opcode::BitOr,
                BitXor => Opcode::BitXor,
                LShift => Opcode::LShift,
                RShift => Opcode::RShift,
                Eq => Opcode::Eq,
                NotEq => Opcode::NotEq,
                Lt => Opcode::Lt,
                Le => Opcode::Le,
                Gt => Opcode::Gt,
                Ge => Opcode::Ge,
                In => Opcode::In,
                Is => Opcode::Is,
                And => Opcode::And,
                Or => Opcode::Or,
                If => Opcode::IfExp,
                LParen => Opcode::Call,
                LBracket => Opcode::Subscript,
                Dot => Opcode::Attribute,
                _ => return None,
            })
        }
    }
}
