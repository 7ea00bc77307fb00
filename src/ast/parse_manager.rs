use thin_vec::ThinVec;

use anyhow::{bail, Result};

use super::{ASTNode, ASTNodeId, Ident, Opcode, Value, AST};
use crate::{
    assert_token_matches, bad_token,
    lexer::{IntLit, Token},
    util::{
        multipeek::{IteratorExt, MultiPeek},
        LexIter,
    },
};

/// Default limit on how deeply expressions may nest (parentheses, prefix operators, `**` chains...).
pub const MAX_NESTING: usize = 100;

/// Pratt parser building an [`AST`] from a token stream.
pub struct ParseManager<'source> {
    pub lexer: MultiPeek<LexIter<'source>>,
    pub ast: AST,
    depth: usize,
    max_depth: usize,
}
impl<'a> ParseManager<'a> {
    pub fn new(lex: MultiPeek<LexIter<'a>>) -> Self {
        Self {
            lexer: lex,
            ast: AST::new(),
            depth: 0,
            max_depth: MAX_NESTING,
        }
    }
    pub fn from_source(source: &'a str) -> Self {
        Self::new(LexIter::from_source(source).multipeek())
    }
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
    /// Parses `;` separated statements. A single statement becomes the root on its own,
    /// several are wrapped in [`ASTNode::Module`].
    pub fn parse(mut self) -> Result<AST> {
        let mut statements = ThinVec::with_capacity(1);
        loop {
            let statement = self.parse_statement()?;
            statements.push(self.place(statement));
            match self.lexer.next() {
                None => break,
                // a statement must follow, `X;` is rejected
                Some((_, Token::Semicolon)) => {}
                Some((s, t)) => bad_token!(s, t, "expected end of statement"),
            }
        }
        let root = if statements.len() == 1 {
            statements[0]
        } else {
            self.place(ASTNode::Module(statements))
        };
        self.ast.root = Some(root);
        Ok(self.ast)
    }

    fn place(&mut self, node: ASTNode) -> ASTNodeId {
        self.ast.place(node)
    }
    pub fn parse_placed(&mut self, min_bp: u8) -> Result<ASTNodeId> {
        let s = self.parse_expr(min_bp)?;
        Ok(self.place(s))
    }
    fn parse_statement(&mut self) -> Result<ASTNode> {
        Ok(match self.lexer.peek_next_res()?.1 {
            Token::Import => {
                self.lexer.discard()?;
                ASTNode::Import(self.parse_import_names()?)
            }
            Token::From => {
                self.lexer.discard()?;
                let module = self.parse_dotted_name()?;
                assert_token_matches!(self.lexer, Token::Import);
                ASTNode::ImportFrom(module, self.parse_import_names()?)
            }
            _ => match self.parse_assignment()? {
                assign @ ASTNode::Assign(..) => assign,
                expr => ASTNode::Expr(self.place(expr)),
            },
        })
    }
    /// Parses `a = b = ... = value`, folding the chain to the right.
    fn parse_assignment(&mut self) -> Result<ASTNode> {
        let mut targets = Vec::new();
        let mut value = self.parse_expr_list()?;
        while let Some((_, Token::Assign)) = self.lexer.peek_next() {
            self.lexer.discard()?;
            targets.push(self.place(value));
            value = self.parse_expr_list()?;
        }
        while let Some(target) = targets.pop() {
            let placed = self.place(value);
            value = ASTNode::Assign(target, placed);
        }
        Ok(value)
    }
    fn parse_import_names(&mut self) -> Result<ThinVec<Ident>> {
        let mut names = ThinVec::with_capacity(1);
        names.push(self.parse_dotted_name()?);
        while let Some((_, Token::Comma)) = self.lexer.peek_next() {
            self.lexer.discard()?;
            names.push(self.parse_dotted_name()?);
        }
        Ok(names)
    }
    fn parse_dotted_name(&mut self) -> Result<Ident> {
        let mut name = match self.lexer.next_res()? {
            (s, Token::Ident) => s.to_owned(),
            (s, t) => bad_token!(s, t, "expected a module name"),
        };
        while let Some((_, Token::Dot)) = self.lexer.peek_next() {
            self.lexer.discard()?;
            match self.lexer.next_res()? {
                (s, Token::Ident) => {
                    name.push('.');
                    name.push_str(s);
                }
                (s, t) => bad_token!(s, t, "expected a module name"),
            }
        }
        Ok(name.into())
    }
    /// Parses `a, b, ...`. A single element without a trailing comma is returned as is,
    /// anything else becomes a tuple.
    fn parse_expr_list(&mut self) -> Result<ASTNode> {
        let first = self.parse_expr(0)?;
        if !matches!(self.lexer.peek_next(), Some((_, Token::Comma))) {
            return Ok(first);
        }
        let mut items = ThinVec::with_capacity(4);
        items.push(self.place(first));
        while let Some((_, Token::Comma)) = self.lexer.peek_next() {
            self.lexer.discard()?;
            match self.lexer.peek_next() {
                None => break,
                Some((_, t)) if t.ends_list() => break,
                _ => {}
            }
            items.push(self.parse_placed(0)?);
        }
        Ok(ASTNode::Tuple(items))
    }
    //generic function to parse a comma-seperated list of AST nodes concluded by the token "tok"
    fn parse_values(&mut self, tok: Token) -> Result<ThinVec<ASTNodeId>> {
        let mut vars = ThinVec::with_capacity(4);
        if self.lexer.peek_next_res()?.1 == tok {
            self.lexer.discard()?;
            return Ok(vars);
        }
        loop {
            vars.push(self.parse_placed(0)?);
            match self.lexer.next_res()? {
                (_, t) if t == tok => break,
                (_, Token::Comma) => {
                    // trailing comma
                    if self.lexer.peek_next_res()?.1 == tok {
                        self.lexer.discard()?;
                        break;
                    }
                }
                (s, t) => bad_token!(s, t, "parsing list"),
            }
        }
        Ok(vars)
    }
    fn parse_lambda_params(&mut self) -> Result<ThinVec<Ident>> {
        let mut params = ThinVec::with_capacity(2);
        loop {
            match self.lexer.next_res()? {
                (_, Token::Colon) => break,
                (s, Token::Ident) => {
                    params.push(s.into());
                    match self.lexer.next_res()? {
                        (_, Token::Colon) => break,
                        (_, Token::Comma) => {}
                        (s, t) => bad_token!(s, t, "in lambda parameters"),
                    }
                }
                (s, t) => bad_token!(s, t, "in lambda parameters"),
            }
        }
        Ok(params)
    }
    /// Parses one expression, failing once nesting goes past the depth limit.
    pub fn parse_expr(&mut self, min_binding_power: u8) -> Result<ASTNode> {
        self.depth += 1;
        if self.depth > self.max_depth {
            bail!("expression is nested more than {} levels deep", self.max_depth);
        }
        let node = self.parse_level(min_binding_power)?;
        self.depth -= 1;
        Ok(node)
    }
    fn parse_level(&mut self, min_binding_power: u8) -> Result<ASTNode> {
        //get LHS token
        let (s, t) = self.lexer.next_res()?;

        let mut lhs = match t {
            //Identifier
            Token::Ident => ASTNode::Val(s.into()),
            //Static value
            Token::IntegerLit(IntLit::Small(i)) => ASTNode::Val(i.into()),
            Token::IntegerLit(IntLit::Big(f)) => ASTNode::Val(Value::LargeInt(f)),
            Token::FloatLit(f) => ASTNode::Val(f.into()),
            Token::ImaginaryLit => ASTNode::Val(Value::Imaginary(s.into())),
            // quotes are single byte, so slicing them off stays on char boundaries
            Token::StringLit => ASTNode::Val(Value::Str(s[1..s.len() - 1].into())),
            Token::True => ASTNode::Val(Value::Bool(true)),
            Token::False => ASTNode::Val(Value::Bool(false)),
            Token::NoneLit => ASTNode::Val(Value::NoneLit),
            Token::LParen => {
                if self.lexer.peek_next_res()?.1 == Token::RParen {
                    self.lexer.discard()?;
                    ASTNode::Tuple(ThinVec::new())
                } else {
                    let ret = self.parse_expr_list()?;
                    assert_token_matches!(self.lexer, Token::RParen);
                    ret
                }
            }
            Token::LBracket => ASTNode::List(self.parse_values(Token::RBracket)?),
            Token::Lambda => {
                let params = self.parse_lambda_params()?;
                ASTNode::Lambda(params, self.parse_placed(0)?)
            }
            t => match t.prefix_opcode() {
                Some(op) => {
                    let inner = self.parse_placed(*op.prefix_bp()?)?;
                    ASTNode::new_simple_unary(op, inner)?
                }
                None => bad_token!(s, t, "expected an expression"),
            },
        };

        //Loop across this level
        loop {
            let Some(&(s, t)) = self.lexer.peek_next() else {
                break;
            };
            if t.ends_expr() {
                break;
            }
            let Some(op) = t.infix_opcode() else {
                bad_token!(s, t, "expected an operator")
            };
            if let Ok(bp) = op.postfix_bp() {
                if *bp < min_binding_power {
                    break;
                }
                self.lexer.discard()?;
                let target = self.place(lhs);
                lhs = match op {
                    Opcode::Call => ASTNode::Call(target, self.parse_values(Token::RParen)?),
                    Opcode::Subscript => {
                        let index = self.parse_expr_list()?;
                        assert_token_matches!(self.lexer, Token::RBracket);
                        ASTNode::Subscript(target, self.place(index))
                    }
                    Opcode::Attribute => match self.lexer.next_res()? {
                        (s, Token::Ident) => ASTNode::Attribute(target, s.into()),
                        (s, t) => bad_token!(s, t, "expected an attribute name"),
                    },
                    t => bail!("bad opcode: {:?}", t),
                };
                continue;
            }
            let bp = op.infix_bp()?;
            if bp.left < min_binding_power {
                break;
            }
            self.lexer.discard()?;
            if op == Opcode::IfExp {
                // `body if test else orelse`, the test binds like an `or` operand
                let body = self.place(lhs);
                let test = self.parse_placed(bp.left + 1)?;
                assert_token_matches!(self.lexer, Token::Else);
                let orelse = self.parse_placed(bp.right)?;
                lhs = ASTNode::IfExp { test, body, orelse };
                continue;
            }
            let rhs = self.parse_expr(bp.right)?;

            lhs = ASTNode::new_simple_binary(op, self.place(lhs), self.place(rhs))?;
        }
        Ok(lhs)
    }
}
