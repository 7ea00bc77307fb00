use logos::{Lexer, Logos};

use crate::lexer::Token;

pub mod macros;
pub mod multipeek;

/// Iterates a logos lexer as `(slice, token)` pairs.
/// Input the lexer cannot match is yielded as [`Token::Invalid`] instead of ending the stream.
pub struct LexIter<'a> {
    lexer: Lexer<'a, Token>,
}
impl<'a> LexIter<'a> {
    pub fn new(lexer: Lexer<'a, Token>) -> Self {
        Self { lexer }
    }
    pub fn from_source(source: &'a str) -> Self {
        Self::new(Token::lexer(source))
    }
}
impl<'a> Iterator for LexIter<'a> {
    type Item = (&'a str, Token);

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.lexer.next()?.unwrap_or(Token::Invalid);
        Some((self.lexer.slice(), token))
    }
}
