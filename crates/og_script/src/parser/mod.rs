//! Recursive-descent parser producing [`Stmt`] lists.

mod expr;
mod precedence;
mod stmt;

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::ast::Stmt;
use crate::error::ParseError;
use crate::token::{Span, Token};

/// Maximum nesting of statements and expressions.
pub const MAX_DEPTH: usize = 128;

pub(crate) struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    depth: usize,
    end: usize,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<(Token, Span)>, source_len: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            end: source_len,
        }
    }

    /// Parse statements until the input is exhausted.
    pub(crate) fn parse_body(mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut body = Vec::new();
        while self.peek().is_some() {
            body.push(self.statement()?);
        }
        Ok(body)
    }

    // -------------------------------------------------------------------------
    // Cursor helpers

    #[inline]
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    #[inline]
    fn peek_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map_or(Span::new(self.end, self.end), |(_, span)| *span)
    }

    fn advance(&mut self) -> Option<(Token, Span)> {
        let item = self.tokens.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    /// Consume the next token if it equals `token`.
    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, expected: &'static str) -> Result<Span, ParseError> {
        if self.peek() == Some(token) {
            let span = self.peek_span();
            self.pos += 1;
            Ok(span)
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn identifier(&mut self, expected: &'static str) -> Result<String, ParseError> {
        match self.peek() {
            Some(Token::Ident(_)) => match self.advance() {
                Some((Token::Ident(name), _)) => Ok(name),
                _ => Err(self.unexpected(expected)),
            },
            _ => Err(self.unexpected(expected)),
        }
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        match self.peek() {
            Some(found) => ParseError::Unexpected {
                expected,
                found: found.to_string(),
                span: self.peek_span(),
            },
            None => ParseError::UnexpectedEnd { expected },
        }
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::TooDeep {
                limit: MAX_DEPTH,
                span: self.peek_span(),
            });
        }
        Ok(())
    }

    #[inline]
    fn leave(&mut self) {
        self.depth -= 1;
    }
}
