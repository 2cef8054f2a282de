use alloc::boxed::Box;
use alloc::vec::Vec;

use super::Parser;
use crate::ast::Stmt;
use crate::error::ParseError;
use crate::token::Token;

impl Parser {
    pub(super) fn statement(&mut self) -> Result<Stmt, ParseError> {
        self.enter()?;
        let stmt = self.statement_kind();
        self.leave();
        stmt
    }

    fn statement_kind(&mut self) -> Result<Stmt, ParseError> {
        match self.peek() {
            Some(Token::Let | Token::Const | Token::Var) => {
                self.pos += 1;
                let name = self.identifier("binding name")?;
                let init = if self.eat(&Token::Equal) {
                    Some(self.expression()?)
                } else {
                    None
                };
                self.end_of_statement();
                Ok(Stmt::Let { name, init })
            }
            Some(Token::Return) => {
                self.pos += 1;
                let value = if self.at_statement_end() {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.end_of_statement();
                Ok(Stmt::Return(value))
            }
            Some(Token::If) => {
                self.pos += 1;
                self.expect(&Token::LParen, "`(`")?;
                let cond = self.expression()?;
                self.expect(&Token::RParen, "`)`")?;
                let then = Box::new(self.statement()?);
                let otherwise = if self.eat(&Token::Else) {
                    Some(Box::new(self.statement()?))
                } else {
                    None
                };
                Ok(Stmt::If {
                    cond,
                    then,
                    otherwise,
                })
            }
            Some(Token::While) => {
                self.pos += 1;
                self.expect(&Token::LParen, "`(`")?;
                let cond = self.expression()?;
                self.expect(&Token::RParen, "`)`")?;
                let body = Box::new(self.statement()?);
                Ok(Stmt::While { cond, body })
            }
            Some(Token::LBrace) => {
                self.pos += 1;
                self.block()
            }
            Some(Token::Semicolon) => {
                self.pos += 1;
                Ok(Stmt::Empty)
            }
            Some(_) => {
                let expr = self.expression()?;
                self.end_of_statement();
                Ok(Stmt::Expr(expr))
            }
            None => Err(ParseError::UnexpectedEnd {
                expected: "statement",
            }),
        }
    }

    fn block(&mut self) -> Result<Stmt, ParseError> {
        let mut body = Vec::new();
        loop {
            match self.peek() {
                Some(Token::RBrace) => {
                    self.pos += 1;
                    return Ok(Stmt::Block(body));
                }
                Some(_) => body.push(self.statement()?),
                None => return Err(ParseError::UnexpectedEnd { expected: "`}`" }),
            }
        }
    }

    #[inline]
    fn at_statement_end(&self) -> bool {
        matches!(self.peek(), None | Some(Token::Semicolon | Token::RBrace))
    }

    /// Semicolons are optional.
    #[inline]
    fn end_of_statement(&mut self) {
        self.eat(&Token::Semicolon);
    }
}
