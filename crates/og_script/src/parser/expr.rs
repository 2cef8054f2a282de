use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::vec::Vec;

use super::Parser;
use super::precedence::{self, Operator, Precedence};
use crate::ast::{Expr, Literal, UnaryOp};
use crate::error::ParseError;
use crate::token::Token;

impl Parser {
    pub(super) fn expression(&mut self) -> Result<Expr, ParseError> {
        self.enter()?;
        let expr = self.assignment();
        self.leave();
        expr
    }

    fn assignment(&mut self) -> Result<Expr, ParseError> {
        let span = self.peek_span();
        let target = self.conditional()?;

        let Some(Ok(op)) = self.peek().map(precedence::assignment) else {
            return Ok(target);
        };
        self.pos += 1;

        if !target.is_assignable() {
            return Err(ParseError::InvalidAssignment { span });
        }
        let value = self.assignment()?;
        Ok(Expr::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    fn conditional(&mut self) -> Result<Expr, ParseError> {
        let cond = self.binary(Precedence::Coalesce)?;
        if !self.eat(&Token::Question) {
            return Ok(cond);
        }
        let then = self.assignment()?;
        self.expect(&Token::Colon, "`:`")?;
        let otherwise = self.assignment()?;
        Ok(Expr::Conditional {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn binary(&mut self, min: Precedence) -> Result<Expr, ParseError> {
        let mut left = self.unary()?;

        loop {
            let Some(token) = self.peek() else { break };
            let prec = precedence::binary_precedence(token);
            if prec == Precedence::None || prec < min {
                break;
            }
            let Some(op) = precedence::operator(token) else { break };
            let next = if precedence::is_right_associative(token) {
                prec
            } else {
                prec.next()
            };
            self.pos += 1;

            let right = Box::new(self.binary(next)?);
            let lhs = Box::new(left);
            left = match op {
                Operator::Binary(op) => Expr::Binary {
                    op,
                    left: lhs,
                    right,
                },
                Operator::Logical(op) => Expr::Logical {
                    op,
                    left: lhs,
                    right,
                },
            };
        }

        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            Some(Token::Bang) => UnaryOp::Not,
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Plus,
            _ => return self.postfix(),
        };
        self.pos += 1;

        self.enter()?;
        let operand = self.unary();
        self.leave();
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand?),
        })
    }

    fn postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.pos += 1;
                    let name = self.identifier("property name")?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        name,
                    };
                }
                Some(Token::LBracket) => {
                    self.pos += 1;
                    let index = self.expression()?;
                    self.expect(&Token::RBracket, "`]`")?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                Some(Token::LParen) => {
                    self.pos += 1;
                    let args = self.list(&Token::RParen, "`)`")?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Comma separated expressions up to `close`, trailing comma allowed.
    fn list(&mut self, close: &Token, expected: &'static str) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        loop {
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.expression()?);
            if !self.eat(&Token::Comma) {
                self.expect(close, expected)?;
                return Ok(items);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let Some((token, span)) = self.advance() else {
            return Err(ParseError::UnexpectedEnd {
                expected: "expression",
            });
        };

        let expr = match token {
            Token::Number(value) => Expr::Literal(Literal::Number(value)),
            Token::Str(value) => Expr::Literal(Literal::String(value)),
            Token::True => Expr::Literal(Literal::Bool(true)),
            Token::False => Expr::Literal(Literal::Bool(false)),
            Token::Null | Token::Undefined => Expr::Literal(Literal::Null),
            Token::This => Expr::This,
            Token::Ident(name) => Expr::Ident(name),
            Token::LParen => {
                let inner = self.expression()?;
                self.expect(&Token::RParen, "`)`")?;
                inner
            }
            Token::LBracket => Expr::Array(self.list(&Token::RBracket, "`]`")?),
            other => {
                return Err(ParseError::Unexpected {
                    expected: "expression",
                    found: other.to_string(),
                    span,
                });
            }
        };
        Ok(expr)
    }
}
