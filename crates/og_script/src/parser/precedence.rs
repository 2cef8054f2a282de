//! Operator precedence table for expression parsing.
//!
//! Follows JavaScript precedence for the operators the language keeps.

use crate::ast::{BinaryOp, LogicalOp};
use crate::token::Token;

/// Operator precedence level (higher = tighter binding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Precedence {
    None = 0,
    Coalesce = 1,       // ??
    LogicalOr = 2,      // ||
    LogicalAnd = 3,     // &&
    Equality = 4,       // ==, !=, ===, !==
    Relational = 5,     // <, >, <=, >=
    Additive = 6,       // +, -
    Multiplicative = 7, // *, /, %
    Exponent = 8,       // **
}

impl Precedence {
    /// The level one step tighter, used for left-associative operators.
    pub(crate) fn next(self) -> Self {
        match self {
            Precedence::None => Precedence::Coalesce,
            Precedence::Coalesce => Precedence::LogicalOr,
            Precedence::LogicalOr => Precedence::LogicalAnd,
            Precedence::LogicalAnd => Precedence::Equality,
            Precedence::Equality => Precedence::Relational,
            Precedence::Relational => Precedence::Additive,
            Precedence::Additive => Precedence::Multiplicative,
            Precedence::Multiplicative | Precedence::Exponent => Precedence::Exponent,
        }
    }
}

/// Get the precedence of a binary operator token.
pub(crate) fn binary_precedence(token: &Token) -> Precedence {
    match token {
        Token::QuestionQuestion => Precedence::Coalesce,
        Token::PipePipe => Precedence::LogicalOr,
        Token::AmpAmp => Precedence::LogicalAnd,
        Token::EqualEqual | Token::EqualEqualEqual | Token::BangEqual | Token::BangEqualEqual => {
            Precedence::Equality
        }
        Token::Less | Token::LessEqual | Token::Greater | Token::GreaterEqual => {
            Precedence::Relational
        }
        Token::Plus | Token::Minus => Precedence::Additive,
        Token::Star | Token::Slash | Token::Percent => Precedence::Multiplicative,
        Token::StarStar => Precedence::Exponent,
        _ => Precedence::None,
    }
}

/// Only `**` groups to the right.
#[inline]
pub(crate) fn is_right_associative(token: &Token) -> bool {
    matches!(token, Token::StarStar)
}

/// An operator token, split by evaluation strategy.
pub(crate) enum Operator {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

pub(crate) fn operator(token: &Token) -> Option<Operator> {
    let op = match token {
        Token::QuestionQuestion => Operator::Logical(LogicalOp::Coalesce),
        Token::PipePipe => Operator::Logical(LogicalOp::Or),
        Token::AmpAmp => Operator::Logical(LogicalOp::And),
        // Equality is always strict.
        Token::EqualEqual | Token::EqualEqualEqual => Operator::Binary(BinaryOp::Eq),
        Token::BangEqual | Token::BangEqualEqual => Operator::Binary(BinaryOp::Ne),
        Token::Less => Operator::Binary(BinaryOp::Lt),
        Token::LessEqual => Operator::Binary(BinaryOp::Le),
        Token::Greater => Operator::Binary(BinaryOp::Gt),
        Token::GreaterEqual => Operator::Binary(BinaryOp::Ge),
        Token::Plus => Operator::Binary(BinaryOp::Add),
        Token::Minus => Operator::Binary(BinaryOp::Sub),
        Token::Star => Operator::Binary(BinaryOp::Mul),
        Token::Slash => Operator::Binary(BinaryOp::Div),
        Token::Percent => Operator::Binary(BinaryOp::Rem),
        Token::StarStar => Operator::Binary(BinaryOp::Pow),
        _ => return None,
    };
    Some(op)
}

/// The binary operator of a compound assignment, or `None` for plain `=`.
///
/// Returns `Err(())` if the token assigns nothing.
pub(crate) fn assignment(token: &Token) -> Result<Option<BinaryOp>, ()> {
    match token {
        Token::Equal => Ok(None),
        Token::PlusEqual => Ok(Some(BinaryOp::Add)),
        Token::MinusEqual => Ok(Some(BinaryOp::Sub)),
        Token::StarEqual => Ok(Some(BinaryOp::Mul)),
        Token::SlashEqual => Ok(Some(BinaryOp::Div)),
        Token::PercentEqual => Ok(Some(BinaryOp::Rem)),
        _ => Err(()),
    }
}
