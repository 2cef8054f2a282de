use alloc::string::String;

use thiserror::Error;

use crate::token::Span;

// -----------------------------------------------------------------------------
// LexError

/// A character sequence that starts no token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unexpected input `{text}` at {span}")]
pub struct LexError {
    pub text: String,
    pub span: Span,
}

// -----------------------------------------------------------------------------
// ParseError

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("expected {expected}, found {found} at {span}")]
    Unexpected {
        expected: &'static str,
        found: String,
        span: Span,
    },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("invalid assignment target at {span}")]
    InvalidAssignment { span: Span },

    #[error("invalid parameter name `{0}`")]
    InvalidParameter(String),

    #[error("duplicate parameter name `{0}`")]
    DuplicateParameter(String),

    #[error("nesting exceeds {limit} levels at {span}")]
    TooDeep { limit: usize, span: Span },
}
