#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// No STD Support

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod error;
mod lexer;
mod parser;
mod token;

pub mod ast;

// -----------------------------------------------------------------------------
// Exports

pub use ast::Program;
pub use error::{LexError, ParseError};
pub use lexer::tokenize;
pub use parser::MAX_DEPTH;
pub use token::{Span, Token};

use alloc::string::String;
use alloc::vec::Vec;

use parser::Parser;

/// Parse a callable from its parameter names and body text.
///
/// Parameter names must be plain identifiers and must be unique.
///
/// # Examples
///
/// ```
/// let program = og_script::parse(&["a", "b"], "return a * b;").unwrap();
///
/// assert_eq!(program.params(), ["a", "b"]);
/// assert_eq!(program.body().len(), 1);
/// ```
pub fn parse<S: AsRef<str>>(params: &[S], body: &str) -> Result<Program, ParseError> {
    let mut names: Vec<String> = Vec::with_capacity(params.len());
    for param in params {
        let name = param.as_ref().trim();
        if !is_identifier(name) {
            return Err(ParseError::InvalidParameter(String::from(name)));
        }
        if names.iter().any(|existing| existing == name) {
            return Err(ParseError::DuplicateParameter(String::from(name)));
        }
        names.push(String::from(name));
    }

    let tokens = tokenize(body)?;
    let body = Parser::new(tokens, body.len()).parse_body()?;
    Ok(Program::new(names, body))
}

/// Returns `true` if `name` lexes as exactly one identifier (keywords excluded).
pub fn is_identifier(name: &str) -> bool {
    matches!(tokenize(name).as_deref(), Ok([(Token::Ident(_), _)]))
}

#[cfg(test)]
mod tests;
