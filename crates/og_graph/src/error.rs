use alloc::string::String;

use og_script::ParseError;
use thiserror::Error;

use crate::heap::ObjectRef;

/// Errors raised while running a callable or mutating the heap.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum EvalError {
    #[error("`{0}` is not a function")]
    NotCallable(String),

    /// A field or item operation hit an object without that storage.
    #[error("`{0}` has no such storage")]
    NotAnObject(String),

    #[error("object {0:?} is not in the heap")]
    UnknownObject(ObjectRef),

    #[error("type error: {0}")]
    TypeError(String),

    #[error("`{0}` is not defined")]
    UndefinedVariable(String),

    #[error("execution exceeded {0} steps")]
    StepLimit(usize),

    #[error("call depth exceeded {0}")]
    DepthLimit(usize),

    /// An array write past this many items.
    #[error("array length exceeded {0} items")]
    ItemLimit(usize),

    /// A concatenation longer than this many bytes.
    #[error("string length exceeded {0} bytes")]
    StringLimit(usize),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Raised by native methods.
    #[error("{0}")]
    Custom(String),
}

impl EvalError {
    #[inline]
    pub fn custom(message: impl Into<String>) -> Self {
        EvalError::Custom(message.into())
    }
}
