use alloc::boxed::Box;
use alloc::string::String;

use og_graph::{EvalError, ObjectRef};
use og_script::ParseError;
use og_task::Cancelled;
use thiserror::Error;

/// Boxed error returned by user converters and hooks.
pub type BoxError = Box<dyn core::error::Error + Send + Sync>;

/// Errors of a serialize or deserialize session.
///
/// Every error aborts the whole call; objects created before the failure stay
/// in the context heap but the call reports no result.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("cannot find the type `{name}`, did you forget to register it?")]
    UnregisteredType { name: String },

    #[error("cannot find the reference `{id}`")]
    ReferenceNotFound { id: String },

    #[error("id `{id}` is already bound to another object")]
    DuplicateId { id: String },

    #[error("callable `{id}` found but callables are not allowed in this context")]
    CallablesDisabled { id: String },

    #[error("type `{type_name}` has no method `{method}`")]
    MissingMethod { type_name: String, method: String },

    #[error("malformed node `{id}`: {reason}")]
    Malformed { id: String, reason: String },

    #[error("object {0:?} is not in the heap")]
    MissingObject(ObjectRef),

    #[error(transparent)]
    Script(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    #[error(transparent)]
    Custom(BoxError),
}

impl Error {
    /// Wraps a user error.
    ///
    /// # Examples
    ///
    /// ```
    /// let err = og_serde::Error::custom("bad color");
    /// assert_eq!(err.to_string(), "bad color");
    /// ```
    #[inline]
    pub fn custom(error: impl Into<BoxError>) -> Self {
        Error::Custom(error.into())
    }
}
