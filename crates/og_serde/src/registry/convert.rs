//! Custom conversion and hook traits.
//!
//! Each trait is async so an implementation may await nested traversal, e.g.
//! `cx.deserialize(node).await` from inside a [`ToClass`]. Plain closures are
//! adapted through the `*Fn` wrappers.

use alloc::boxed::Box;

use async_trait::async_trait;
use og_graph::{ObjectRef, Value};

use crate::context::Context;
use crate::cursor::Cursor;
use crate::error::Error;
use crate::node::Node;

/// Converts a live value into a node, replacing generic flattening of a field.
#[async_trait(?Send)]
pub trait ToPlain {
    async fn to_plain(&self, cx: &Context<'_>, value: &Value, cursor: &Cursor) -> Result<Node, Error>;
}

/// Converts a node into a live value, replacing generic reconstruction of a
/// field or constructor argument.
#[async_trait(?Send)]
pub trait ToClass {
    async fn to_class(&self, cx: &Context<'_>, node: &Node, cursor: &Cursor) -> Result<Value, Error>;
}

/// Runs after a value was assigned to `owner`.
///
/// Used for field hooks (`value` is the field value) and type hooks (`value`
/// is the instance itself).
#[async_trait(?Send)]
pub trait AfterLoad {
    async fn after_load(&self, cx: &Context<'_>, owner: ObjectRef, value: &Value) -> Result<(), Error>;
}

// -----------------------------------------------------------------------------
// Closure adapters

/// Adapts a synchronous closure into a [`ToPlain`].
pub struct ToPlainFn<F>(pub F);

#[async_trait(?Send)]
impl<F> ToPlain for ToPlainFn<F>
where
    F: Fn(&Context<'_>, &Value, &Cursor) -> Result<Node, Error>,
{
    async fn to_plain(&self, cx: &Context<'_>, value: &Value, cursor: &Cursor) -> Result<Node, Error> {
        (self.0)(cx, value, cursor)
    }
}

/// Adapts a synchronous closure into a [`ToClass`].
pub struct ToClassFn<F>(pub F);

#[async_trait(?Send)]
impl<F> ToClass for ToClassFn<F>
where
    F: Fn(&Context<'_>, &Node, &Cursor) -> Result<Value, Error>,
{
    async fn to_class(&self, cx: &Context<'_>, node: &Node, cursor: &Cursor) -> Result<Value, Error> {
        (self.0)(cx, node, cursor)
    }
}

/// Adapts a synchronous closure into an [`AfterLoad`].
pub struct AfterLoadFn<F>(pub F);

#[async_trait(?Send)]
impl<F> AfterLoad for AfterLoadFn<F>
where
    F: Fn(&Context<'_>, ObjectRef, &Value) -> Result<(), Error>,
{
    async fn after_load(&self, cx: &Context<'_>, owner: ObjectRef, value: &Value) -> Result<(), Error> {
        (self.0)(cx, owner, value)
    }
}
