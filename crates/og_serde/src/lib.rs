#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// No STD Support

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod context;
mod cursor;
mod de;
mod error;
mod ser;

pub mod node;
pub mod progress;
pub mod registry;

#[doc(hidden)]
pub mod __macro_exports;

// -----------------------------------------------------------------------------
// Exports

pub use context::{Context, ContextBuilder, Loaded, Progress};
pub use cursor::{Cursor, Key};
pub use error::{BoxError, Error};
pub use node::{CallableNode, Node, ObjectNode, Primitive, RefNode};
pub use registry::{TypeMeta, TypeRegistry};

pub use og_graph::{Heap, ObjectRef, Value};

// -----------------------------------------------------------------------------
// Entry points

/// Reconstructs `node` in a fresh context and returns the root with its heap.
///
/// Callables are not allowed; build a [`Context`] with
/// [`allow_callables`](ContextBuilder::allow_callables) to load them.
#[cfg(feature = "std")]
pub fn deserialize(registry: &TypeRegistry, node: &Node) -> Result<Loaded, Error> {
    let cx = Context::new(registry);
    let root = og_task::block_on(cx.deserialize(node))?;
    Ok(Loaded {
        root,
        heap: cx.into_heap(),
    })
}

/// Flattens `value`, whose objects live in `heap`, in a fresh context.
#[cfg(feature = "std")]
pub fn serialize(registry: &TypeRegistry, heap: &mut Heap, value: &Value) -> Result<Node, Error> {
    let cx = Context::builder(registry).heap(core::mem::take(heap)).build();
    let result = og_task::block_on(cx.serialize(value));
    *heap = cx.into_heap();
    result
}
