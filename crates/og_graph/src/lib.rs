#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// No STD Support

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod error;
mod eval;
mod heap;
mod object;
mod value;

// -----------------------------------------------------------------------------
// Exports

pub use error::EvalError;
pub use eval::{Interpreter, MethodHost, NativeMethod, NoMethods};
pub use heap::{Heap, ObjectRef};
pub use object::{Array, Callable, Fields, Instance, Object};
pub use value::Value;
