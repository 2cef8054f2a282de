//! Boxed futures for recursive traversal.

use alloc::boxed::Box;
use core::pin::Pin;

/// An owned and dynamically typed Future used when you can't
/// statically type your result or need to add some indirection.
///
/// Unlike a `Send` boxed future, this one may capture `Rc`/`RefCell`
/// state. Traversals are driven on a single thread, so nothing here
/// ever crosses a thread boundary.
pub type LocalBoxedFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;
