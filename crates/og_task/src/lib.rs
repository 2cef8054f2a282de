#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// No STD Support

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

// -----------------------------------------------------------------------------
// Modules

mod cancel;
mod local_future;
mod throttle;

// -----------------------------------------------------------------------------
// Exports

pub use cancel::{CancelToken, Cancelled};
pub use local_future::LocalBoxedFuture;
pub use throttle::Throttle;

// -----------------------------------------------------------------------------
// Re-Exports

pub use futures_lite;
pub use futures_lite::future::yield_now;

#[cfg(feature = "std")]
pub use futures_lite::future::block_on;
