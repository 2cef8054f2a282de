#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// Modules

pub mod hash;

// -----------------------------------------------------------------------------
// Top-level exports

pub use hash::{HashMap, HashSet, IndexMap, IndexSet};
