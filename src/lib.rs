#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

pub use og_graph as graph;
pub use og_script as script;
pub use og_serde as serde;
pub use og_task as task;
pub use og_utils as utils;

pub use og_serde::{Context, Cursor, Error, Node, TypeMeta, TypeRegistry};
#[cfg(feature = "std")]
pub use og_serde::{deserialize, serialize};
