use alloc::string::String;
use core::fmt;

use og_graph::ObjectRef;

/// Position of a node inside its owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Field(String),
    Index(usize),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Field(name) => f.write_str(name),
            Key::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// The owner and key of the node being resolved.
///
/// A cursor is a value: every recursive step builds the cursor of its
/// children, so siblings resolved concurrently each see their own owner.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cursor {
    parent: Option<ObjectRef>,
    key: Option<Key>,
}

impl Cursor {
    /// The cursor of a top-level node: no parent, no key.
    #[inline]
    pub const fn root() -> Self {
        Self {
            parent: None,
            key: None,
        }
    }

    #[inline]
    pub fn field(parent: ObjectRef, name: impl Into<String>) -> Self {
        Self {
            parent: Some(parent),
            key: Some(Key::Field(name.into())),
        }
    }

    #[inline]
    pub fn index(parent: ObjectRef, index: usize) -> Self {
        Self {
            parent: Some(parent),
            key: Some(Key::Index(index)),
        }
    }

    #[inline]
    pub fn parent(&self) -> Option<ObjectRef> {
        self.parent
    }

    #[inline]
    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// The field name, `None` at the root or for indexed elements.
    #[inline]
    pub fn field_name(&self) -> Option<&str> {
        match &self.key {
            Some(Key::Field(name)) => Some(name),
            _ => None,
        }
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
