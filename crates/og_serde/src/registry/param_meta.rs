use alloc::sync::Arc;
use core::fmt;

use og_graph::{Heap, ObjectRef, Value};

use super::convert::{ToClass, ToClassFn};
use crate::context::Context;
use crate::cursor::{Cursor, Key};
use crate::error::Error;
use crate::node::Node;

/// Computes an argument from the traversal position.
pub type Provider = Arc<dyn Fn(&ProviderCx<'_>) -> Result<Value, Error>>;

// -----------------------------------------------------------------------------
// ProviderCx

/// What a parameter provider sees: the heap and the cursor of the node whose
/// arguments are being built.
///
/// While loading, the cursor parent is the object owning the node, so
/// `parent_value` lets a constructor receive a back-reference to its owner.
pub struct ProviderCx<'a> {
    heap: &'a Heap,
    cursor: &'a Cursor,
}

impl<'a> ProviderCx<'a> {
    #[inline]
    pub fn new(heap: &'a Heap, cursor: &'a Cursor) -> Self {
        Self { heap, cursor }
    }

    #[inline]
    pub fn heap(&self) -> &'a Heap {
        self.heap
    }

    #[inline]
    pub fn cursor(&self) -> &'a Cursor {
        self.cursor
    }

    #[inline]
    pub fn parent(&self) -> Option<ObjectRef> {
        self.cursor.parent()
    }

    #[inline]
    pub fn key(&self) -> Option<&'a Key> {
        self.cursor.key()
    }

    /// The parent as a value, `Value::Null` at the root.
    #[inline]
    pub fn parent_value(&self) -> Value {
        self.parent().map_or(Value::Null, Value::Object)
    }

    /// A field of the parent, `Value::Null` if absent.
    pub fn parent_field(&self, name: &str) -> Value {
        self.parent()
            .and_then(|parent| self.heap.field(parent, name))
            .cloned()
            .unwrap_or_default()
    }
}

// -----------------------------------------------------------------------------
// ParamMeta

/// Where an argument comes from when the node carries none for its slot.
#[derive(Clone, Default)]
pub enum ParamSource {
    #[default]
    None,
    Literal(Value),
    Provider(Provider),
}

/// Metadata of one constructor or callable parameter.
#[derive(Clone, Default)]
pub struct ParamMeta {
    source: ParamSource,
    to_class: Option<Arc<dyn ToClass>>,
}

impl ParamMeta {
    /// A parameter without default; it resolves to `Value::Null`.
    #[inline]
    pub fn none() -> Self {
        Self::default()
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Self {
            source: ParamSource::Literal(value.into()),
            to_class: None,
        }
    }

    pub fn provider<F>(f: F) -> Self
    where
        F: Fn(&ProviderCx<'_>) -> Result<Value, Error> + 'static,
    {
        Self {
            source: ParamSource::Provider(Arc::new(f)),
            to_class: None,
        }
    }

    /// Converter used instead of generic reconstruction of this argument.
    pub fn with_to_class(mut self, converter: impl ToClass + 'static) -> Self {
        self.to_class = Some(Arc::new(converter));
        self
    }

    pub fn with_to_class_fn<F>(self, f: F) -> Self
    where
        F: Fn(&Context<'_>, &Node, &Cursor) -> Result<Value, Error> + 'static,
    {
        self.with_to_class(ToClassFn(f))
    }

    #[inline]
    pub fn source(&self) -> &ParamSource {
        &self.source
    }

    #[inline]
    pub fn to_class(&self) -> Option<&Arc<dyn ToClass>> {
        self.to_class.as_ref()
    }

    /// Evaluates the declared source.
    pub fn resolve(&self, cx: &ProviderCx<'_>) -> Result<Value, Error> {
        match &self.source {
            ParamSource::None => Ok(Value::Null),
            ParamSource::Literal(value) => Ok(value.clone()),
            ParamSource::Provider(provider) => provider(cx),
        }
    }
}

impl fmt::Debug for ParamMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            ParamSource::None => "none",
            ParamSource::Literal(_) => "literal",
            ParamSource::Provider(_) => "provider",
        };
        f.debug_struct("ParamMeta")
            .field("source", &source)
            .field("to_class", &self.to_class.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{ParamMeta, ProviderCx};
    use crate::cursor::Cursor;
    use og_graph::{Heap, Instance, Value};

    #[test]
    fn resolve_sources() {
        let mut heap = Heap::new();
        let owner = heap.insert(Instance::new("Owner").with_field("number1", 2));
        let cursor = Cursor::field(owner, "mul");
        let cx = ProviderCx::new(&heap, &cursor);

        assert_eq!(ParamMeta::none().resolve(&cx).unwrap(), Value::Null);
        assert_eq!(ParamMeta::literal(3).resolve(&cx).unwrap(), Value::Number(3.0));
        assert_eq!(
            ParamMeta::provider(|cx| Ok(cx.parent_field("number1")))
                .resolve(&cx)
                .unwrap(),
            Value::Number(2.0)
        );
        assert_eq!(
            ParamMeta::provider(|cx| Ok(cx.parent_value())).resolve(&cx).unwrap(),
            Value::Object(owner)
        );
    }

    #[test]
    fn root_cursor_has_no_parent() {
        let heap = Heap::new();
        let cursor = Cursor::root();
        let cx = ProviderCx::new(&heap, &cursor);
        assert_eq!(cx.parent_value(), Value::Null);
        assert_eq!(cx.parent_field("x"), Value::Null);
        assert!(cx.key().is_none());
    }
}
