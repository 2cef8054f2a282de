use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use bitflags::bitflags;
use og_graph::{ObjectRef, Value};

use super::convert::{AfterLoad, AfterLoadFn, ToClass, ToClassFn, ToPlain, ToPlainFn};
use super::param_meta::ParamMeta;
use crate::context::Context;
use crate::cursor::Cursor;
use crate::error::Error;
use crate::node::Node;

// -----------------------------------------------------------------------------
// FieldMode

bitflags! {
    /// Inclusion policy of a field.
    ///
    /// `TO_PLAIN` emits the field when serializing, `TO_CLASS` restores it
    /// when deserializing. `RUN_ON_DESERIALIZE` marks a callable field whose
    /// callable is invoked on the owning instance right after it is restored.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FieldMode: u8 {
        const TO_PLAIN = 1;
        const TO_CLASS = 1 << 1;
        const RUN_ON_DESERIALIZE = 1 << 2;
        const ALL = Self::TO_PLAIN.bits() | Self::TO_CLASS.bits();
    }
}

impl FieldMode {
    /// Neither emitted nor restored.
    pub const IGNORE: Self = Self::empty();
    /// Emitted, never restored onto the field.
    pub const TO_PLAIN_ONLY: Self = Self::TO_PLAIN;
    /// Restored, never emitted.
    pub const TO_CLASS_ONLY: Self = Self::TO_CLASS;

    #[inline]
    pub const fn serializes(self) -> bool {
        self.contains(Self::TO_PLAIN)
    }

    #[inline]
    pub const fn deserializes(self) -> bool {
        self.contains(Self::TO_CLASS)
    }

    #[inline]
    pub const fn runs_on_deserialize(self) -> bool {
        self.contains(Self::RUN_ON_DESERIALIZE)
    }
}

impl Default for FieldMode {
    #[inline]
    fn default() -> Self {
        Self::ALL
    }
}

// -----------------------------------------------------------------------------
// FieldMeta

/// Metadata of one field of a registered type.
#[derive(Clone)]
pub struct FieldMeta {
    name: String,
    mode: FieldMode,
    to_plain: Option<Arc<dyn ToPlain>>,
    to_class: Option<Arc<dyn ToClass>>,
    on_deserialized: Option<Arc<dyn AfterLoad>>,
    params: Vec<ParamMeta>,
}

impl FieldMeta {
    /// A field with mode [`FieldMode::ALL`] and no converters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: FieldMode::ALL,
            to_plain: None,
            to_class: None,
            on_deserialized: None,
            params: Vec::new(),
        }
    }

    #[inline]
    pub fn with_mode(mut self, mode: FieldMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_to_plain(mut self, converter: impl ToPlain + 'static) -> Self {
        self.to_plain = Some(Arc::new(converter));
        self
    }

    pub fn with_to_plain_fn<F>(self, f: F) -> Self
    where
        F: Fn(&Context<'_>, &Value, &Cursor) -> Result<Node, Error> + 'static,
    {
        self.with_to_plain(ToPlainFn(f))
    }

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

    /// Hook invoked with the owner and the restored field value.
    pub fn with_on_deserialized(mut self, hook: impl AfterLoad + 'static) -> Self {
        self.on_deserialized = Some(Arc::new(hook));
        self
    }

    pub fn with_on_deserialized_fn<F>(self, f: F) -> Self
    where
        F: Fn(&Context<'_>, ObjectRef, &Value) -> Result<(), Error> + 'static,
    {
        self.with_on_deserialized(AfterLoadFn(f))
    }

    /// Declares the next parameter of a callable field.
    #[inline]
    pub fn with_param(mut self, param: ParamMeta) -> Self {
        self.params.push(param);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn mode(&self) -> FieldMode {
        self.mode
    }

    #[inline]
    pub fn to_plain(&self) -> Option<&Arc<dyn ToPlain>> {
        self.to_plain.as_ref()
    }

    #[inline]
    pub fn to_class(&self) -> Option<&Arc<dyn ToClass>> {
        self.to_class.as_ref()
    }

    #[inline]
    pub fn on_deserialized(&self) -> Option<&Arc<dyn AfterLoad>> {
        self.on_deserialized.as_ref()
    }

    /// Parameters of a callable field, in order.
    #[inline]
    pub fn params(&self) -> &[ParamMeta] {
        &self.params
    }
}

impl fmt::Debug for FieldMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldMeta")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("to_plain", &self.to_plain.is_some())
            .field("to_class", &self.to_class.is_some())
            .field("on_deserialized", &self.on_deserialized.is_some())
            .field("params", &self.params.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::FieldMode;

    #[test]
    fn mode_bits() {
        assert!(FieldMode::ALL.serializes() && FieldMode::ALL.deserializes());
        assert!(!FieldMode::IGNORE.serializes() && !FieldMode::IGNORE.deserializes());
        assert!(!FieldMode::TO_PLAIN_ONLY.deserializes());
        assert!(!FieldMode::TO_CLASS_ONLY.serializes());

        let run = FieldMode::ALL | FieldMode::RUN_ON_DESERIALIZE;
        assert!(run.runs_on_deserialize() && run.deserializes());
        assert_eq!(FieldMode::default(), FieldMode::ALL);
    }
}
