use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use og_graph::{EvalError, Fields, Heap, Instance, NativeMethod, ObjectRef, Value};
use og_utils::{HashMap, IndexMap};

use super::convert::{AfterLoad, AfterLoadFn};
use super::field_meta::{FieldMeta, FieldMode};
use super::param_meta::ParamMeta;
use crate::context::Context;
use crate::error::Error;
use crate::node::{Node, NodeMap};

/// Initializes a freshly allocated instance from its constructor arguments.
pub type Constructor = Arc<dyn Fn(&mut Construct<'_>) -> Result<(), Error>>;

// -----------------------------------------------------------------------------
// Construct

/// Arguments of a [`Constructor`] call.
pub struct Construct<'a> {
    /// The heap the instance will be inserted into.
    pub heap: &'a mut Heap,
    /// The instance being built, not yet in the heap.
    pub instance: &'a mut Instance,
    args: &'a [Value],
}

impl Construct<'_> {
    #[inline]
    pub fn args(&self) -> &[Value] {
        self.args
    }

    /// The argument at `index`, `Value::Null` when absent.
    #[inline]
    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).cloned().unwrap_or_default()
    }

    /// Sets a field of the instance.
    #[inline]
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.instance.fields.insert(name.into(), value.into());
    }
}

// -----------------------------------------------------------------------------
// OnDeserialized

/// Type-level hook run once every field of an instance is restored.
#[derive(Clone)]
pub enum OnDeserialized {
    /// Called with the instance as owner and value.
    Function(Arc<dyn AfterLoad>),
    /// Name of a method invoked on the instance without arguments: a callable
    /// field of that name, or a native method registered on the type.
    Method(String),
}

// -----------------------------------------------------------------------------
// TypeMeta

/// Everything the codec knows about one registered type.
///
/// Fields without a [`FieldMeta`] use the type's default mode, which is
/// [`FieldMode::ALL`] unless changed with [`with_default_mode`].
///
/// [`with_default_mode`]: Self::with_default_mode
#[derive(Clone)]
pub struct TypeMeta {
    name: String,
    constructor: Constructor,
    default_mode: FieldMode,
    fields: IndexMap<String, FieldMeta>,
    params: Vec<ParamMeta>,
    methods: HashMap<String, NativeMethod>,
    on_deserialized: Option<OnDeserialized>,
}

impl TypeMeta {
    /// Metadata whose constructor leaves the instance empty.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constructor: Arc::new(empty_constructor),
            default_mode: FieldMode::ALL,
            fields: IndexMap::default(),
            params: Vec::new(),
            methods: HashMap::default(),
            on_deserialized: None,
        }
    }

    pub fn with_constructor<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Construct<'_>) -> Result<(), Error> + 'static,
    {
        self.constructor = Arc::new(f);
        self
    }

    #[inline]
    pub fn with_default_mode(mut self, mode: FieldMode) -> Self {
        self.default_mode = mode;
        self
    }

    /// Declares a field, replacing an earlier declaration of the same name.
    pub fn with_field(mut self, field: FieldMeta) -> Self {
        self.fields.insert(String::from(field.name()), field);
        self
    }

    /// Declares the next constructor parameter.
    #[inline]
    pub fn with_param(mut self, param: ParamMeta) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Heap, ObjectRef, &[Value]) -> Result<Value, EvalError> + 'static,
    {
        self.methods.insert(name.into(), Arc::new(f));
        self
    }

    #[inline]
    pub fn with_on_deserialized(mut self, hook: OnDeserialized) -> Self {
        self.on_deserialized = Some(hook);
        self
    }

    pub fn with_on_deserialized_fn<F>(self, f: F) -> Self
    where
        F: Fn(&Context<'_>, ObjectRef, &Value) -> Result<(), Error> + 'static,
    {
        self.with_on_deserialized(OnDeserialized::Function(Arc::new(AfterLoadFn(f))))
    }

    // -------------------------------------------------------------------------
    // Getters

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn constructor(&self) -> &Constructor {
        &self.constructor
    }

    #[inline]
    pub fn default_mode(&self) -> FieldMode {
        self.default_mode
    }

    #[inline]
    pub fn fields(&self) -> impl Iterator<Item = &FieldMeta> {
        self.fields.values()
    }

    #[inline]
    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.get(name)
    }

    #[inline]
    pub fn params(&self) -> &[ParamMeta] {
        &self.params
    }

    #[inline]
    pub fn method(&self, name: &str) -> Option<&NativeMethod> {
        self.methods.get(name)
    }

    #[inline]
    pub fn on_deserialized(&self) -> Option<&OnDeserialized> {
        self.on_deserialized.as_ref()
    }

    // -------------------------------------------------------------------------
    // Field selection

    /// The mode of `key`, falling back to the default mode.
    #[inline]
    pub fn mode_of(&self, key: &str) -> FieldMode {
        self.fields.get(key).map_or(self.default_mode, FieldMeta::mode)
    }

    /// Entries of `data` restored onto an instance, in data order.
    pub fn deserializable_keys<'a>(&self, data: &'a NodeMap) -> Vec<(&'a str, &'a Node)> {
        data.iter()
            .filter(|(key, _)| self.mode_of(key).deserializes())
            .map(|(key, node)| (key.as_str(), node))
            .collect()
    }

    /// Fields emitted for an instance: its own fields in order, then declared
    /// fields with a `to_plain` converter that the instance does not hold.
    pub fn serializable_keys(&self, fields: &Fields) -> Vec<String> {
        let own = fields
            .keys()
            .filter(|key| self.mode_of(key).serializes())
            .cloned();
        let computed = self
            .fields
            .values()
            .filter(|meta| {
                meta.mode().serializes()
                    && meta.to_plain().is_some()
                    && !fields.contains_key(meta.name())
            })
            .map(|meta| String::from(meta.name()));
        own.chain(computed).collect()
    }

    /// Allocates an instance and runs the constructor.
    ///
    /// `array_like` instances get an (empty) item list before the constructor
    /// runs.
    pub fn construct(&self, heap: &mut Heap, args: &[Value], array_like: bool) -> Result<Instance, Error> {
        let mut instance = if array_like {
            Instance::array_like(self.name.as_str())
        } else {
            Instance::new(self.name.as_str())
        };
        (self.constructor)(&mut Construct {
            heap,
            instance: &mut instance,
            args,
        })?;
        Ok(instance)
    }
}

fn empty_constructor(_: &mut Construct<'_>) -> Result<(), Error> {
    Ok(())
}

impl fmt::Debug for TypeMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMeta")
            .field("name", &self.name)
            .field("default_mode", &self.default_mode)
            .field("fields", &self.fields.values().collect::<Vec<_>>())
            .field("params", &self.params)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("on_deserialized", &self.on_deserialized.is_some())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// DescribeType

/// A Rust type that describes its own registration.
///
/// # Examples
///
/// ```
/// use og_serde::registry::{DescribeType, FieldMeta, FieldMode, TypeMeta, TypeRegistry};
///
/// struct Camera;
///
/// impl DescribeType for Camera {
///     fn describe() -> TypeMeta {
///         TypeMeta::new(Self::type_name())
///             .with_field(FieldMeta::new("frame").with_mode(FieldMode::TO_PLAIN_ONLY))
///     }
/// }
///
/// assert_eq!(Camera::type_name(), "Camera");
///
/// let mut registry = TypeRegistry::new();
/// assert!(registry.register_type::<Camera>());
/// assert!(registry.contains("Camera"));
/// ```
pub trait DescribeType: 'static {
    /// The `typename` of nodes of this type: the last path segment of
    /// [`core::any::type_name`]. Generic types should override it.
    fn type_name() -> &'static str {
        let full = core::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    fn describe() -> TypeMeta;
}

#[cfg(test)]
mod tests {
    use super::TypeMeta;
    use crate::node::{Node, NodeMap};
    use crate::registry::{FieldMeta, FieldMode};
    use og_graph::{Fields, Heap, Value};
    use alloc::string::String;
    use alloc::vec::Vec;

    fn sample() -> TypeMeta {
        TypeMeta::new("Sample")
            .with_field(FieldMeta::new("skip").with_mode(FieldMode::IGNORE))
            .with_field(FieldMeta::new("out").with_mode(FieldMode::TO_PLAIN_ONLY))
            .with_field(FieldMeta::new("in").with_mode(FieldMode::TO_CLASS_ONLY))
            .with_field(
                FieldMeta::new("derived").with_to_plain_fn(|_, _, _| Ok(Node::from("computed"))),
            )
    }

    #[test]
    fn deserializable_keys_follow_data_order() {
        let mut data = NodeMap::default();
        for key in ["in", "plain", "out", "skip"] {
            data.insert(String::from(key), Node::NULL);
        }
        let keys: Vec<&str> = sample()
            .deserializable_keys(&data)
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        assert_eq!(keys, ["in", "plain"]);
    }

    #[test]
    fn serializable_keys_append_computed_fields() {
        let mut fields = Fields::default();
        for key in ["plain", "in", "out", "skip"] {
            fields.insert(String::from(key), Value::Null);
        }
        assert_eq!(sample().serializable_keys(&fields), ["plain", "out", "derived"]);
    }

    #[test]
    fn default_mode_applies_to_undeclared_fields() {
        let meta = TypeMeta::new("Strict")
            .with_default_mode(FieldMode::IGNORE)
            .with_field(FieldMeta::new("kept"));
        assert_eq!(meta.mode_of("kept"), FieldMode::ALL);
        assert_eq!(meta.mode_of("other"), FieldMode::IGNORE);
    }

    #[test]
    fn construct_runs_constructor() {
        let meta = TypeMeta::new("Pair").with_constructor(|cx| {
            let (a, b) = (cx.arg(0), cx.arg(1));
            cx.set("a", a);
            cx.set("b", b);
            Ok(())
        });
        let mut heap = Heap::new();
        let pair = meta.construct(&mut heap, &[Value::from(1)], false).unwrap();
        assert_eq!(pair.type_name(), "Pair");
        assert_eq!(pair.field("a"), Some(&Value::Number(1.0)));
        assert_eq!(pair.field("b"), Some(&Value::Null));
        assert!(pair.items.is_none());

        let list = TypeMeta::new("List").construct(&mut heap, &[], true).unwrap();
        assert_eq!(list.items.as_deref(), Some(&[][..]));
    }
}
