use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use og_script::{ParseError, Program};
use og_utils::IndexMap;

use crate::value::Value;

/// Named fields of an object, in insertion order.
pub type Fields = IndexMap<String, Value>;

// -----------------------------------------------------------------------------
// Object

/// A heap object.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Plain(Fields),
    Array(Array),
    Instance(Instance),
    Callable(Callable),
}

impl Object {
    /// Name used in diagnostics and by the `typename` of a flattened node.
    pub fn type_name(&self) -> &str {
        match self {
            Object::Plain(_) => "Object",
            Object::Array(_) => "Array",
            Object::Instance(instance) => instance.type_name(),
            Object::Callable(_) => "Function",
        }
    }

    /// Named fields. Callables have none.
    #[inline]
    pub fn fields(&self) -> Option<&Fields> {
        match self {
            Object::Plain(fields) => Some(fields),
            Object::Array(array) => Some(&array.fields),
            Object::Instance(instance) => Some(&instance.fields),
            Object::Callable(_) => None,
        }
    }

    #[inline]
    pub fn fields_mut(&mut self) -> Option<&mut Fields> {
        match self {
            Object::Plain(fields) => Some(fields),
            Object::Array(array) => Some(&mut array.fields),
            Object::Instance(instance) => Some(&mut instance.fields),
            Object::Callable(_) => None,
        }
    }

    /// Indexed items of arrays and array-like instances.
    #[inline]
    pub fn items(&self) -> Option<&[Value]> {
        match self {
            Object::Array(array) => Some(&array.items),
            Object::Instance(instance) => instance.items.as_deref(),
            _ => None,
        }
    }

    #[inline]
    pub fn items_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Object::Array(array) => Some(&mut array.items),
            Object::Instance(instance) => instance.items.as_mut(),
            _ => None,
        }
    }

    #[inline]
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Object::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    #[inline]
    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Object::Callable(callable) => Some(callable),
            _ => None,
        }
    }
}

impl From<Fields> for Object {
    #[inline]
    fn from(fields: Fields) -> Self {
        Object::Plain(fields)
    }
}

impl From<Array> for Object {
    #[inline]
    fn from(array: Array) -> Self {
        Object::Array(array)
    }
}

impl From<Instance> for Object {
    #[inline]
    fn from(instance: Instance) -> Self {
        Object::Instance(instance)
    }
}

impl From<Callable> for Object {
    #[inline]
    fn from(callable: Callable) -> Self {
        Object::Callable(callable)
    }
}

// -----------------------------------------------------------------------------
// Array

/// An ordered sequence, optionally carrying named fields besides its items.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Array {
    pub items: Vec<Value>,
    pub fields: Fields,
}

impl Array {
    #[inline]
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            items,
            fields: Fields::default(),
        }
    }
}

impl From<Vec<Value>> for Array {
    #[inline]
    fn from(items: Vec<Value>) -> Self {
        Self::new(items)
    }
}

// -----------------------------------------------------------------------------
// Instance

/// An object of a registered type.
///
/// `items` is `Some` for array-like types, whose nodes carry an `array`
/// payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    type_name: String,
    pub fields: Fields,
    pub items: Option<Vec<Value>>,
}

impl Instance {
    #[inline]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Fields::default(),
            items: None,
        }
    }

    /// Creates an array-like instance with no items.
    #[inline]
    pub fn array_like(type_name: impl Into<String>) -> Self {
        Self {
            items: Some(Vec::new()),
            ..Self::new(type_name)
        }
    }

    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[inline]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Builder form of inserting a field.
    #[inline]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

// -----------------------------------------------------------------------------
// Callable

/// A function value: parameter names plus body text.
///
/// The body is parsed on first [`compile`](Self::compile) and the program is
/// cached; cloning a compiled callable shares the program.
#[derive(Debug, Clone, PartialEq)]
pub struct Callable {
    params: Vec<String>,
    body: String,
    program: Option<Arc<Program>>,
}

impl Callable {
    pub fn new(params: Vec<String>, body: impl Into<String>) -> Self {
        Self {
            params,
            body: body.into(),
            program: None,
        }
    }

    #[inline]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    #[inline]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[inline]
    pub fn program(&self) -> Option<&Arc<Program>> {
        self.program.as_ref()
    }

    #[inline]
    pub fn is_compiled(&self) -> bool {
        self.program.is_some()
    }

    /// Parse the body, or return the cached program.
    pub fn compile(&mut self) -> Result<Arc<Program>, ParseError> {
        if let Some(program) = &self.program {
            return Ok(program.clone());
        }
        let program = Arc::new(og_script::parse(&self.params, &self.body)?);
        log::trace!("compiled callable ({} params)", self.params.len());
        self.program = Some(program.clone());
        Ok(program)
    }
}

#[cfg(test)]
mod tests {
    use super::{Array, Callable, Instance, Object};
    use crate::value::Value;
    use alloc::string::String;
    use alloc::sync::Arc;
    use alloc::vec;

    #[test]
    fn type_names() {
        assert_eq!(Object::Plain(Default::default()).type_name(), "Object");
        assert_eq!(Object::Array(Array::default()).type_name(), "Array");
        assert_eq!(Object::from(Instance::new("Vec2")).type_name(), "Vec2");
        assert_eq!(Object::from(Callable::new(vec![], "")).type_name(), "Function");
    }

    #[test]
    fn items_of_array_like() {
        let plain = Object::from(Instance::new("Point"));
        assert!(plain.items().is_none());

        let mut list = Object::from(Instance::array_like("List"));
        list.items_mut().unwrap().push(Value::Number(1.0));
        assert_eq!(list.items(), Some(&[Value::Number(1.0)][..]));
    }

    #[test]
    fn compile_is_cached() {
        let mut callable = Callable::new(vec![String::from("a")], "return a;");
        assert!(!callable.is_compiled());

        let first = callable.compile().unwrap();
        let second = callable.compile().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.params(), ["a"]);
    }

    #[test]
    fn compile_error() {
        let mut callable = Callable::new(vec![], "return (;");
        assert!(callable.compile().is_err());
        assert!(!callable.is_compiled());
    }
}
