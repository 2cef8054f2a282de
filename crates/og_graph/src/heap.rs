use alloc::string::String;
use alloc::vec::Vec;

use slotmap::SlotMap;

use crate::error::EvalError;
use crate::object::Object;
use crate::value::Value;

slotmap::new_key_type! {
    /// Identity of a heap object.
    ///
    /// Keys are never reused for a different object while the heap lives, so
    /// comparing two keys compares object identity.
    pub struct ObjectRef;
}

// -----------------------------------------------------------------------------
// Heap

/// Arena owning every object of a live graph.
///
/// # Examples
///
/// ```
/// use og_graph::{Fields, Heap, Object, Value};
///
/// let mut heap = Heap::new();
/// let a = heap.insert(Object::Plain(Fields::default()));
/// let b = heap.insert(Object::Plain(Fields::default()));
///
/// // A two-object cycle.
/// heap.set_field(a, "next", Value::Object(b)).unwrap();
/// heap.set_field(b, "next", Value::Object(a)).unwrap();
///
/// assert_eq!(heap.field(a, "next"), Some(&Value::Object(b)));
/// assert_eq!(heap.field(b, "next"), Some(&Value::Object(a)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Heap {
    objects: SlotMap<ObjectRef, Object>,
}

impl Heap {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn insert(&mut self, object: impl Into<Object>) -> ObjectRef {
        self.objects.insert(object.into())
    }

    #[inline]
    pub fn get(&self, object: ObjectRef) -> Option<&Object> {
        self.objects.get(object)
    }

    #[inline]
    pub fn get_mut(&mut self, object: ObjectRef) -> Option<&mut Object> {
        self.objects.get_mut(object)
    }

    /// Removes an object. Values still pointing at it become dangling.
    #[inline]
    pub fn remove(&mut self, object: ObjectRef) -> Option<Object> {
        self.objects.remove(object)
    }

    #[inline]
    pub fn contains(&self, object: ObjectRef) -> bool {
        self.objects.contains_key(object)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectRef, &Object)> {
        self.objects.iter()
    }

    /// The object's type name, see [`Object::type_name`].
    #[inline]
    pub fn type_name(&self, object: ObjectRef) -> Option<&str> {
        self.get(object).map(Object::type_name)
    }

    // -------------------------------------------------------------------------
    // Fields and items

    /// Returns a named field, `None` if the object or field is absent.
    #[inline]
    pub fn field(&self, object: ObjectRef, name: &str) -> Option<&Value> {
        self.get(object)?.fields()?.get(name)
    }

    /// Inserts or replaces a named field, keeping the position of an existing one.
    pub fn set_field(
        &mut self,
        object: ObjectRef,
        name: impl Into<String>,
        value: Value,
    ) -> Result<(), EvalError> {
        let target = self
            .objects
            .get_mut(object)
            .ok_or(EvalError::UnknownObject(object))?;
        match target.fields_mut() {
            Some(fields) => {
                fields.insert(name.into(), value);
                Ok(())
            }
            None => Err(EvalError::NotAnObject(String::from(target.type_name()))),
        }
    }

    #[inline]
    pub fn items(&self, object: ObjectRef) -> Option<&[Value]> {
        self.get(object)?.items()
    }

    /// Replaces all items of an array or array-like instance.
    pub fn set_items(&mut self, object: ObjectRef, items: Vec<Value>) -> Result<(), EvalError> {
        *self.items_slot(object)? = items;
        Ok(())
    }

    /// Writes one item, padding with [`Value::Null`] when `index` is past the end.
    pub fn set_item(&mut self, object: ObjectRef, index: usize, value: Value) -> Result<(), EvalError> {
        let items = self.items_slot(object)?;
        if index >= items.len() {
            items.resize(index + 1, Value::Null);
        }
        items[index] = value;
        Ok(())
    }

    fn items_slot(&mut self, object: ObjectRef) -> Result<&mut Vec<Value>, EvalError> {
        let target = self
            .objects
            .get_mut(object)
            .ok_or(EvalError::UnknownObject(object))?;
        let name = String::from(target.type_name());
        target.items_mut().ok_or(EvalError::NotAnObject(name))
    }
}

#[cfg(test)]
mod tests {
    use super::Heap;
    use crate::error::EvalError;
    use crate::object::{Array, Callable, Fields, Instance, Object};
    use crate::value::Value;
    use alloc::vec;

    #[test]
    fn identity() {
        let mut heap = Heap::new();
        let a = heap.insert(Fields::default());
        let b = heap.insert(Fields::default());
        assert_ne!(a, b);
        assert_eq!(Value::Object(a), Value::Object(a));
        assert_eq!(heap.len(), 2);

        heap.remove(a);
        assert!(!heap.contains(a));
        assert_eq!(heap.field(a, "x"), None);
    }

    #[test]
    fn set_field_keeps_order() {
        let mut heap = Heap::new();
        let obj = heap.insert(Instance::new("Point"));
        heap.set_field(obj, "x", Value::from(1)).unwrap();
        heap.set_field(obj, "y", Value::from(2)).unwrap();
        heap.set_field(obj, "x", Value::from(3)).unwrap();

        let Some(Object::Instance(point)) = heap.get(obj) else {
            panic!("expected an instance");
        };
        let keys: vec::Vec<&str> = point.fields.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["x", "y"]);
        assert_eq!(point.field("x"), Some(&Value::Number(3.0)));
    }

    #[test]
    fn set_item_pads() {
        let mut heap = Heap::new();
        let list = heap.insert(Array::new(vec![Value::from(1)]));
        heap.set_item(list, 2, Value::from("c")).unwrap();
        assert_eq!(
            heap.items(list),
            Some(&[Value::from(1), Value::Null, Value::from("c")][..])
        );
    }

    #[test]
    fn shape_errors() {
        let mut heap = Heap::new();
        let func = heap.insert(Callable::new(vec![], ""));
        let point = heap.insert(Instance::new("Point"));

        assert_eq!(
            heap.set_field(func, "x", Value::Null),
            Err(EvalError::NotAnObject("Function".into()))
        );
        assert_eq!(
            heap.set_items(point, vec![]),
            Err(EvalError::NotAnObject("Point".into()))
        );

        heap.remove(point);
        assert_eq!(
            heap.set_field(point, "x", Value::Null),
            Err(EvalError::UnknownObject(point))
        );
    }
}
