use alloc::string::String;

use og_utils::HashMap;

use super::type_meta::{Constructor, DescribeType, TypeMeta};

// -----------------------------------------------------------------------------
// TypeRegistry

/// Table from type name to [`TypeMeta`].
///
/// A registry is an ordinary value: build one at startup, share it by
/// reference with every [`Context`](crate::Context), and clone or rebuild it
/// when a different set of types is needed (e.g. in tests).
///
/// # Examples
///
/// ```
/// use og_serde::registry::{TypeMeta, TypeRegistry};
///
/// let mut registry = TypeRegistry::new();
/// assert!(registry.register(TypeMeta::new("Point")));
/// // A name is registered once; the first registration wins.
/// assert!(!registry.register(TypeMeta::new("Point")));
///
/// assert!(registry.get_type("Point").is_some());
/// assert_eq!(registry.get_meta("Point").unwrap().name(), "Point");
///
/// assert_eq!(registry.remove_type(&["Point", "Missing"]), 1);
/// assert!(registry.get_meta("Point").is_none());
/// ```
#[derive(Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeMeta>,
}

impl TypeRegistry {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `meta` under its name if the name is free.
    ///
    /// Returns `false` and keeps the existing entry otherwise.
    pub fn register(&mut self, meta: TypeMeta) -> bool {
        if self.types.contains_key(meta.name()) {
            log::debug!("type `{}` is already registered", meta.name());
            return false;
        }
        self.types.insert(String::from(meta.name()), meta);
        true
    }

    /// Registers `meta`, replacing and returning any entry of the same name.
    pub fn insert(&mut self, meta: TypeMeta) -> Option<TypeMeta> {
        self.types.insert(String::from(meta.name()), meta)
    }

    /// Registers the metadata described by `T`.
    #[inline]
    pub fn register_type<T: DescribeType>(&mut self) -> bool {
        self.register(T::describe())
    }

    /// The constructor of `name`.
    #[inline]
    pub fn get_type(&self, name: &str) -> Option<&Constructor> {
        self.types.get(name).map(TypeMeta::constructor)
    }

    #[inline]
    pub fn get_meta(&self, name: &str) -> Option<&TypeMeta> {
        self.types.get(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Unregisters every listed name. Returns how many were registered.
    pub fn remove_type(&mut self, names: &[&str]) -> usize {
        names
            .iter()
            .filter(|name| self.types.remove(**name).is_some())
            .count()
    }

    /// Unregisters the type described by `T`.
    #[inline]
    pub fn remove<T: DescribeType>(&mut self) -> Option<TypeMeta> {
        self.types.remove(T::type_name())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered metadata, in no particular order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &TypeMeta> {
        self.types.values()
    }

    /// Registers every type submitted with [`submit_type!`](crate::submit_type).
    ///
    /// Names already present are kept. Returns `true` if automatic
    /// registration is available, i.e. the `auto_register` feature is on.
    #[cfg_attr(not(feature = "auto_register"), inline(always))]
    pub fn auto_register(&mut self) -> bool {
        #[cfg(feature = "auto_register")]
        {
            super::auto::register_all(self);
            true
        }
        #[cfg(not(feature = "auto_register"))]
        {
            false
        }
    }
}

impl core::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.types.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::TypeRegistry;
    use crate::registry::{DescribeType, FieldMeta, FieldMode, TypeMeta};

    struct Marker;

    impl DescribeType for Marker {
        fn describe() -> TypeMeta {
            TypeMeta::new(Self::type_name())
        }
    }

    #[test]
    fn register_keeps_first() {
        let mut registry = TypeRegistry::new();
        assert!(registry.register(TypeMeta::new("A")));
        assert!(!registry.register(
            TypeMeta::new("A").with_field(FieldMeta::new("x").with_mode(FieldMode::IGNORE))
        ));
        assert_eq!(registry.get_meta("A").unwrap().mode_of("x"), FieldMode::ALL);

        let old = registry.insert(TypeMeta::new("A").with_default_mode(FieldMode::IGNORE));
        assert!(old.is_some());
        assert_eq!(registry.get_meta("A").unwrap().mode_of("x"), FieldMode::IGNORE);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn typed_registration() {
        let mut registry = TypeRegistry::new();
        assert_eq!(Marker::type_name(), "Marker");
        assert!(registry.register_type::<Marker>());
        assert!(registry.contains("Marker"));
        assert!(registry.remove::<Marker>().is_some());
        assert!(registry.is_empty());
    }
}
