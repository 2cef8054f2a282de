use super::type_meta::TypeMeta;
use super::type_registry::TypeRegistry;

/// A type submitted for [`TypeRegistry::auto_register`].
///
/// Created by [`submit_type!`](crate::submit_type).
pub struct AutoRegistration {
    describe: fn() -> TypeMeta,
}

impl AutoRegistration {
    #[inline]
    pub const fn new(describe: fn() -> TypeMeta) -> Self {
        Self { describe }
    }
}

inventory::collect!(AutoRegistration);

pub(super) fn register_all(registry: &mut TypeRegistry) {
    for entry in inventory::iter::<AutoRegistration> {
        registry.register((entry.describe)());
    }
}

/// Submits a [`DescribeType`](crate::registry::DescribeType) implementor for
/// [`TypeRegistry::auto_register`].
///
/// ```
/// use og_serde::registry::{DescribeType, TypeMeta, TypeRegistry};
///
/// struct Light;
///
/// impl DescribeType for Light {
///     fn describe() -> TypeMeta {
///         TypeMeta::new(Self::type_name())
///     }
/// }
///
/// og_serde::submit_type!(Light);
///
/// fn main() {
///     let mut registry = TypeRegistry::new();
///     assert!(registry.auto_register());
///     assert!(registry.contains("Light"));
/// }
/// ```
#[macro_export]
macro_rules! submit_type {
    ($ty:ty) => {
        $crate::__macro_exports::inventory::submit! {
            $crate::registry::AutoRegistration::new(
                <$ty as $crate::registry::DescribeType>::describe
            )
        }
    };
}
