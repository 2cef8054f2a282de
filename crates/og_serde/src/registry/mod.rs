//! Type and metadata registry.
//!
//! A [`TypeRegistry`] maps a type name (the `typename` of a node) to a
//! [`TypeMeta`]: how to construct the type, which fields are emitted and
//! restored ([`FieldMode`]), custom converters, constructor parameter
//! providers, native methods and the post-load hook.
//!
//! Metadata is built with plain builder calls at startup:
//!
//! ```
//! use og_serde::registry::{FieldMeta, FieldMode, ParamMeta, TypeMeta, TypeRegistry};
//!
//! let mut registry = TypeRegistry::new();
//! registry.register(
//!     TypeMeta::new("Child")
//!         // The first constructor argument is the object owning the child.
//!         .with_param(ParamMeta::provider(|cx| Ok(cx.parent_value())))
//!         .with_constructor(|cx| {
//!             let parent = cx.arg(0);
//!             cx.instance.fields.insert("parent".into(), parent);
//!             Ok(())
//!         })
//!         .with_field(FieldMeta::new("parent").with_mode(FieldMode::IGNORE)),
//! );
//!
//! assert!(registry.contains("Child"));
//! assert_eq!(registry.get_meta("Child").unwrap().mode_of("parent"), FieldMode::IGNORE);
//! ```
//!
//! ## auto_register
//!
//! With the `auto_register` feature, types implementing [`DescribeType`] can
//! be submitted with [`submit_type!`](crate::submit_type) anywhere in the
//! program and collected by [`TypeRegistry::auto_register`].

// -----------------------------------------------------------------------------
// Modules

mod convert;
mod field_meta;
mod param_meta;
mod type_meta;
mod type_registry;

#[cfg(feature = "auto_register")]
mod auto;

// -----------------------------------------------------------------------------
// Exports

pub use convert::{AfterLoad, AfterLoadFn, ToClass, ToClassFn, ToPlain, ToPlainFn};
pub use field_meta::{FieldMeta, FieldMode};
pub use param_meta::{ParamMeta, ParamSource, Provider, ProviderCx};
pub use type_meta::{Construct, Constructor, DescribeType, OnDeserialized, TypeMeta};
pub use type_registry::TypeRegistry;

#[cfg(feature = "auto_register")]
pub use auto::AutoRegistration;
