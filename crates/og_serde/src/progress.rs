//! Work estimation for a reconstruction.
//!
//! The estimate walks the node tree the same way the reconstructor will and
//! counts its units of work: one per primitive reconstructed generically and
//! one per custom converter invocation. Converter subtrees are opaque and are
//! not descended. Reference nodes cost nothing. A type that is not registered
//! counts zero, since reconstructing it fails anyway.

use crate::node::Node;
use crate::registry::{FieldMeta, ParamMeta, TypeMeta, TypeRegistry};

/// Number of units reconstructing `node` will process.
///
/// # Examples
///
/// ```
/// use og_serde::node::{Node, ObjectNode};
/// use og_serde::progress::estimate_total;
/// use og_serde::TypeRegistry;
///
/// let node: Node = ObjectNode::array("items", vec![1.into(), "two".into(), Node::reference("items")]).into();
///
/// assert_eq!(estimate_total(&TypeRegistry::new(), &node), 2);
/// ```
pub fn estimate_total(registry: &TypeRegistry, node: &Node) -> usize {
    count(registry, node, None)
}

/// `owner` is the instance type and field name `node` is stored under.
fn count(registry: &TypeRegistry, node: &Node, owner: Option<(&TypeMeta, &str)>) -> usize {
    match node {
        Node::Primitive(_) => 1,
        Node::Ref(_) => 0,
        Node::Callable(callable) => {
            let Some(field) = owner.and_then(|(meta, key)| meta.field(key)) else {
                return 0;
            };
            if !field.mode().runs_on_deserialize() {
                return 0;
            }
            count_args(registry, callable.param.as_deref(), field.params())
        }
        Node::Object(object) if object.is_plain_object() || object.is_plain_array() => {
            let named: usize = object
                .data
                .iter()
                .flat_map(|data| data.values())
                .map(|child| count(registry, child, None))
                .sum();
            named + count_items(registry, object.array.as_deref())
        }
        Node::Object(object) => {
            let Some(meta) = registry.get_meta(&object.typename) else {
                return 0;
            };
            let args = count_args(registry, object.param.as_deref(), meta.params());
            let named: usize = match &object.data {
                Some(data) => meta
                    .deserializable_keys(data)
                    .into_iter()
                    .map(|(key, child)| match meta.field(key).and_then(FieldMeta::to_class) {
                        Some(_) => 1,
                        None => count(registry, child, Some((meta, key))),
                    })
                    .sum(),
                None => 0,
            };
            args + named + count_items(registry, object.array.as_deref())
        }
    }
}

fn count_args(registry: &TypeRegistry, given: Option<&[Node]>, params: &[ParamMeta]) -> usize {
    given
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(index, node)| {
            match params.get(index).and_then(ParamMeta::to_class) {
                Some(_) => 1,
                None => count(registry, node, None),
            }
        })
        .sum()
}

fn count_items(registry: &TypeRegistry, items: Option<&[Node]>) -> usize {
    items
        .unwrap_or_default()
        .iter()
        .map(|item| count(registry, item, None))
        .sum()
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::estimate_total;
    use crate::node::{CallableNode, Node, ObjectNode};
    use crate::registry::{FieldMeta, FieldMode, ParamMeta, TypeMeta, TypeRegistry};
    use og_graph::Value;

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register(
            TypeMeta::new("Mul")
                .with_param(ParamMeta::none().with_to_class_fn(|_, _, _| Ok(Value::Null)))
                .with_field(FieldMeta::new("hidden").with_mode(FieldMode::IGNORE))
                .with_field(FieldMeta::new("custom").with_to_class_fn(|_, _, _| Ok(Value::Null)))
                .with_field(
                    FieldMeta::new("mul")
                        .with_mode(FieldMode::ALL | FieldMode::RUN_ON_DESERIALIZE)
                        .with_param(ParamMeta::literal(3)),
                ),
        );
        registry
    }

    #[test]
    fn primitives_count_and_references_do_not() {
        let node: Node = ObjectNode::plain("root")
            .with_data("a", 1.into())
            .with_data("b", "text".into())
            .with_data("self", Node::reference("root"))
            .into();
        assert_eq!(estimate_total(&TypeRegistry::new(), &node), 2);
    }

    #[test]
    fn plain_arrays_count_named_and_indexed() {
        let node: Node = ObjectNode::array("list", vec![1.into(), 2.into(), 3.into()])
            .with_data("label", "xs".into())
            .into();
        assert_eq!(estimate_total(&TypeRegistry::new(), &node), 4);
    }

    #[test]
    fn typed_nodes_mirror_field_filtering() {
        let registry = registry();
        let node: Node = ObjectNode::new("m", "Mul")
            // converter slot: one unit, its subtree is opaque
            .with_param(vec![ObjectNode::array("opaque", vec![1.into(), 2.into()]).into()])
            .with_data("hidden", 10.into())
            .with_data("custom", ObjectNode::array("c", vec![1.into(), 2.into()]).into())
            .with_data("n", 2.into())
            .with_data(
                "mul",
                CallableNode::new("f", ["a", "b"], "return a * b;")
                    .with_param(vec![3.into(), 2.into()])
                    .into(),
            )
            .into();
        // param 1 + custom 1 + n 1 + mul params 2
        assert_eq!(estimate_total(&registry, &node), 5);
    }

    #[test]
    fn callables_outside_run_fields_are_free() {
        let node: Node = ObjectNode::plain("o")
            .with_data(
                "f",
                CallableNode::new("f", ["a"], "return a;")
                    .with_param(vec![1.into()])
                    .into(),
            )
            .into();
        assert_eq!(estimate_total(&registry(), &node), 0);
    }

    #[test]
    fn unregistered_types_count_zero() {
        let node: Node = ObjectNode::new("x", "Nope").with_data("a", 1.into()).into();
        assert_eq!(estimate_total(&TypeRegistry::new(), &node), 0);
    }
}
