//! Graph reconstruction: node tree to live graph.
//!
//! Every object is bound to its id before any of its children is resolved,
//! so a child may refer back to an ancestor. Named fields are restored one
//! after another in data order; indexed items are resolved concurrently and
//! joined.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use futures::future::try_join_all;
use og_graph::{Array, Callable, Fields, Object, ObjectRef, Value};
use og_task::LocalBoxedFuture;

use crate::context::Context;
use crate::cursor::Cursor;
use crate::error::Error;
use crate::node::{CallableNode, Node, NodeMap, ObjectNode};
use crate::registry::{FieldMeta, OnDeserialized, ParamMeta, ProviderCx, TypeMeta};

/// Resolves `node`, found at `cursor`, into a live value.
pub(crate) fn reconstruct<'a>(
    cx: &'a Context<'_>,
    node: &'a Node,
    cursor: Cursor,
) -> LocalBoxedFuture<'a, Result<Value, Error>> {
    Box::pin(async move {
        cx.checkpoint()?;
        match node {
            Node::Primitive(primitive) => {
                cx.tick(node);
                Ok(Value::from(primitive.clone()))
            }
            Node::Ref(reference) => {
                log::trace!("resolve reference `{}`", reference.id);
                cx.get_from_key(&reference.id)
                    .map(Value::Object)
                    .ok_or_else(|| Error::ReferenceNotFound {
                        id: reference.id.clone(),
                    })
            }
            Node::Callable(callable) => reconstruct_callable(cx, callable, &cursor).await,
            Node::Object(object) if object.array.is_some() => {
                reconstruct_sequence(cx, object, &cursor).await
            }
            Node::Object(object) if object.is_plain_array() => Err(Error::Malformed {
                id: object.id.clone(),
                reason: String::from("an `Array` node needs an `array` entry"),
            }),
            Node::Object(object) => reconstruct_object(cx, object, &cursor).await,
        }
    })
}

// -----------------------------------------------------------------------------
// Objects

async fn reconstruct_object(cx: &Context<'_>, node: &ObjectNode, cursor: &Cursor) -> Result<Value, Error> {
    if node.is_plain_object() {
        log::trace!("reconstruct object `{}`", node.id);
        let object = cx.heap_mut().insert(Fields::default());
        cx.add(object, &node.id)?;
        if let Some(data) = &node.data {
            populate_all(cx, object, data).await?;
        }
        return Ok(Value::Object(object));
    }

    let meta = lookup(cx, node)?;
    log::trace!("reconstruct `{}` instance `{}`", node.typename, node.id);
    let instance = construct(cx, meta, node, cursor, false).await?;
    if let Some(data) = &node.data {
        populate_declared(cx, meta, instance, data).await?;
    }
    after_load(cx, meta, instance).await?;
    Ok(Value::Object(instance))
}

async fn reconstruct_sequence(cx: &Context<'_>, node: &ObjectNode, cursor: &Cursor) -> Result<Value, Error> {
    let items = node.array.as_deref().unwrap_or_default();

    if node.is_plain_array() {
        log::trace!("reconstruct array `{}` ({} items)", node.id, items.len());
        let array = cx.heap_mut().insert(Array::default());
        cx.add(array, &node.id)?;
        if let Some(data) = &node.data {
            populate_all(cx, array, data).await?;
        }
        let values = reconstruct_items(cx, array, items).await?;
        cx.heap_mut().set_items(array, values)?;
        return Ok(Value::Object(array));
    }

    let meta = lookup(cx, node)?;
    log::trace!(
        "reconstruct `{}` sequence `{}` ({} items)",
        node.typename,
        node.id,
        items.len()
    );
    let instance = construct(cx, meta, node, cursor, true).await?;
    if let Some(data) = &node.data {
        populate_declared(cx, meta, instance, data).await?;
    }
    let values = reconstruct_items(cx, instance, items).await?;
    cx.heap_mut().set_items(instance, values)?;
    after_load(cx, meta, instance).await?;
    Ok(Value::Object(instance))
}

fn lookup<'r>(cx: &Context<'r>, node: &ObjectNode) -> Result<&'r TypeMeta, Error> {
    cx.registry()
        .get_meta(&node.typename)
        .ok_or_else(|| Error::UnregisteredType {
            name: node.typename.clone(),
        })
}

/// Builds the arguments, runs the constructor and binds the new instance.
async fn construct(
    cx: &Context<'_>,
    meta: &TypeMeta,
    node: &ObjectNode,
    cursor: &Cursor,
    array_like: bool,
) -> Result<ObjectRef, Error> {
    let args = reconstruct_args(cx, node.param.as_deref(), meta.params(), cursor).await?;
    let instance = {
        let mut heap = cx.heap_mut();
        let instance = meta.construct(&mut *heap, &args, array_like)?;
        heap.insert(instance)
    };
    cx.add(instance, &node.id)?;
    Ok(instance)
}

/// Restores every entry of `data`, for plain objects and arrays.
async fn populate_all(cx: &Context<'_>, owner: ObjectRef, data: &NodeMap) -> Result<(), Error> {
    for (key, child) in data {
        let value = reconstruct(cx, child, Cursor::field(owner, key.as_str())).await?;
        cx.heap_mut().set_field(owner, key.as_str(), value)?;
    }
    Ok(())
}

/// Restores the deserializable entries of `data` onto an instance.
async fn populate_declared(
    cx: &Context<'_>,
    meta: &TypeMeta,
    instance: ObjectRef,
    data: &NodeMap,
) -> Result<(), Error> {
    for (key, child) in meta.deserializable_keys(data) {
        cx.checkpoint()?;
        let field = meta.field(key);
        let cursor = Cursor::field(instance, key);
        let value = match field.and_then(FieldMeta::to_class) {
            Some(converter) => {
                cx.tick(child);
                converter.to_class(cx, child, &cursor).await?
            }
            None => reconstruct(cx, child, cursor).await?,
        };
        cx.heap_mut().set_field(instance, key, value.clone())?;

        if let Some(hook) = field.and_then(FieldMeta::on_deserialized) {
            hook.after_load(cx, instance, &value).await?;
        }
    }
    Ok(())
}

/// Resolves indexed items concurrently, each with its own cursor.
async fn reconstruct_items(cx: &Context<'_>, owner: ObjectRef, items: &[Node]) -> Result<Vec<Value>, Error> {
    try_join_all(
        items
            .iter()
            .enumerate()
            .map(|(index, item)| reconstruct(cx, item, Cursor::index(owner, index))),
    )
    .await
}

async fn after_load(cx: &Context<'_>, meta: &TypeMeta, instance: ObjectRef) -> Result<(), Error> {
    let Some(hook) = meta.on_deserialized() else {
        return Ok(());
    };
    cx.checkpoint()?;
    match hook {
        OnDeserialized::Function(hook) => {
            hook.after_load(cx, instance, &Value::Object(instance)).await
        }
        OnDeserialized::Method(name) => cx.invoke_method(instance, name),
    }
}

// -----------------------------------------------------------------------------
// Arguments

/// Builds an argument list slot by slot.
///
/// A slot with a node is reconstructed (through the parameter's converter if
/// it has one); a slot without falls back to the parameter's declared source.
async fn reconstruct_args(
    cx: &Context<'_>,
    given: Option<&[Node]>,
    params: &[ParamMeta],
    cursor: &Cursor,
) -> Result<Vec<Value>, Error> {
    let given = given.unwrap_or_default();
    let len = given.len().max(params.len());
    let mut args = Vec::with_capacity(len);

    for index in 0..len {
        cx.checkpoint()?;
        let param = params.get(index);
        let value = match given.get(index) {
            Some(node) => match param.and_then(ParamMeta::to_class) {
                Some(converter) => {
                    cx.tick(node);
                    converter.to_class(cx, node, cursor).await?
                }
                None => reconstruct(cx, node, cursor.clone()).await?,
            },
            None => match param {
                Some(param) => resolve_param(cx, param, cursor)?,
                None => Value::Null,
            },
        };
        args.push(value);
    }
    Ok(args)
}

fn resolve_param(cx: &Context<'_>, param: &ParamMeta, cursor: &Cursor) -> Result<Value, Error> {
    let heap = cx.heap();
    param.resolve(&ProviderCx::new(&heap, cursor))
}

// -----------------------------------------------------------------------------
// Callables

async fn reconstruct_callable(cx: &Context<'_>, node: &CallableNode, cursor: &Cursor) -> Result<Value, Error> {
    if !cx.allows_callables() {
        return Err(Error::CallablesDisabled {
            id: node.id.clone(),
        });
    }
    log::trace!("compile callable `{}`", node.id);
    let mut callable = Callable::new(node.param_define.clone(), node.body.as_str());
    callable.compile()?;
    let object = cx.heap_mut().insert(callable);
    cx.add(object, &node.id)?;

    if let Some((owner, field)) = run_on_load_field(cx, cursor) {
        let args = reconstruct_args(cx, node.param.as_deref(), field.params(), cursor).await?;
        cx.checkpoint()?;
        log::trace!("run callable `{}` on load", node.id);
        cx.call(object, Some(owner), &args)?;
    }
    Ok(Value::Object(object))
}

/// The owner and field metadata when the cursor points at a field marked
/// [`FieldMode::RUN_ON_DESERIALIZE`](crate::registry::FieldMode::RUN_ON_DESERIALIZE).
fn run_on_load_field<'r>(cx: &Context<'r>, cursor: &Cursor) -> Option<(ObjectRef, &'r FieldMeta)> {
    let owner = cursor.parent()?;
    let name = cursor.field_name()?;
    let type_name = match cx.heap().get(owner)? {
        Object::Instance(instance) => String::from(instance.type_name()),
        _ => return None,
    };
    let field = cx.registry().get_meta(&type_name)?.field(name)?;
    field.mode().runs_on_deserialize().then_some((owner, field))
}
