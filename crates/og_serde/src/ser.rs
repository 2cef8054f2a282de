//! Graph flattening: live graph to node tree.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use og_graph::{Array, Callable, Fields, Instance, Object, ObjectRef, Value};
use og_task::LocalBoxedFuture;

use crate::context::Context;
use crate::cursor::Cursor;
use crate::error::Error;
use crate::node::{ARRAY, CallableNode, Node, NodeMap, OBJECT, ObjectNode, Primitive};
use crate::registry::{FieldMeta, ParamMeta, ProviderCx};

/// Flattens `value`, found at `cursor`, into a node.
///
/// An object already emitted during the current top-level call is written as
/// a reference node.
pub(crate) fn flatten<'a>(
    cx: &'a Context<'_>,
    value: &'a Value,
    cursor: Cursor,
) -> LocalBoxedFuture<'a, Result<Node, Error>> {
    Box::pin(async move {
        cx.checkpoint()?;
        let object = match value {
            Value::Object(object) => *object,
            other => {
                return Ok(Node::Primitive(
                    Primitive::from_value(other).unwrap_or_default(),
                ));
            }
        };

        if !cx.mark_seen(object) {
            let id = cx.id_of(object).ok_or(Error::MissingObject(object))?;
            log::trace!("flatten reference `{id}`");
            return Ok(Node::reference(id));
        }

        let snapshot = cx
            .heap()
            .get(object)
            .cloned()
            .ok_or(Error::MissingObject(object))?;
        match snapshot {
            Object::Plain(fields) => flatten_plain(cx, object, &fields).await,
            Object::Array(array) => flatten_array(cx, object, &array).await,
            Object::Instance(instance) => flatten_instance(cx, object, &instance, &cursor).await,
            Object::Callable(callable) => flatten_callable(cx, object, &callable, &cursor).await,
        }
    })
}

/// A string `id` field names the node.
fn preferred_id(fields: &Fields) -> Option<&str> {
    fields.get("id").and_then(Value::as_str)
}

async fn flatten_plain(cx: &Context<'_>, object: ObjectRef, fields: &Fields) -> Result<Node, Error> {
    let id = cx.assign_id(object, preferred_id(fields));
    log::trace!("flatten object `{id}`");
    let data = flatten_fields(cx, object, fields).await?;
    Ok(ObjectNode {
        id,
        typename: String::from(OBJECT),
        data: Some(data),
        array: None,
        param: None,
    }
    .into())
}

async fn flatten_array(cx: &Context<'_>, object: ObjectRef, array: &Array) -> Result<Node, Error> {
    let id = cx.assign_id(object, None);
    log::trace!("flatten array `{id}` ({} items)", array.items.len());
    let data = if array.fields.is_empty() {
        None
    } else {
        Some(flatten_fields(cx, object, &array.fields).await?)
    };
    let items = flatten_items(cx, object, &array.items).await?;
    Ok(ObjectNode {
        id,
        typename: String::from(ARRAY),
        data,
        array: Some(items),
        param: None,
    }
    .into())
}

async fn flatten_instance(
    cx: &Context<'_>,
    object: ObjectRef,
    instance: &Instance,
    cursor: &Cursor,
) -> Result<Node, Error> {
    let id = cx.assign_id(object, preferred_id(&instance.fields));
    let typename = String::from(instance.type_name());

    let Some(meta) = cx.registry().get_meta(&typename) else {
        log::warn!("type `{typename}` is not registered, flattening all of its fields");
        let data = flatten_fields(cx, object, &instance.fields).await?;
        let array = match &instance.items {
            Some(items) => Some(flatten_items(cx, object, items).await?),
            None => None,
        };
        return Ok(ObjectNode {
            id,
            typename,
            data: Some(data),
            array,
            param: None,
        }
        .into());
    };

    log::trace!("flatten `{typename}` instance `{id}`");
    let param = if meta.params().is_empty() {
        None
    } else {
        Some(flatten_params(cx, meta.params(), cursor).await?)
    };

    let mut data = NodeMap::default();
    for key in meta.serializable_keys(&instance.fields) {
        cx.checkpoint()?;
        let value = instance.fields.get(&key).cloned().unwrap_or_default();
        let field_cursor = Cursor::field(object, key.as_str());
        let node = match meta.field(&key).and_then(FieldMeta::to_plain) {
            Some(converter) => converter.to_plain(cx, &value, &field_cursor).await?,
            None => flatten(cx, &value, field_cursor).await?,
        };
        data.insert(key, node);
    }

    let array = match &instance.items {
        Some(items) => Some(flatten_items(cx, object, items).await?),
        None => None,
    };

    Ok(ObjectNode {
        id,
        typename,
        data: Some(data),
        array,
        param,
    }
    .into())
}

async fn flatten_callable(
    cx: &Context<'_>,
    object: ObjectRef,
    callable: &Callable,
    cursor: &Cursor,
) -> Result<Node, Error> {
    let id = cx.assign_id(object, None);
    log::trace!("flatten callable `{id}`");
    let param = match owning_field(cx, cursor) {
        Some(field) if !field.params().is_empty() => {
            Some(flatten_params(cx, field.params(), cursor).await?)
        }
        _ => None,
    };
    Ok(CallableNode {
        id,
        param_define: callable.params().to_vec(),
        body: String::from(callable.body()),
        param,
    }
    .into())
}

/// Field metadata of the field the cursor points at, if its owner is a
/// registered instance.
fn owning_field<'r>(cx: &Context<'r>, cursor: &Cursor) -> Option<&'r FieldMeta> {
    let owner = cursor.parent()?;
    let name = cursor.field_name()?;
    let type_name = match cx.heap().get(owner)? {
        Object::Instance(instance) => String::from(instance.type_name()),
        _ => return None,
    };
    cx.registry().get_meta(&type_name)?.field(name)
}

// -----------------------------------------------------------------------------
// Children

async fn flatten_fields(cx: &Context<'_>, owner: ObjectRef, fields: &Fields) -> Result<NodeMap, Error> {
    let mut data = NodeMap::default();
    for (key, value) in fields {
        let node = flatten(cx, value, Cursor::field(owner, key.as_str())).await?;
        data.insert(key.clone(), node);
    }
    Ok(data)
}

async fn flatten_items(cx: &Context<'_>, owner: ObjectRef, items: &[Value]) -> Result<Vec<Node>, Error> {
    let mut nodes = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        nodes.push(flatten(cx, item, Cursor::index(owner, index)).await?);
    }
    Ok(nodes)
}

/// Evaluates each declared parameter source at `cursor` and flattens the
/// result.
async fn flatten_params(cx: &Context<'_>, params: &[ParamMeta], cursor: &Cursor) -> Result<Vec<Node>, Error> {
    let mut nodes = Vec::with_capacity(params.len());
    for param in params {
        let value = {
            let heap = cx.heap();
            param.resolve(&ProviderCx::new(&heap, cursor))?
        };
        nodes.push(flatten(cx, &value, cursor.clone()).await?);
    }
    Ok(nodes)
}
