//! Transport representation of a graph.
//!
//! A node is one of: a primitive, a reference to a node emitted elsewhere
//! (`{ "id" }`), an object node (`{ "id", "typename", "data"?, "array"?,
//! "param"? }`) or a callable node (`typename` = `"Function"`, plus
//! `paramDefine` and `body`).
//!
//! [`Node`] implements `Serialize` and `Deserialize` with exactly these field
//! names, so any self-describing serde format can carry a tree.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use og_graph::Value;
use og_utils::IndexMap;
use serde_core::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde_core::ser::{SerializeMap, Serializer};
use serde_core::{Deserialize, Serialize};

/// `typename` of plain objects.
pub const OBJECT: &str = "Object";
/// `typename` of plain arrays.
pub const ARRAY: &str = "Array";
/// `typename` of callables.
pub const FUNCTION: &str = "Function";

/// Named children of an object node, in order.
pub type NodeMap = IndexMap<String, Node>;

// -----------------------------------------------------------------------------
// Node types

/// A leaf value, stored inline.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Primitive {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

/// Points at a node with the same `id` emitted earlier in the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefNode {
    pub id: String,
}

/// A plain object, a plain array, or an instance of a registered type.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectNode {
    pub id: String,
    pub typename: String,
    pub data: Option<NodeMap>,
    pub array: Option<Vec<Node>>,
    /// Constructor arguments.
    pub param: Option<Vec<Node>>,
}

/// A callable carried as source text.
#[derive(Debug, Clone, PartialEq)]
pub struct CallableNode {
    pub id: String,
    pub param_define: Vec<String>,
    pub body: String,
    /// Invocation arguments, used when the owning field runs on load.
    pub param: Option<Vec<Node>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Primitive(Primitive),
    Ref(RefNode),
    Object(ObjectNode),
    Callable(CallableNode),
}

impl Node {
    pub const NULL: Node = Node::Primitive(Primitive::Null);

    #[inline]
    pub fn reference(id: impl Into<String>) -> Self {
        Node::Ref(RefNode { id: id.into() })
    }

    /// The node id, `None` for primitives.
    pub fn id(&self) -> Option<&str> {
        match self {
            Node::Primitive(_) => None,
            Node::Ref(node) => Some(&node.id),
            Node::Object(node) => Some(&node.id),
            Node::Callable(node) => Some(&node.id),
        }
    }

    #[inline]
    pub fn is_primitive(&self) -> bool {
        matches!(self, Node::Primitive(_))
    }
}

impl ObjectNode {
    /// A node with neither `data` nor `array`.
    pub fn new(id: impl Into<String>, typename: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            typename: typename.into(),
            data: None,
            array: None,
            param: None,
        }
    }

    /// A plain object node with empty `data`.
    pub fn plain(id: impl Into<String>) -> Self {
        Self {
            data: Some(NodeMap::default()),
            ..Self::new(id, OBJECT)
        }
    }

    /// A plain array node.
    pub fn array(id: impl Into<String>, items: Vec<Node>) -> Self {
        Self::new(id, ARRAY).with_array(items)
    }

    pub fn with_data(mut self, key: impl Into<String>, node: Node) -> Self {
        self.data.get_or_insert_default().insert(key.into(), node);
        self
    }

    #[inline]
    pub fn with_array(mut self, items: Vec<Node>) -> Self {
        self.array = Some(items);
        self
    }

    #[inline]
    pub fn with_param(mut self, param: Vec<Node>) -> Self {
        self.param = Some(param);
        self
    }

    #[inline]
    pub fn is_plain_object(&self) -> bool {
        self.typename == OBJECT
    }

    #[inline]
    pub fn is_plain_array(&self) -> bool {
        self.typename == ARRAY
    }

    /// Looks up a named child.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.data.as_ref()?.get(key)
    }
}

impl CallableNode {
    pub fn new<I, S>(id: impl Into<String>, param_define: I, body: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            param_define: param_define.into_iter().map(Into::into).collect(),
            body: body.into(),
            param: None,
        }
    }

    #[inline]
    pub fn with_param(mut self, param: Vec<Node>) -> Self {
        self.param = Some(param);
        self
    }
}

// -----------------------------------------------------------------------------
// Conversions

impl Primitive {
    /// The primitive carried by `value`, `None` for objects.
    pub fn from_value(value: &Value) -> Option<Self> {
        Some(match value {
            Value::Null => Primitive::Null,
            Value::Bool(value) => Primitive::Bool(*value),
            Value::Number(value) => Primitive::Number(*value),
            Value::String(value) => Primitive::String(value.clone()),
            Value::Object(_) => return None,
        })
    }
}

impl From<Primitive> for Value {
    fn from(primitive: Primitive) -> Self {
        match primitive {
            Primitive::Null => Value::Null,
            Primitive::Bool(value) => Value::Bool(value),
            Primitive::Number(value) => Value::Number(value),
            Primitive::String(value) => Value::String(value),
        }
    }
}

macro_rules! impl_node_from {
    ($($ty:ty => |$v:ident| $body:expr;)*) => {
        $(
            impl From<$ty> for Node {
                #[inline]
                fn from($v: $ty) -> Self {
                    $body
                }
            }
        )*
    };
}

impl_node_from! {
    Primitive => |v| Node::Primitive(v);
    RefNode => |v| Node::Ref(v);
    ObjectNode => |v| Node::Object(v);
    CallableNode => |v| Node::Callable(v);
    bool => |v| Node::Primitive(Primitive::Bool(v));
    f64 => |v| Node::Primitive(Primitive::Number(v));
    i32 => |v| Node::Primitive(Primitive::Number(f64::from(v)));
    &str => |v| Node::Primitive(Primitive::String(String::from(v)));
    String => |v| Node::Primitive(Primitive::String(v));
}

// -----------------------------------------------------------------------------
// Serialize

/// Largest integer an `f64` holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

impl Serialize for Primitive {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Primitive::Null => serializer.serialize_unit(),
            Primitive::Bool(value) => serializer.serialize_bool(*value),
            Primitive::Number(value) => {
                let negative_zero = *value == 0.0 && value.is_sign_negative();
                if libm::trunc(*value) == *value && libm::fabs(*value) <= MAX_SAFE_INTEGER && !negative_zero {
                    serializer.serialize_i64(*value as i64)
                } else {
                    serializer.serialize_f64(*value)
                }
            }
            Primitive::String(value) => serializer.serialize_str(value),
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Primitive(primitive) => primitive.serialize(serializer),
            Node::Ref(node) => {
                let mut state = serializer.serialize_map(Some(1))?;
                state.serialize_entry("id", &node.id)?;
                state.end()
            }
            Node::Object(node) => {
                let len = 2
                    + usize::from(node.data.is_some())
                    + usize::from(node.array.is_some())
                    + usize::from(node.param.is_some());
                let mut state = serializer.serialize_map(Some(len))?;
                state.serialize_entry("id", &node.id)?;
                state.serialize_entry("typename", &node.typename)?;
                if let Some(data) = &node.data {
                    state.serialize_entry("data", &Entries(data))?;
                }
                if let Some(array) = &node.array {
                    state.serialize_entry("array", array)?;
                }
                if let Some(param) = &node.param {
                    state.serialize_entry("param", param)?;
                }
                state.end()
            }
            Node::Callable(node) => {
                let len = 4 + usize::from(node.param.is_some());
                let mut state = serializer.serialize_map(Some(len))?;
                state.serialize_entry("id", &node.id)?;
                state.serialize_entry("typename", FUNCTION)?;
                state.serialize_entry("paramDefine", &node.param_define)?;
                state.serialize_entry("body", &node.body)?;
                if let Some(param) = &node.param {
                    state.serialize_entry("param", param)?;
                }
                state.end()
            }
        }
    }
}

struct Entries<'a>(&'a NodeMap);

impl Serialize for Entries<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter())
    }
}

// -----------------------------------------------------------------------------
// Deserialize

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NodeVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a primitive or a node object with an `id`")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::NULL)
    }

    fn visit_none<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::NULL)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Node, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Node, E> {
        Ok(Node::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Node, E> {
        Ok(Node::from(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Node, E> {
        Ok(Node::from(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Node, E> {
        Ok(Node::from(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Node, E> {
        Ok(Node::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Node, E> {
        Ok(Node::from(v))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Node, A::Error> {
        let mut id: Option<String> = None;
        let mut typename: Option<String> = None;
        let mut data: Option<Data> = None;
        let mut array: Option<Vec<Node>> = None;
        let mut param: Option<Vec<Node>> = None;
        let mut param_define: Option<Vec<String>> = None;
        let mut body: Option<String> = None;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "id" => id = Some(map.next_value()?),
                "typename" => typename = Some(map.next_value()?),
                "data" => data = Some(map.next_value()?),
                "array" => array = map.next_value()?,
                "param" => param = map.next_value()?,
                "paramDefine" => param_define = map.next_value()?,
                "body" => body = Some(map.next_value()?),
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        let id = id.ok_or_else(|| <A::Error as de::Error>::missing_field("id"))?;
        let Some(typename) = typename else {
            return Ok(Node::Ref(RefNode { id }));
        };

        // A callable's `data` holds a memoized result and is not read back.
        if typename == FUNCTION {
            return Ok(Node::Callable(CallableNode {
                id,
                param_define: param_define.unwrap_or_default(),
                body: body.ok_or_else(|| <A::Error as de::Error>::missing_field("body"))?,
                param,
            }));
        }

        let data = match data {
            None | Some(Data::Absent) => None,
            Some(Data::Map(map)) => Some(map),
            Some(Data::Scalar) => {
                return Err(de::Error::invalid_type(
                    de::Unexpected::Other("scalar `data`"),
                    &"a map of named children",
                ));
            }
        };

        Ok(Node::Object(ObjectNode {
            id,
            typename,
            data,
            array,
            param,
        }))
    }
}

/// Raw `data` entry, checked once the `typename` is known.
enum Data {
    Map(NodeMap),
    Absent,
    Scalar,
}

impl<'de> Deserialize<'de> for Data {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DataVisitor)
    }
}

struct DataVisitor;

impl<'de> Visitor<'de> for DataVisitor {
    type Value = Data;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of named children")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Data, E> {
        Ok(Data::Absent)
    }

    fn visit_none<E: de::Error>(self) -> Result<Data, E> {
        Ok(Data::Absent)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Data, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Data, E> {
        Ok(Data::Scalar)
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<Data, E> {
        Ok(Data::Scalar)
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<Data, E> {
        Ok(Data::Scalar)
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<Data, E> {
        Ok(Data::Scalar)
    }

    fn visit_str<E: de::Error>(self, _: &str) -> Result<Data, E> {
        Ok(Data::Scalar)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Data, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Data::Scalar)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Data, A::Error> {
        let mut entries = NodeMap::with_capacity_and_hasher(
            map.size_hint().unwrap_or_default(),
            Default::default(),
        );
        while let Some((key, node)) = map.next_entry::<String, Node>()? {
            entries.insert(key, node);
        }
        Ok(Data::Map(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::{CallableNode, Node, ObjectNode, Primitive};
    use alloc::string::ToString;
    use alloc::vec;

    #[test]
    fn parse_instance_with_callable() {
        let json = r#"{
            "id": "test",
            "typename": "ClassUnderTest",
            "data": {
                "id": "test",
                "number1": 2,
                "mul": {
                    "id": "testFun",
                    "typename": "Function",
                    "paramDefine": ["a", "b"],
                    "body": " return a * b; ",
                    "param": [3, 2],
                    "data": 6
                },
                "fun": { "id": "testFun" }
            }
        }"#;
        let node: Node = serde_json::from_str(json).unwrap();

        let Node::Object(object) = &node else {
            panic!("expected an object node, got {node:?}");
        };
        assert_eq!(object.typename, "ClassUnderTest");
        assert_eq!(object.get("number1"), Some(&Node::from(2.0)));
        assert_eq!(object.get("fun"), Some(&Node::reference("testFun")));
        assert_eq!(
            object.get("mul"),
            Some(&Node::from(
                CallableNode::new("testFun", ["a", "b"], " return a * b; ")
                    .with_param(vec![Node::from(3.0), Node::from(2.0)])
            ))
        );
        let keys: vec::Vec<&str> = object.data.as_ref().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["id", "number1", "mul", "fun"]);
    }

    #[test]
    fn write_whole_numbers_as_integers() {
        let node = Node::from(
            ObjectNode::array("#0", vec![Node::from(1.0), Node::from(2.5), Node::NULL])
                .with_data("label", Node::from("xs")),
        );
        assert_eq!(
            serde_json::to_string(&node).unwrap(),
            r##"{"id":"#0","typename":"Array","data":{"label":"xs"},"array":[1,2.5,null]}"##
        );
    }

    #[test]
    fn negative_zero_keeps_its_sign() {
        let text = serde_json::to_string(&Node::from(-0.0)).unwrap();
        assert_ne!(text, "0");
        let Node::Primitive(Primitive::Number(back)) = serde_json::from_str::<Node>(&text).unwrap() else {
            panic!("expected a number, got {text}");
        };
        assert!(back == 0.0 && back.is_sign_negative());

        assert_eq!(serde_json::to_string(&Node::from(0.0)).unwrap(), "0");
    }

    #[test]
    fn write_callable() {
        let node = Node::from(CallableNode::new("f", ["a"], "return a;"));
        assert_eq!(
            serde_json::to_string(&node).unwrap(),
            r#"{"id":"f","typename":"Function","paramDefine":["a"],"body":"return a;"}"#
        );
    }

    #[test]
    fn json_round_trip() {
        let node = Node::from(
            ObjectNode::new("p", "Parent")
                .with_param(vec![Node::from(true)])
                .with_data("child", Node::reference("c"))
                .with_data("name", Node::from("x")),
        );
        let text = serde_json::to_string(&node).unwrap();
        assert_eq!(serde_json::from_str::<Node>(&text).unwrap(), node);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let node: Node = serde_json::from_str(r#"{ "id": "r", "extra": [1, {"a": 2}] }"#).unwrap();
        assert_eq!(node, Node::reference("r"));
    }

    #[test]
    fn missing_id_is_rejected() {
        let err = serde_json::from_str::<Node>(r#"{ "typename": "Object", "data": {} }"#).unwrap_err();
        assert!(err.to_string().contains("missing field `id`"));
    }

    #[test]
    fn scalar_data_on_object_is_rejected() {
        assert!(serde_json::from_str::<Node>(r#"{ "id": "o", "typename": "Object", "data": 1 }"#).is_err());
    }

    #[test]
    fn primitives() {
        assert_eq!(serde_json::from_str::<Node>("null").unwrap(), Node::NULL);
        assert_eq!(
            serde_json::from_str::<Node>(r#""hi""#).unwrap(),
            Node::Primitive(Primitive::String("hi".to_string()))
        );
        assert!(serde_json::from_str::<Node>("[1]").is_err());
    }
}
