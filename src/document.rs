// Copyright 2025 Cowboy AI, LLC.

//! Self-describing document nodes
//!
//! A [`Node`] is what a format reader produces: it carries no type
//! information beyond its own shape, except for the reserved fields listed
//! here. Nodes are transient; the deserializer consumes them once.

use bytes::Bytes;
use indexmap::IndexMap;
use serde_json::{Map, Number, Value as JsonValue};
use std::fmt;

use crate::errors::SerializationResult;

/// Field holding the type discriminator of a polymorphic document
pub const TYPE_FIELD: &str = "_t";

/// Field holding the schema version tag of a document
pub const VERSION_FIELD: &str = "_version";

/// Wrapper field for collection payloads
pub const VALUE_FIELD: &str = "_v";

/// Legacy wrapper field for collection payloads
pub const ITEMS_FIELD: &str = "_Items";

/// Fields starting with this marker are never mapped to properties
pub const RESERVED_PREFIX: char = '_';

/// Field name used for the custom data bag of domain objects
pub const CUSTOM_DATA_FIELD: &str = "CustomData";

/// Key used to encode binary scalars in JSON text
const BINARY_KEY: &str = "$binary";

/// Ordered map of field name to node
pub type Document = IndexMap<String, Node>;

/// Check whether a field name is reserved
pub fn is_reserved(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}

/// Scalar payloads
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// UTF-8 text
    String(String),
    /// Signed integer
    Int(i64),
    /// Double precision number
    Float(f64),
    /// Boolean
    Bool(bool),
    /// Raw bytes
    Binary(Bytes),
}

impl Scalar {
    fn kind(&self) -> &'static str {
        match self {
            Scalar::String(_) => "string",
            Scalar::Int(_) => "integer",
            Scalar::Float(_) => "float",
            Scalar::Bool(_) => "boolean",
            Scalar::Binary(_) => "binary",
        }
    }
}

/// A value read from the storage format
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Node {
    /// Explicit null
    #[default]
    Null,
    /// Ordered sequence
    Array(Vec<Node>),
    /// Field map
    Document(Document),
    /// Leaf value
    Scalar(Scalar),
}

impl Node {
    /// Create a string scalar
    pub fn string(value: impl Into<String>) -> Self {
        Node::Scalar(Scalar::String(value.into()))
    }

    /// Create an integer scalar
    pub fn int(value: i64) -> Self {
        Node::Scalar(Scalar::Int(value))
    }

    /// Create a float scalar
    pub fn float(value: f64) -> Self {
        Node::Scalar(Scalar::Float(value))
    }

    /// Create a boolean scalar
    pub fn bool(value: bool) -> Self {
        Node::Scalar(Scalar::Bool(value))
    }

    /// Check for the null variant
    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    /// Borrow as a document
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Node::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Borrow as an array
    pub fn as_array(&self) -> Option<&[Node]> {
        match self {
            Node::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow as a string scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Type discriminator, if this is a document carrying one
    pub fn discriminator(&self) -> Option<&str> {
        self.as_document().and_then(discriminator)
    }

    /// Human readable name of the node variant
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Array(_) => "array",
            Node::Document(_) => "document",
            Node::Scalar(scalar) => scalar.kind(),
        }
    }

    /// Unwrap `{"_v": [...]}` and `{"_Items": [...]}` collection wrappers
    ///
    /// Any other node is returned unchanged.
    pub fn unwrap_collection(&self) -> &Node {
        if let Node::Document(doc) = self {
            if let Some(inner) = doc.get(VALUE_FIELD).or_else(|| doc.get(ITEMS_FIELD)) {
                return inner;
            }
        }
        self
    }

    /// Parse JSON text into a node
    pub fn from_json_str(text: &str) -> SerializationResult<Self> {
        let json: JsonValue = serde_json::from_str(text)?;
        Ok(Node::from(json))
    }

    /// Render the node as compact JSON text
    pub fn to_json_string(&self) -> SerializationResult<String> {
        Ok(serde_json::to_string(&JsonValue::from(self))?)
    }

    /// Render the node as indented JSON text
    pub fn to_json_string_pretty(&self) -> SerializationResult<String> {
        Ok(serde_json::to_string_pretty(&JsonValue::from(self))?)
    }
}

/// Type discriminator of a document
pub fn discriminator(doc: &Document) -> Option<&str> {
    doc.get(TYPE_FIELD).and_then(Node::as_str)
}

/// Version tag of a document
pub fn version_tag(doc: &Document) -> Option<&str> {
    doc.get(VERSION_FIELD)
        .and_then(Node::as_str)
        .filter(|v| !v.is_empty())
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&JsonValue::from(self)) {
            Ok(text) => f.write_str(&text),
            Err(_) => f.write_str(self.kind()),
        }
    }
}

impl From<JsonValue> for Node {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Node::Null,
            JsonValue::Bool(b) => Node::bool(b),
            JsonValue::Number(n) => number_to_node(&n),
            JsonValue::String(s) => Node::string(s),
            JsonValue::Array(items) => Node::Array(items.into_iter().map(Node::from).collect()),
            JsonValue::Object(map) => {
                if let Some(bytes) = binary_from_json(&map) {
                    return Node::Scalar(Scalar::Binary(bytes));
                }
                Node::Document(map.into_iter().map(|(k, v)| (k, Node::from(v))).collect())
            }
        }
    }
}

impl From<&Node> for JsonValue {
    fn from(node: &Node) -> Self {
        match node {
            Node::Null => JsonValue::Null,
            Node::Array(items) => JsonValue::Array(items.iter().map(JsonValue::from).collect()),
            Node::Document(doc) => JsonValue::Object(
                doc.iter()
                    .map(|(k, v)| (k.clone(), JsonValue::from(v)))
                    .collect::<Map<String, JsonValue>>(),
            ),
            Node::Scalar(Scalar::String(s)) => JsonValue::String(s.clone()),
            Node::Scalar(Scalar::Int(i)) => JsonValue::Number((*i).into()),
            // Non-finite floats have no JSON form
            Node::Scalar(Scalar::Float(x)) => Number::from_f64(*x)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Node::Scalar(Scalar::Bool(b)) => JsonValue::Bool(*b),
            Node::Scalar(Scalar::Binary(bytes)) => {
                let mut map = Map::new();
                map.insert(
                    BINARY_KEY.to_string(),
                    JsonValue::Array(bytes.iter().map(|b| JsonValue::from(*b)).collect()),
                );
                JsonValue::Object(map)
            }
        }
    }
}

fn number_to_node(n: &Number) -> Node {
    if let Some(i) = n.as_i64() {
        Node::int(i)
    } else if let Some(u) = n.as_u64() {
        // Beyond i64 range, keep the magnitude as a float
        Node::float(u as f64)
    } else {
        Node::float(n.as_f64().unwrap_or(f64::NAN))
    }
}

fn binary_from_json(map: &Map<String, JsonValue>) -> Option<Bytes> {
    if map.len() != 1 {
        return None;
    }
    let items = map.get(BINARY_KEY)?.as_array()?;
    items
        .iter()
        .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
        .collect::<Option<Vec<u8>>>()
        .map(Bytes::from)
}
