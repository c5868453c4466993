// Copyright 2025 Cowboy AI, LLC.

//! String-keyed dictionaries
//!
//! Three stored shapes are accepted: a plain document, a `_v` wrapper around
//! either shape, and an array of `[key, value]` pairs. Entries are merged
//! into the previous map when there is one.

use super::Deserializer;
use crate::document::{Node, Scalar, TYPE_FIELD, VALUE_FIELD, VERSION_FIELD};
use crate::errors::SerializationError;
use crate::events::EventLevel;
use crate::registry::SemanticType;
use crate::value::{CustomData, Value};

pub(super) fn deserialize_map(
    de: &Deserializer<'_>,
    node: &Node,
    element: &SemanticType,
    previous: Option<Value>,
    version: Option<&str>,
    upgraded: bool,
) -> Value {
    let existing = match previous {
        Some(Value::Map(map)) => Some(map),
        _ => None,
    };

    match node {
        Node::Document(doc) if doc.contains_key(VALUE_FIELD) => {
            let inner = &doc[VALUE_FIELD];
            deserialize_map(de, inner, element, existing.map(Value::Map), version, upgraded)
        }
        Node::Document(doc) => {
            let mut map = existing.unwrap_or_default();
            for (key, item) in doc {
                if key == TYPE_FIELD || key == VERSION_FIELD {
                    continue;
                }
                let value = de.deserialize(item, element, map.get(key).cloned(), version, upgraded);
                map.insert(key.clone(), value);
            }
            Value::Map(map)
        }
        Node::Array(pairs) => {
            let mut map = existing.unwrap_or_default();
            for pair in pairs {
                match key_value(pair) {
                    Some((key, item)) => {
                        let value = de.deserialize(item, element, map.get(&key).cloned(), version, upgraded);
                        map.insert(key, value);
                    }
                    None => de.report(
                        EventLevel::Error,
                        &SerializationError::shape("[key, value] pair", pair.to_string()),
                    ),
                }
            }
            Value::Map(map)
        }
        other => {
            let expected = SemanticType::map(element.clone()).to_string();
            de.report(EventLevel::Error, &SerializationError::shape(expected, other.to_string()));
            existing.map_or(Value::Null, Value::Map)
        }
    }
}

fn key_value(pair: &Node) -> Option<(String, &Node)> {
    let [key, value] = pair.as_array()? else {
        return None;
    };
    let key = match key {
        Node::Scalar(Scalar::String(s)) => s.clone(),
        Node::Scalar(Scalar::Int(i)) => i.to_string(),
        _ => return None,
    };
    Some((key, value))
}

/// Merge a stored `CustomData` field into an existing bag
pub(super) fn merge_custom_data(
    de: &Deserializer<'_>,
    node: &Node,
    bag: &mut CustomData,
    version: Option<&str>,
    upgraded: bool,
) {
    let current = std::mem::take(bag);
    let merged = deserialize_map(de, node, &SemanticType::Any, Some(Value::Map(current.clone())), version, upgraded);
    *bag = match merged {
        Value::Map(map) => map,
        _ => current,
    };
}

#[cfg(test)]
mod tests {
    use crate::context::SerializationContext;
    use crate::document::Node;
    use crate::events::EventLog;
    use crate::registry::{SemanticType, TypeRegistry};
    use crate::value::{CustomData, Value};
    use std::sync::Arc;

    fn context(log: Arc<EventLog>) -> SerializationContext {
        SerializationContext::builder()
            .registry(Arc::new(TypeRegistry::new()))
            .sink(log)
            .build()
            .unwrap()
    }

    fn read(ctx: &SerializationContext, json: &str, previous: Option<Value>) -> Value {
        let node = Node::from_json_str(json).unwrap();
        ctx.deserializer()
            .deserialize(&node, &SemanticType::map(SemanticType::Float), previous, None, false)
    }

    fn map(entries: &[(&str, f64)]) -> Value {
        Value::Map(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), Value::Float(*v)))
                .collect::<CustomData>(),
        )
    }

    #[test]
    fn test_accepted_shapes() {
        let ctx = context(Arc::new(EventLog::new()));
        let expected = map(&[("a", 1.0), ("b", 2.5)]);

        assert_eq!(read(&ctx, r#"{"a": 1, "b": 2.5}"#, None), expected);
        assert_eq!(read(&ctx, r#"{"_t": "Dictionary", "_v": {"a": 1, "b": 2.5}}"#, None), expected);
        assert_eq!(read(&ctx, r#"[["a", 1], ["b", 2.5]]"#, None), expected);
    }

    #[test]
    fn test_merges_into_previous() {
        let ctx = context(Arc::new(EventLog::new()));
        let value = read(&ctx, r#"{"b": 3}"#, Some(map(&[("a", 1.0), ("b", 2.0)])));
        assert_eq!(value, map(&[("a", 1.0), ("b", 3.0)]));
    }

    #[test]
    fn test_bad_pairs_are_skipped() {
        let log = Arc::new(EventLog::new());
        let ctx = context(log.clone());
        let value = read(&ctx, r#"[["a", 1], ["b"], [true, 2]]"#, None);
        assert_eq!(value, map(&[("a", 1.0)]));
        assert_eq!(log.errors().len(), 2);
    }

    #[test]
    fn test_scalar_keeps_previous() {
        let log = Arc::new(EventLog::new());
        let ctx = context(log.clone());
        let previous = map(&[("a", 1.0)]);
        assert_eq!(read(&ctx, "5", Some(previous.clone())), previous);
        assert_eq!(read(&ctx, "5", None), Value::Null);
        assert_eq!(log.errors().len(), 2);
    }
}
