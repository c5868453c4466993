// Copyright 2025 Cowboy AI, LLC.

//! Fragment sets

use tracing::debug;

use super::Deserializer;
use crate::document::{Node, ITEMS_FIELD, VALUE_FIELD};
use crate::errors::SerializationError;
use crate::events::{Event, EventLevel};
use crate::fragment::FragmentSet;
use crate::registry::SemanticType;
use crate::value::Value;

pub(super) fn deserialize_fragment_set(
    de: &Deserializer<'_>,
    node: &Node,
    existing: Option<Value>,
    version: Option<&str>,
    upgraded: bool,
) -> Value {
    let mut set = match existing {
        Some(Value::FragmentSet(set)) => set,
        _ => FragmentSet::new(),
    };

    let items = match node {
        Node::Null => return Value::Null,
        Node::Array(items) => items,
        Node::Document(doc) => match doc.get(VALUE_FIELD).or_else(|| doc.get(ITEMS_FIELD)) {
            Some(Node::Array(items)) => items,
            _ => {
                de.report(
                    EventLevel::Error,
                    &SerializationError::shape("FragmentSet", node.to_string()),
                );
                return Value::FragmentSet(set);
            }
        },
        Node::Scalar(_) => {
            de.report(
                EventLevel::Error,
                &SerializationError::shape("FragmentSet", node.to_string()),
            );
            return Value::FragmentSet(set);
        }
    };

    for item in items {
        match de.deserialize(item, &SemanticType::Any, None, version, upgraded) {
            Value::Object(object) if object.is_fragment() => {
                debug!("Adding fragment {}", object.type_name());
                if let Err(e) = set.add(object) {
                    de.report(EventLevel::Error, &e);
                }
            }
            other => de.context().record(Event::warning(format!(
                "Skipping element of type {} while reading a FragmentSet: it is not a fragment",
                other.type_label()
            ))),
        }
    }

    Value::FragmentSet(set)
}
