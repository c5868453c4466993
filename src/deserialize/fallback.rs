// Copyright 2025 Cowboy AI, LLC.

//! Generic fallback representation

use super::{map, Deserializer};
use crate::document::{is_reserved, Document, CUSTOM_DATA_FIELD};
use crate::object::CustomObject;
use crate::registry::SemanticType;
use crate::value::Value;

/// Rebuild `doc` as a [`CustomObject`] holding every non-reserved field untyped
///
/// A stored `CustomData` field is merged into the bag rather than nested.
pub(super) fn generic_object(
    de: &Deserializer<'_>,
    doc: &Document,
    discriminator: Option<&str>,
    version: Option<&str>,
) -> Value {
    let mut object = CustomObject::new(discriminator.map(str::to_string));

    for (name, node) in doc {
        if is_reserved(name) {
            continue;
        }
        if name == CUSTOM_DATA_FIELD {
            map::merge_custom_data(de, node, &mut object.custom_data, version, false);
            continue;
        }
        let value = de.deserialize(node, &SemanticType::Any, None, version, false);
        object.custom_data.insert(name.clone(), value);
    }

    Value::Object(Box::new(object))
}
