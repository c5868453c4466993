// Copyright 2025 Cowboy AI, LLC.

//! Convenience entry points
//!
//! Thin wrappers over [`Deserializer`](crate::Deserializer) and
//! [`Serializer`](crate::Serializer) for the common case of converting a
//! whole JSON text in one call. Only malformed JSON is an error; everything
//! else degrades and is reported to the context's event sink.

use crate::context::SerializationContext;
use crate::document::Node;
use crate::errors::SerializationResult;
use crate::registry::SemanticType;
use crate::value::{FromValue, Value};

/// Deserialise a node without a declared target type
pub fn from_node(ctx: &SerializationContext, node: &Node) -> Value {
    ctx.deserializer().deserialize_node(node)
}

/// Deserialise JSON text without a declared target type
pub fn from_json(ctx: &SerializationContext, text: &str) -> SerializationResult<Value> {
    let node = Node::from_json_str(text)?;
    Ok(from_node(ctx, &node))
}

/// Deserialise JSON text against `target`
pub fn from_json_as(ctx: &SerializationContext, text: &str, target: &SemanticType) -> SerializationResult<Value> {
    let node = Node::from_json_str(text)?;
    Ok(ctx.deserializer().deserialize(&node, target, None, None, false))
}

/// Deserialise JSON text into a concrete Rust type
///
/// # Errors
///
/// Malformed JSON, or a result that is not a `T` (for example the generic
/// fallback of a document that could not be reconstructed)
pub fn deserialize_as<T: FromValue>(ctx: &SerializationContext, text: &str) -> SerializationResult<T> {
    T::from_value(from_json(ctx, text)?)
}

/// Serialise a value to a node
pub fn to_node(ctx: &SerializationContext, value: &Value) -> Node {
    ctx.serializer().serialize(value)
}

/// Serialise a value to compact JSON text
pub fn to_json(ctx: &SerializationContext, value: &Value) -> SerializationResult<String> {
    to_node(ctx, value).to_json_string()
}

/// Serialise a value to indented JSON text
pub fn to_json_pretty(ctx: &SerializationContext, value: &Value) -> SerializationResult<String> {
    to_node(ctx, value).to_json_string_pretty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeRegistry;
    use crate::{CustomObject, SerializationError};
    use std::sync::Arc;

    fn context() -> SerializationContext {
        SerializationContext::new(Arc::new(TypeRegistry::new()))
    }

    #[test]
    fn test_invalid_json_is_the_only_error() {
        let ctx = context();
        assert!(matches!(
            from_json(&ctx, "{not json"),
            Err(SerializationError::InvalidDocument(_))
        ));
        assert!(from_json(&ctx, r#"{"_t": "Nowhere.Type"}"#).is_ok());
    }

    #[test]
    fn test_custom_object_round_trip() {
        let ctx = context();
        let mut object = CustomObject::new(Some("Structure.Beam".to_string()));
        object.custom_data.insert("Name".to_string(), Value::String("b1".to_string()));

        let json = to_json(&ctx, &Value::Object(Box::new(object.clone()))).unwrap();
        let back: CustomObject = deserialize_as(&ctx, &json).unwrap();
        assert_eq!(back, object);
    }

    #[test]
    fn test_typed_target() {
        let ctx = context();
        let value = from_json_as(&ctx, "[1, 2]", &SemanticType::array(SemanticType::Float)).unwrap();
        assert_eq!(value, Value::Array(vec![Value::Float(1.0), Value::Float(2.0)]));
        assert!(deserialize_as::<i64>(&ctx, "\"text\"").is_err());
    }
}
