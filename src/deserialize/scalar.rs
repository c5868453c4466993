// Copyright 2025 Cowboy AI, LLC.

//! Scalar conversion

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use super::Deserializer;
use crate::document::{Node, Scalar};
use crate::errors::{SerializationError, SerializationResult};
use crate::events::EventLevel;
use crate::registry::{SemanticType, TypeRegistry};
use crate::value::Value;

pub(super) fn deserialize_scalar(
    de: &Deserializer<'_>,
    node: &Node,
    target: &SemanticType,
    previous: Option<Value>,
) -> Value {
    match convert(de.registry(), node, target) {
        Ok(value) => value,
        Err(error) => {
            de.report(EventLevel::Error, &error);
            de.previous_or_default(previous, target)
        }
    }
}

/// Convert a scalar node to a value of `target`
///
/// Integers widen to floats; floats narrow to integers only when integral.
/// Enums accept a case-insensitive variant name or an ordinal, GUIDs their
/// text or 16 raw bytes, and timestamps RFC 3339 text or Unix milliseconds.
pub(crate) fn convert(registry: &TypeRegistry, node: &Node, target: &SemanticType) -> SerializationResult<Value> {
    let mismatch = || SerializationError::shape(target.to_string(), node.to_string());
    let Node::Scalar(scalar) = node else {
        return Err(mismatch());
    };

    match (target, scalar) {
        (SemanticType::Bool, Scalar::Bool(b)) => Ok(Value::Bool(*b)),
        (SemanticType::Int, Scalar::Int(i)) => Ok(Value::Int(*i)),
        (SemanticType::Int, Scalar::Float(f)) => integral(*f).map(Value::Int).ok_or_else(mismatch),
        (SemanticType::Float, Scalar::Float(f)) => Ok(Value::Float(*f)),
        (SemanticType::Float, Scalar::Int(i)) => Ok(Value::Float(*i as f64)),
        (SemanticType::String, Scalar::String(s)) => Ok(Value::String(s.clone())),
        (SemanticType::Binary, Scalar::Binary(b)) => Ok(Value::Binary(b.clone())),
        (SemanticType::Guid, Scalar::String(s)) => Uuid::parse_str(s)
            .map(Value::Guid)
            .map_err(|e| SerializationError::conversion(format!("{s} is not a GUID: {e}"))),
        (SemanticType::Guid, Scalar::Binary(b)) => Uuid::from_slice(b)
            .map(Value::Guid)
            .map_err(|e| SerializationError::conversion(format!("Invalid GUID bytes: {e}"))),
        (SemanticType::DateTime, Scalar::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|d| Value::DateTime(d.with_timezone(&Utc)))
            .map_err(|e| SerializationError::conversion(format!("{s} is not an RFC 3339 date: {e}"))),
        (SemanticType::DateTime, Scalar::Int(millis)) => Utc
            .timestamp_millis_opt(*millis)
            .single()
            .map(Value::DateTime)
            .ok_or_else(mismatch),
        (SemanticType::Enum(name), Scalar::String(_) | Scalar::Int(_)) => {
            let descriptor = registry
                .enum_descriptor(name)
                .ok_or_else(|| SerializationError::conversion(format!("Enum {name} is not registered")))?;
            let variant = match scalar {
                Scalar::String(s) => descriptor.variant_named(s),
                Scalar::Int(i) => descriptor.variant_at(*i),
                _ => None,
            };
            variant
                .map(|variant| Value::Enum {
                    type_name: name.clone(),
                    variant: variant.to_string(),
                })
                .ok_or_else(mismatch)
        }
        _ => Err(mismatch()),
    }
}

fn integral(f: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (f.is_finite() && f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f)).then_some(f as i64)
}
