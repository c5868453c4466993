// Copyright 2025 Cowboy AI, LLC.

//! Construction of immutable types
//!
//! Constructor parameters are read from the stored fields whose names match
//! case-insensitively. Fields left over after construction are reconciled
//! like any other object, with read-only properties tolerated.

use std::collections::HashSet;

use super::object_graph::ObjectBuilder;
use super::Deserializer;
use crate::document::{is_reserved, Document};
use crate::errors::SerializationError;
use crate::registry::TypeDescriptor;
use crate::value::Value;

pub(super) fn construct_object(
    de: &Deserializer<'_>,
    doc: &Document,
    descriptor: &TypeDescriptor,
    version: Option<&str>,
    upgraded: bool,
) -> Value {
    let mut consumed = HashSet::new();
    let mut args = Vec::with_capacity(descriptor.parameters().len());
    let mut mismatch = None;

    for parameter in descriptor.parameters() {
        let field = doc
            .iter()
            .find(|(name, _)| !is_reserved(name) && name.eq_ignore_ascii_case(&parameter.name));

        let value = match field {
            Some((name, node)) => {
                consumed.insert(name.clone());
                de.deserialize(node, &parameter.semantic_type, None, version, upgraded)
            }
            None => de.registry().default_value(&parameter.semantic_type),
        };

        if mismatch.is_none() && !de.registry().conforms(&value, &parameter.semantic_type) {
            mismatch = Some(SerializationError::TypeMismatch {
                property: parameter.name.clone(),
                type_name: descriptor.name().to_string(),
                expected: parameter.semantic_type.to_string(),
                found: value.type_label(),
            });
        }
        args.push(value);
    }

    let mut builder = ObjectBuilder::new(de, doc, descriptor, version, upgraded);
    if let Some(error) = mismatch {
        return builder.recover(error);
    }

    match descriptor.construct(args) {
        Ok(object) => builder.populate(object, &consumed),
        Err(error) => builder.recover(error),
    }
}

#[cfg(test)]
mod tests {
    use crate::context::SerializationContext;
    use crate::document::Node;
    use crate::events::EventLog;
    use crate::registry::{Parameter, SemanticType, TypeDescriptor, TypeRegistry};
    use crate::value::{CustomData, FromValue, Value};
    use crate::{CustomObject, SerializationError};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct TestPoint {
        x: f64,
        y: f64,
        custom_data: CustomData,
    }
    crate::domain_object!(TestPoint, custom_data = custom_data);

    fn context(log: Arc<EventLog>) -> SerializationContext {
        let registry = TypeRegistry::new();
        registry.register(
            TypeDescriptor::immutable::<TestPoint, _>(
                "Point",
                vec![
                    Parameter::new("x", SemanticType::Float),
                    Parameter::new("y", SemanticType::Float),
                ],
                |args: Vec<Value>| {
                    let mut args = args.into_iter();
                    let mut next = || f64::from_value(args.next().unwrap_or_default());
                    let x = next()?;
                    let y = next()?;
                    if x < 0.0 || y < 0.0 {
                        return Err(SerializationError::conversion("Grid coordinates must not be negative"));
                    }
                    Ok(TestPoint {
                        x,
                        y,
                        custom_data: CustomData::new(),
                    })
                },
            )
            .read_only("X", SemanticType::Float, |p: &TestPoint| Value::Float(p.x))
            .read_only("Y", SemanticType::Float, |p: &TestPoint| Value::Float(p.y)),
        );
        SerializationContext::builder()
            .registry(Arc::new(registry))
            .sink(log)
            .build()
            .unwrap()
    }

    fn read(ctx: &SerializationContext, json: &str) -> Value {
        ctx.deserializer()
            .deserialize_node(&Node::from_json_str(json).unwrap())
    }

    #[test]
    fn test_parameters_matched_case_insensitively() {
        let log = Arc::new(EventLog::new());
        let ctx = context(log.clone());

        let value = read(&ctx, r#"{"_t": "Point", "X": 1.5, "Y": 2}"#);
        let point = value.downcast_ref::<TestPoint>().unwrap();
        assert_eq!((point.x, point.y), (1.5, 2.0));
        assert!(log.all_events().is_empty());
    }

    #[test]
    fn test_missing_parameter_takes_default() {
        let ctx = context(Arc::new(EventLog::new()));
        let value = read(&ctx, r#"{"_t": "Point", "X": 4}"#);
        let point = value.downcast_ref::<TestPoint>().unwrap();
        assert_eq!((point.x, point.y), (4.0, 0.0));
    }

    #[test]
    fn test_remaining_fields_are_reconciled() {
        let log = Arc::new(EventLog::new());
        let ctx = context(log.clone());

        let value = read(&ctx, r#"{"_t": "Point", "X": 1, "Y": 2, "Label": "origin"}"#);
        let point = value.downcast_ref::<TestPoint>().unwrap();
        assert_eq!(point.custom_data["Label"], Value::String("origin".to_string()));
        assert_eq!(log.warnings().len(), 1);
        assert!(log.errors().is_empty());
    }

    #[test]
    fn test_constructor_failure_falls_back() {
        let log = Arc::new(EventLog::new());
        let ctx = context(log.clone());

        let value = read(&ctx, r#"{"_t": "Point", "X": -1, "Y": 2}"#);
        let object = value.downcast_ref::<CustomObject>().unwrap();
        assert_eq!(object.custom_data["X"], Value::Int(-1));
        assert_eq!(log.errors().len(), 1);
    }
}
