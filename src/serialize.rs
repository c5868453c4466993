// Copyright 2025 Cowboy AI, LLC.

//! Writing live values back to documents
//!
//! The serializer is the inverse of the deserializer for every property that
//! can be read back: objects are written with their discriminator, the
//! current schema version, their readable and settable properties and their
//! custom data bag.

use tracing::trace;

use crate::context::SerializationContext;
use crate::document::{is_reserved, Document, Node, Scalar, CUSTOM_DATA_FIELD, TYPE_FIELD, VERSION_FIELD};
use crate::errors::SerializationError;
use crate::events::{Event, EventLevel};
use crate::object::{DomainObject, CUSTOM_OBJECT_TYPE};
use crate::value::{CustomData, Value};

/// One serialisation call over a context
pub struct Serializer<'a> {
    ctx: &'a SerializationContext,
}

impl<'a> Serializer<'a> {
    /// Create a serializer over `ctx`
    pub fn new(ctx: &'a SerializationContext) -> Self {
        Self { ctx }
    }

    /// Write a value as a document node
    pub fn serialize(&self, value: &Value) -> Node {
        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::bool(*b),
            Value::Int(i) => Node::int(*i),
            Value::Float(f) => Node::float(*f),
            Value::String(s) => Node::string(s.clone()),
            Value::Guid(g) => Node::string(g.hyphenated().to_string()),
            Value::DateTime(d) => Node::string(d.to_rfc3339()),
            Value::Enum { variant, .. } => Node::string(variant.clone()),
            Value::Binary(b) => Node::Scalar(Scalar::Binary(b.clone())),
            Value::Array(items) => Node::Array(items.iter().map(|item| self.serialize(item)).collect()),
            Value::Grid(grid) => Node::Array(
                grid.iter_rows()
                    .map(|row| Node::Array(row.iter().map(|cell| self.serialize(cell)).collect()))
                    .collect(),
            ),
            Value::Map(map) => self.serialize_map(map),
            Value::FragmentSet(set) => Node::Array(set.iter().map(|f| self.serialize_object(f)).collect()),
            Value::Object(object) => self.serialize_object(object.as_ref()),
        }
    }

    /// Maps with reserved keys are written as `[key, value]` pairs so they
    /// are not mistaken for wrappers or typed documents on reload
    fn serialize_map(&self, map: &CustomData) -> Node {
        if map.keys().any(|key| is_reserved(key)) {
            return Node::Array(
                map.iter()
                    .map(|(key, value)| Node::Array(vec![Node::string(key.clone()), self.serialize(value)]))
                    .collect(),
            );
        }
        Node::Document(
            map.iter()
                .map(|(key, value)| (key.clone(), self.serialize(value)))
                .collect(),
        )
    }

    /// Write an object as a document
    ///
    /// Objects of unregistered types are written as `CustomObject` documents
    /// and reported as errors.
    pub fn serialize_object(&self, object: &dyn DomainObject) -> Node {
        let mut doc = Document::new();

        let Some(descriptor) = self.ctx.registry().descriptor_of(object) else {
            self.ctx.report(
                EventLevel::Error,
                &SerializationError::TypeNotFound {
                    discriminator: object.type_name().to_string(),
                    outdated: false,
                },
            );
            doc.insert(TYPE_FIELD.to_string(), Node::string(CUSTOM_OBJECT_TYPE));
            doc.insert("Discriminator".to_string(), Node::string(object.type_name()));
            if let Some(bag) = object.custom_data() {
                doc.insert(CUSTOM_DATA_FIELD.to_string(), self.serialize_map(bag));
            }
            return Node::Document(doc);
        };

        trace!("Serialising {}", descriptor.name());
        doc.insert(TYPE_FIELD.to_string(), Node::string(descriptor.name()));
        doc.insert(
            VERSION_FIELD.to_string(),
            Node::string(self.ctx.config().current_version.to_string()),
        );

        for property in descriptor.properties() {
            let written = property.is_readable() && (property.is_settable() || descriptor.is_immutable());
            if !written || property.name() == CUSTOM_DATA_FIELD {
                continue;
            }
            match property.get(object) {
                Ok(value) => {
                    doc.insert(property.name().to_string(), self.serialize(&value));
                }
                Err(error) => {
                    self.ctx.record(Event::from_error(EventLevel::Error, &error));
                }
            }
        }

        if let Some(bag) = object.custom_data() {
            doc.insert(CUSTOM_DATA_FIELD.to_string(), self.serialize_map(bag));
        }

        Node::Document(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;
    use crate::registry::{SemanticType, TypeDescriptor, TypeRegistry};
    use crate::value::Grid;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct TestLevel {
        name: String,
        elevation: f64,
        custom_data: CustomData,
    }
    crate::domain_object!(TestLevel, custom_data = custom_data);

    #[derive(Debug, Clone, PartialEq, Default)]
    struct TestUnregistered;
    crate::domain_object!(TestUnregistered);

    fn context(log: Arc<EventLog>) -> SerializationContext {
        let registry = TypeRegistry::new();
        registry.register(
            TypeDescriptor::mutable::<TestLevel>("Spatial.Level")
                .field("Name", SemanticType::String, |l: &TestLevel| &l.name, |l: &mut TestLevel| &mut l.name)
                .field(
                    "Elevation",
                    SemanticType::Float,
                    |l: &TestLevel| &l.elevation,
                    |l: &mut TestLevel| &mut l.elevation,
                )
                .read_only("Label", SemanticType::String, |l: &TestLevel| {
                    Value::String(format!("{} @ {}", l.name, l.elevation))
                }),
        );
        SerializationContext::builder()
            .registry(Arc::new(registry))
            .sink(log)
            .build()
            .unwrap()
    }

    #[test]
    fn test_object_document_layout() {
        let ctx = context(Arc::new(EventLog::new()));
        let mut level = TestLevel {
            name: "L1".to_string(),
            elevation: 3.5,
            custom_data: CustomData::new(),
        };
        level.custom_data.insert("Zone".to_string(), Value::Int(2));

        let node = ctx.serializer().serialize(&Value::Object(Box::new(level)));
        assert_eq!(
            node.to_json_string().unwrap(),
            r#"{"_t":"Spatial.Level","_version":"7.0.0","Name":"L1","Elevation":3.5,"CustomData":{"Zone":2}}"#
        );
    }

    #[test]
    fn test_reserved_keys_in_custom_data_written_as_pairs() {
        let ctx = context(Arc::new(EventLog::new()));
        let mut level = TestLevel::default();
        level.custom_data.insert("_t".to_string(), Value::String("x".to_string()));
        level.custom_data.insert("k".to_string(), Value::Int(2));

        let node = ctx.serializer().serialize(&Value::Object(Box::new(level)));
        let custom = node.as_document().unwrap().get(CUSTOM_DATA_FIELD).unwrap();
        assert_eq!(custom.to_json_string().unwrap(), r#"[["_t","x"],["k",2]]"#);
    }

    #[test]
    fn test_grid_and_scalars() {
        let ctx = context(Arc::new(EventLog::new()));
        let grid = Grid::new(2, 2, vec![Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)]).unwrap();

        assert_eq!(
            ctx.serializer().serialize(&Value::Grid(grid)).to_json_string().unwrap(),
            "[[1,2],[3,4]]"
        );
        assert_eq!(
            ctx.serializer()
                .serialize(&Value::Enum {
                    type_name: "Axis".to_string(),
                    variant: "Z".to_string()
                })
                .as_str(),
            Some("Z")
        );
    }

    #[test]
    fn test_unregistered_object_is_reported() {
        let log = Arc::new(EventLog::new());
        let ctx = context(log.clone());

        let node = ctx.serializer().serialize(&Value::Object(Box::new(TestUnregistered)));
        assert_eq!(node.discriminator(), Some(CUSTOM_OBJECT_TYPE));
        assert_eq!(log.errors().len(), 1);
    }
}
