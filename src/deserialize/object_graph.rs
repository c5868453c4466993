// Copyright 2025 Cowboy AI, LLC.

//! Property-by-property reconstruction of objects
//!
//! Stored fields are reconciled against the declared properties of the
//! resolved type. A field that cannot be reconciled first sends the whole
//! document through the upgrade engine, at most once per object. When the
//! upgrade does not help, unknown fields go to the custom data bag and any
//! other failure replaces the object by a generic [`CustomObject`](crate::CustomObject).

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, trace};

use super::{fallback, map, Deserializer};
use crate::document::{is_reserved, Document, Node, CUSTOM_DATA_FIELD};
use crate::errors::SerializationError;
use crate::events::{Event, EventLevel};
use crate::object::DomainObject;
use crate::registry::{SemanticType, TypeDescriptor};
use crate::value::Value;

/// Progress of one object reconstruction
///
/// ```mermaid
/// stateDiagram-v2
///     [*] --> Initial
///     Initial --> PerFieldProcessing
///     PerFieldProcessing --> UpgradeRequested: first irreconcilable field
///     UpgradeRequested --> Done: upgrade produced a value
///     UpgradeRequested --> PerFieldProcessing: declined, no further upgrades
///     PerFieldProcessing --> GenericFallback
///     PerFieldProcessing --> Done
///     GenericFallback --> Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    /// Nothing processed yet
    Initial,
    /// Walking the stored fields
    PerFieldProcessing,
    /// The upgrade engine has been consulted
    UpgradeRequested,
    /// The object is being replaced by a generic representation
    GenericFallback,
    /// Reconstruction finished
    Done,
}

enum Step {
    Next,
    Finish(Value),
}

pub(super) struct ObjectBuilder<'d, 'a> {
    de: &'d Deserializer<'a>,
    doc: &'d Document,
    descriptor: &'d TypeDescriptor,
    version: Option<&'d str>,
    upgraded: bool,
    upgrade_attempted: bool,
    state: BuildState,
}

pub(super) fn build_object(
    de: &Deserializer<'_>,
    doc: &Document,
    descriptor: &Arc<TypeDescriptor>,
    existing: Option<Value>,
    version: Option<&str>,
    upgraded: bool,
) -> Value {
    let mut builder = ObjectBuilder::new(de, doc, descriptor, version, upgraded);

    let object = match existing {
        Some(Value::Object(object)) if object.concrete_type_id() == descriptor.type_id() => object,
        _ => match descriptor.instantiate() {
            Ok(object) => object,
            Err(error) => return builder.recover(error),
        },
    };

    builder.populate(object, &HashSet::new())
}

impl<'d, 'a> ObjectBuilder<'d, 'a> {
    pub(super) fn new(
        de: &'d Deserializer<'a>,
        doc: &'d Document,
        descriptor: &'d TypeDescriptor,
        version: Option<&'d str>,
        upgraded: bool,
    ) -> Self {
        Self {
            de,
            doc,
            descriptor,
            version,
            upgraded,
            upgrade_attempted: false,
            state: BuildState::Initial,
        }
    }

    #[cfg(test)]
    pub(super) fn state(&self) -> BuildState {
        self.state
    }

    /// Walk every stored field not in `skip`
    pub(super) fn populate(&mut self, mut object: Box<dyn DomainObject>, skip: &HashSet<String>) -> Value {
        self.state = BuildState::PerFieldProcessing;
        trace!("Populating {}", self.descriptor.name());

        for (name, node) in self.doc {
            if is_reserved(name) || skip.contains(name) {
                continue;
            }
            if let Step::Finish(value) = self.process_field(object.as_mut(), name, node) {
                self.state = BuildState::Done;
                return value;
            }
        }

        self.state = BuildState::Done;
        Value::Object(object)
    }

    fn process_field(&mut self, object: &mut dyn DomainObject, name: &str, node: &Node) -> Step {
        let descriptor = self.descriptor;
        if name == CUSTOM_DATA_FIELD {
            if let Some(bag) = object.custom_data_mut() {
                map::merge_custom_data(self.de, node, bag, self.version, self.upgraded);
                return Step::Next;
            }
        }

        let Some(property) = descriptor
            .property_named(name)
            .filter(|p| p.is_readable())
        else {
            return self.unknown_field(object, name, node);
        };

        if !property.is_settable() {
            if !descriptor.is_immutable() {
                self.de.report(
                    EventLevel::Error,
                    &SerializationError::PropertyNotSettable {
                        property: name.to_string(),
                        type_name: descriptor.name().to_string(),
                    },
                );
            }
            return Step::Next;
        }

        let previous = match property.get(object) {
            Ok(value) => value,
            Err(error) => return Step::Finish(self.recover(error)),
        };

        let ty = property.semantic_type();
        let value = self
            .de
            .deserialize(node, ty, Some(previous), self.version, self.upgraded);

        if !value.conforms_to(ty, self.de.registry()) {
            let error = SerializationError::TypeMismatch {
                property: name.to_string(),
                type_name: descriptor.name().to_string(),
                expected: ty.to_string(),
                found: value.type_label(),
            };
            return Step::Finish(self.recover(error));
        }

        match property.set(object, value) {
            Ok(()) => Step::Next,
            Err(error) => Step::Finish(self.recover(error)),
        }
    }

    fn unknown_field(&mut self, object: &mut dyn DomainObject, name: &str, node: &Node) -> Step {
        if let Some(value) = self.request_upgrade() {
            return Step::Finish(value);
        }

        let descriptor = self.descriptor;
        let type_name = descriptor.name();
        if object.custom_data().is_none() {
            let error = SerializationError::PropertyNotFound {
                property: name.to_string(),
                type_name: type_name.to_string(),
            };
            return Step::Finish(self.fallback(error));
        }

        let value = self
            .de
            .deserialize(node, &SemanticType::Any, None, self.version, self.upgraded);
        if let Some(bag) = object.custom_data_mut() {
            bag.insert(name.to_string(), value);
        }
        self.de.context().record(Event::warning(format!(
            "Unable to find a property named {name}. Data stored in CustomData of the {type_name}."
        )));
        Step::Next
    }

    /// Upgrade once, else fall back to the generic representation
    pub(super) fn recover(&mut self, error: SerializationError) -> Value {
        match self.request_upgrade() {
            Some(value) => value,
            None => self.fallback(error),
        }
    }

    fn fallback(&mut self, error: SerializationError) -> Value {
        self.state = BuildState::GenericFallback;
        self.de.report(EventLevel::Error, &error);
        let value = fallback::generic_object(self.de, self.doc, Some(self.descriptor.name()), self.version);
        self.state = BuildState::Done;
        value
    }

    fn request_upgrade(&mut self) -> Option<Value> {
        if self.upgraded || self.upgrade_attempted {
            return None;
        }
        self.upgrade_attempted = true;
        self.state = BuildState::UpgradeRequested;
        debug!("Requesting upgrade of {}", self.descriptor.name());

        let value = self.de.try_upgrade(self.doc, self.version);
        self.state = match value {
            Some(_) => BuildState::Done,
            None => BuildState::PerFieldProcessing,
        };
        value
    }
}
