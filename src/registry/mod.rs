// Copyright 2025 Cowboy AI, LLC.

//! # Type Catalog
//!
//! The registry maps stored discriminators to [`TypeDescriptor`]s and
//! answers the questions the deserializer asks about declared types:
//! which properties exist, whether a produced value can be assigned to a
//! declared type, and what the default value of a type is.
//!
//! The catalog is populated at start-up and append-only afterwards. It is
//! internally synchronised so one registry can serve concurrent callers.

mod descriptor;
pub mod resolver;
mod semantic_type;

pub use descriptor::{Construction, EnumDescriptor, Parameter, PropertyDescriptor, TypeDescriptor};
pub use resolver::{ResolvedType, TypeResolver};
pub use semantic_type::SemanticType;

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::errors::{SerializationError, SerializationResult};
use crate::object::{CustomObject, DomainObject, CUSTOM_OBJECT_TYPE};
use crate::value::Value;

#[derive(Default)]
struct Catalog {
    by_name: HashMap<String, Vec<Arc<TypeDescriptor>>>,
    by_type_id: HashMap<TypeId, Arc<TypeDescriptor>>,
    enums: HashMap<String, Arc<EnumDescriptor>>,
}

/// Catalog of known runtime types
pub struct TypeRegistry {
    catalog: RwLock<Catalog>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create a registry holding only the built-in [`CustomObject`]
    pub fn new() -> Self {
        let registry = Self {
            catalog: RwLock::new(Catalog::default()),
        };
        registry.register(
            TypeDescriptor::mutable::<CustomObject>(CUSTOM_OBJECT_TYPE).field(
                "Discriminator",
                SemanticType::String,
                |o: &CustomObject| &o.discriminator,
                |o: &mut CustomObject| &mut o.discriminator,
            ),
        );
        registry
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Catalog> {
        self.catalog.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Catalog> {
        self.catalog.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a type
    ///
    /// Registering a second type under an existing discriminator is kept,
    /// not rejected: the clash surfaces as [`SerializationError::AmbiguousType`]
    /// when that discriminator is resolved.
    pub fn register(&self, descriptor: TypeDescriptor) -> Arc<TypeDescriptor> {
        let descriptor = Arc::new(descriptor);
        let mut catalog = self.write();
        let candidates = catalog
            .by_name
            .entry(descriptor.name().to_string())
            .or_default();
        if !candidates.is_empty() {
            warn!(
                discriminator = descriptor.name(),
                "Discriminator registered by more than one type"
            );
        }
        candidates.push(descriptor.clone());
        catalog
            .by_type_id
            .insert(descriptor.type_id(), descriptor.clone());
        debug!(
            discriminator = descriptor.name(),
            rust_type = descriptor.rust_type_name(),
            properties = descriptor.properties().len(),
            "Registered type"
        );
        descriptor
    }

    /// Register an enumeration
    pub fn register_enum(&self, descriptor: EnumDescriptor) {
        self.write()
            .enums
            .insert(descriptor.name().to_string(), Arc::new(descriptor));
    }

    /// Look up a discriminator
    ///
    /// # Errors
    ///
    /// `TypeNotFound` when nothing is registered under the name,
    /// `AmbiguousType` when more than one type is
    pub fn lookup(&self, discriminator: &str) -> SerializationResult<Arc<TypeDescriptor>> {
        let catalog = self.read();
        match catalog.by_name.get(discriminator).map(Vec::as_slice) {
            Some([single]) => Ok(single.clone()),
            Some(candidates) if candidates.len() > 1 => Err(SerializationError::AmbiguousType {
                discriminator: discriminator.to_string(),
                candidates: candidates
                    .iter()
                    .map(|d| d.rust_type_name().to_string())
                    .collect(),
            }),
            _ => Err(SerializationError::TypeNotFound {
                discriminator: discriminator.to_string(),
                outdated: false,
            }),
        }
    }

    /// Whether anything is registered under `discriminator`
    pub fn contains(&self, discriminator: &str) -> bool {
        self.read().by_name.contains_key(discriminator)
    }

    /// Descriptor of a live object's concrete type
    pub fn descriptor_of(&self, object: &dyn DomainObject) -> Option<Arc<TypeDescriptor>> {
        self.read()
            .by_type_id
            .get(&object.concrete_type_id())
            .cloned()
    }

    /// Whether the type registered under `discriminator` is assignable to `base`
    pub fn is_assignable(&self, discriminator: &str, base: &str) -> bool {
        self.lookup(discriminator)
            .is_ok_and(|descriptor| descriptor.is_assignable_to(base))
    }

    /// Registered enumeration
    pub fn enum_descriptor(&self, name: &str) -> Option<Arc<EnumDescriptor>> {
        self.read().enums.get(name).cloned()
    }

    /// Number of registered discriminators
    pub fn len(&self) -> usize {
        self.read().by_name.len()
    }

    /// Check if only built-in types are registered
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Distinct declared property types of a registered type
    ///
    /// With `deep`, the property types of every registered object type
    /// reachable through the properties are included too.
    pub fn property_types(&self, discriminator: &str, deep: bool) -> SerializationResult<Vec<SemanticType>> {
        let mut seen_types = HashSet::new();
        let mut visited = HashSet::new();
        let mut result = Vec::new();
        let mut pending = vec![self.lookup(discriminator)?];

        while let Some(descriptor) = pending.pop() {
            if !visited.insert(descriptor.name().to_string()) {
                continue;
            }
            for property in descriptor.properties() {
                let ty = property.semantic_type().clone();
                if deep {
                    if let Some(name) = object_name(&ty) {
                        if let Ok(nested) = self.lookup(name) {
                            pending.push(nested);
                        }
                    }
                }
                if seen_types.insert(ty.clone()) {
                    result.push(ty);
                }
            }
        }
        Ok(result)
    }

    /// Whether `value` can be assigned to a property declared as `ty`
    pub fn conforms(&self, value: &Value, ty: &SemanticType) -> bool {
        match (ty, value) {
            (SemanticType::Any, _) => true,
            (_, Value::Null) => ty.is_nullable(),
            (SemanticType::Nullable(inner), value) => self.conforms(value, inner),
            (SemanticType::Bool, Value::Bool(_))
            | (SemanticType::Int, Value::Int(_))
            | (SemanticType::Float, Value::Float(_))
            | (SemanticType::String, Value::String(_))
            | (SemanticType::Guid, Value::Guid(_))
            | (SemanticType::DateTime, Value::DateTime(_))
            | (SemanticType::Binary, Value::Binary(_))
            | (SemanticType::FragmentSet, Value::FragmentSet(_))
            | (SemanticType::Object(None), Value::Object(_)) => true,
            (SemanticType::Enum(name), Value::Enum { type_name, .. }) => name == type_name,
            (SemanticType::Array(element), Value::Array(items)) => {
                items.iter().all(|item| self.conforms(item, element))
            }
            (SemanticType::Grid(element), Value::Grid(grid)) => {
                grid.cells().iter().all(|cell| self.conforms(cell, element))
            }
            (SemanticType::Map(element), Value::Map(map)) => {
                map.values().all(|item| self.conforms(item, element))
            }
            (SemanticType::Object(Some(base)), Value::Object(object)) => self
                .descriptor_of(object.as_ref())
                .is_some_and(|d| d.is_assignable_to(base)),
            _ => false,
        }
    }

    /// Default value of a type
    ///
    /// Value scalars default to zero/false/nil, enums to their first
    /// variant; every nullable type defaults to null.
    pub fn default_value(&self, ty: &SemanticType) -> Value {
        match ty {
            SemanticType::Bool => Value::Bool(false),
            SemanticType::Int => Value::Int(0),
            SemanticType::Float => Value::Float(0.0),
            SemanticType::Guid => Value::Guid(uuid::Uuid::nil()),
            SemanticType::DateTime => Value::DateTime(chrono::DateTime::<chrono::Utc>::default()),
            SemanticType::Enum(name) => self
                .enum_descriptor(name)
                .and_then(|e| e.variants().first().map(|v| (e.name().to_string(), v.clone())))
                .map_or(Value::Null, |(type_name, variant)| Value::Enum { type_name, variant }),
            _ => Value::Null,
        }
    }
}

fn object_name(ty: &SemanticType) -> Option<&str> {
    match ty {
        SemanticType::Object(Some(name)) => Some(name),
        SemanticType::Nullable(inner)
        | SemanticType::Array(inner)
        | SemanticType::Grid(inner)
        | SemanticType::Map(inner) => object_name(inner),
        _ => None,
    }
}
