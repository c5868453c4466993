// Copyright 2025 Cowboy AI, LLC.

//! # Habitat Serialization
//!
//! Versioned object graph serialization for building and infrastructure
//! domain models.
//!
//! Domain objects are stored as schemaless documents (JSON or BSON shaped
//! trees) tagged with a type discriminator `_t` and a schema version
//! `_version`. This crate reloads such documents into live object graphs even
//! when the stored shape of a type has drifted from its current shape:
//! - **Document model**: `Node` trees with reserved fields and collection wrappers
//! - **Type catalog**: Registration-time descriptors with cached property accessors
//! - **Deserializer**: Ordered dispatch over semantic types, property reconciliation,
//!   fragment sets, immutable construction and generic fallbacks
//! - **Upgrades**: A pluggable upgrade engine with a chained upcaster implementation
//! - **Serializer**: The inverse mapping, so graphs round trip
//! - **Diagnostics**: Event sinks that record every degraded field instead of failing
//!
//! ## Design Principles
//!
//! 1. **Never abort**: A bad field degrades locally and is reported; only malformed input text is an error
//! 2. **Upgrade once**: Each object consults the upgrade engine at most once
//! 3. **Explicit context**: Registry, upgrade engine, sink and settings are passed, never global
//! 4. **Capabilities over inheritance**: Custom data bags and fragments are trait capabilities
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use habitat_serialization::{
//!     domain_object, from_json, CustomData, SemanticType, SerializationContext, TypeDescriptor,
//!     TypeRegistry,
//! };
//!
//! #[derive(Debug, Clone, PartialEq, Default)]
//! struct Level {
//!     name: String,
//!     elevation: f64,
//!     custom_data: CustomData,
//! }
//! domain_object!(Level, custom_data = custom_data);
//!
//! let registry = TypeRegistry::new();
//! registry.register(
//!     TypeDescriptor::mutable::<Level>("Spatial.Level")
//!         .field("Name", SemanticType::String, |l: &Level| &l.name, |l: &mut Level| &mut l.name)
//!         .field("Elevation", SemanticType::Float, |l: &Level| &l.elevation, |l: &mut Level| &mut l.elevation),
//! );
//! let ctx = SerializationContext::new(Arc::new(registry));
//!
//! let value = from_json(&ctx, r#"{"_t": "Spatial.Level", "Name": "L1", "Elevation": 3, "Zone": "A"}"#).unwrap();
//! let level = value.downcast_ref::<Level>().unwrap();
//! assert_eq!(level.elevation, 3.0);
//! assert!(level.custom_data.contains_key("Zone"));
//! ```

#![warn(missing_docs)]

mod config;
mod context;
mod convert;
pub mod deserialize;
mod document;
mod errors;
pub mod events;
mod fragment;
mod object;
pub mod registry;
mod serialize;
mod value;
pub mod versioning;

// Re-export core types
pub use config::{JaggedRowPolicy, SerializerConfig};
pub use context::{SerializationContext, SerializationContextBuilder};
pub use convert::{deserialize_as, from_json, from_json_as, from_node, to_json, to_json_pretty, to_node};
pub use deserialize::Deserializer;
pub use document::{
    discriminator, is_reserved, version_tag, Document, Node, Scalar, CUSTOM_DATA_FIELD, ITEMS_FIELD,
    RESERVED_PREFIX, TYPE_FIELD, VALUE_FIELD, VERSION_FIELD,
};
pub use errors::{SerializationError, SerializationResult};
pub use events::{Event, EventLevel, EventLog, EventSink, TracingSink};
pub use fragment::FragmentSet;
pub use object::{CustomObject, DomainObject, CUSTOM_OBJECT_TYPE};
pub use registry::{
    EnumDescriptor, Parameter, PropertyDescriptor, ResolvedType, SemanticType, TypeDescriptor,
    TypeRegistry, TypeResolver,
};
pub use serialize::Serializer;
pub use value::{CustomData, FromValue, Grid, IntoValue, Value};
pub use versioning::{
    DocumentUpcaster, NoUpgrade, SchemaVersion, SimpleUpcaster, UpgradeEngine, UpgradeError,
    VersionedUpgrader,
};
