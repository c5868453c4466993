// Copyright 2025 Cowboy AI, LLC.

//! Collaborators shared by every serialisation call
//!
//! A [`SerializationContext`] bundles the type registry, the upgrade
//! engine, the event sink and the configuration. It is cheap to share behind
//! an `Arc` and every call borrows it, so independent documents can be read
//! concurrently.

use std::sync::Arc;

use crate::config::SerializerConfig;
use crate::deserialize::Deserializer;
use crate::errors::{SerializationError, SerializationResult};
use crate::events::{Event, EventLevel, EventSink, TracingSink};
use crate::registry::{TypeRegistry, TypeResolver};
use crate::serialize::Serializer;
use crate::versioning::{NoUpgrade, UpgradeEngine};

/// Explicitly threaded serialisation state
pub struct SerializationContext {
    registry: Arc<TypeRegistry>,
    upgrader: Arc<dyn UpgradeEngine>,
    sink: Arc<dyn EventSink>,
    config: SerializerConfig,
    resolver: TypeResolver,
}

impl SerializationContext {
    /// Context with no upgrades, events forwarded to `tracing` and default settings
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        SerializationContextBuilder::new().registry(registry).build_unchecked()
    }

    /// Start building a context
    pub fn builder() -> SerializationContextBuilder {
        SerializationContextBuilder::new()
    }

    /// Type registry
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Upgrade engine
    pub fn upgrader(&self) -> &dyn UpgradeEngine {
        self.upgrader.as_ref()
    }

    /// Discriminator resolver
    pub fn resolver(&self) -> &TypeResolver {
        &self.resolver
    }

    /// Settings
    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    /// Start a deserialisation call
    pub fn deserializer(&self) -> Deserializer<'_> {
        Deserializer::new(self)
    }

    /// Start a serialisation call
    pub fn serializer(&self) -> Serializer<'_> {
        Serializer::new(self)
    }

    /// Send an event to the sink
    pub fn record(&self, event: Event) {
        self.sink.record(event);
    }

    /// Report an error at `level`
    pub fn report(&self, level: EventLevel, error: &SerializationError) {
        self.sink.record(Event::from_error(level, error));
    }

    /// Report a warning message
    pub fn warn(&self, message: impl Into<String>) {
        self.sink.record(Event::warning(message));
    }
}

/// Builder for [`SerializationContext`]
pub struct SerializationContextBuilder {
    registry: Option<Arc<TypeRegistry>>,
    upgrader: Arc<dyn UpgradeEngine>,
    sink: Arc<dyn EventSink>,
    config: SerializerConfig,
}

impl SerializationContextBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            registry: None,
            upgrader: Arc::new(NoUpgrade),
            sink: Arc::new(TracingSink),
            config: SerializerConfig::default(),
        }
    }

    /// Set the type registry
    pub fn registry(mut self, registry: Arc<TypeRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the upgrade engine
    pub fn upgrader(mut self, upgrader: Arc<dyn UpgradeEngine>) -> Self {
        self.upgrader = upgrader;
        self
    }

    /// Set the event sink
    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Set the configuration
    pub fn config(mut self, config: SerializerConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the context
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn build(self) -> SerializationResult<SerializationContext> {
        self.config.validate()?;
        Ok(self.build_unchecked())
    }

    fn build_unchecked(self) -> SerializationContext {
        let registry = self.registry.unwrap_or_else(|| Arc::new(TypeRegistry::new()));
        let resolver = TypeResolver::new(
            registry.clone(),
            self.upgrader.clone(),
            self.config.current_version,
            self.config.resolution_cache_size,
        );
        SerializationContext {
            registry,
            upgrader: self.upgrader,
            sink: self.sink,
            config: self.config,
            resolver,
        }
    }
}

impl Default for SerializationContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
