// Copyright 2025 Cowboy AI, LLC.

//! Discriminator resolution
//!
//! Maps a stored discriminator and version tag onto a registered type,
//! consulting the upgrade engine for renamed types. Renames are memoised in
//! an LRU cache so repeated documents of a renamed type skip the engine.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use lru::LruCache;
use tracing::{debug, trace};

use super::{TypeDescriptor, TypeRegistry};
use crate::errors::{SerializationError, SerializationResult};
use crate::versioning::{SchemaVersion, UpgradeEngine};

/// Outcome of resolving a discriminator
#[derive(Debug, Clone)]
pub enum ResolvedType {
    /// Type built from a default instance and populated through setters
    Mutable(Arc<TypeDescriptor>),
    /// Type built through its all-args constructor
    Immutable(Arc<TypeDescriptor>),
}

impl ResolvedType {
    /// Resolved descriptor
    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        match self {
            ResolvedType::Mutable(d) | ResolvedType::Immutable(d) => d,
        }
    }

    fn from_descriptor(descriptor: Arc<TypeDescriptor>) -> Self {
        if descriptor.is_immutable() {
            ResolvedType::Immutable(descriptor)
        } else {
            ResolvedType::Mutable(descriptor)
        }
    }
}

type CacheKey = (String, Option<String>);

/// Resolves discriminators against a registry
pub struct TypeResolver {
    registry: Arc<TypeRegistry>,
    upgrader: Arc<dyn UpgradeEngine>,
    current_version: SchemaVersion,
    renames: Mutex<LruCache<CacheKey, Option<String>>>,
}

impl TypeResolver {
    /// Create a resolver
    pub fn new(
        registry: Arc<TypeRegistry>,
        upgrader: Arc<dyn UpgradeEngine>,
        current_version: SchemaVersion,
        cache_size: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            registry,
            upgrader,
            current_version,
            renames: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Resolve `discriminator`
    ///
    /// # Errors
    ///
    /// `AmbiguousType` when several types share the discriminator, and
    /// `TypeNotFound` when neither the discriminator nor its renamed form is
    /// registered. `outdated` is set when `version` is older than the
    /// current schema generation.
    pub fn resolve(
        &self,
        discriminator: &str,
        version: Option<&str>,
        upgraded: bool,
    ) -> SerializationResult<ResolvedType> {
        match self.registry.lookup(discriminator) {
            Ok(descriptor) => return Ok(ResolvedType::from_descriptor(descriptor)),
            Err(SerializationError::TypeNotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        if !upgraded {
            if let Some(renamed) = self.renamed(discriminator, version) {
                debug!(from = discriminator, to = %renamed, "Resolved renamed type");
                return self
                    .registry
                    .lookup(&renamed)
                    .map(ResolvedType::from_descriptor)
                    .map_err(|e| self.not_found(e, discriminator, version));
            }
        }

        Err(SerializationError::TypeNotFound {
            discriminator: discriminator.to_string(),
            outdated: self.current_version.is_newer_than_tag(version),
        })
    }

    fn renamed(&self, discriminator: &str, version: Option<&str>) -> Option<String> {
        let key = (discriminator.to_string(), version.map(str::to_string));
        let mut cache = self.renames.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = cache.get(&key) {
            trace!(discriminator, "Rename cache hit");
            return hit.clone();
        }
        let renamed = self.upgrader.upgrade_discriminator(discriminator, version);
        cache.put(key, renamed.clone());
        renamed
    }

    fn not_found(&self, error: SerializationError, discriminator: &str, version: Option<&str>) -> SerializationError {
        match error {
            SerializationError::TypeNotFound { .. } => SerializationError::TypeNotFound {
                discriminator: discriminator.to_string(),
                outdated: self.current_version.is_newer_than_tag(version),
            },
            other => other,
        }
    }
}
