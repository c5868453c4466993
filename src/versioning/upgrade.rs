// Copyright 2025 Cowboy AI, LLC.

//! Upgrade engines
//!
//! An upgrade engine maps a document written under an older schema
//! generation onto the current shape of its type. The deserializer consults
//! it when a document cannot be reconciled with the registered type.

use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

use super::SchemaVersion;
use crate::document::{self, Document, Node, TYPE_FIELD, VERSION_FIELD};

// Type alias for upcaster transformation closures
type DocumentTransformerFn = Box<dyn Fn(&Document) -> Result<Document, UpgradeError> + Send + Sync>;

/// Errors that can occur while upgrading documents
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UpgradeError {
    /// The document does not carry a usable discriminator
    #[error("Unknown document type: {0}")]
    UnknownType(String),

    /// Nothing is registered to take the document to the current version
    #[error("No upcaster registered for version {from} to {to}")]
    NoUpcaster {
        /// Version of the stored document
        from: SchemaVersion,
        /// Current schema version
        to: SchemaVersion,
    },

    /// The upcasting transformation failed
    #[error("Upcasting failed: {0}")]
    UpcastingFailed(String),

    /// A version tag could not be parsed
    #[error("Invalid version format: {0}")]
    InvalidVersion(String),
}

/// Collaborator that maps outdated documents to current ones
///
/// The deserializer only observes whether an upgrade happened. Engines must
/// be safe to share between threads.
pub trait UpgradeEngine: Send + Sync {
    /// Produce an upgraded copy of `document`, or `None` when no upgrade applies
    fn try_upgrade(&self, document: &Document, version: Option<&str>) -> Option<Document>;

    /// Current discriminator of a type that was renamed
    fn upgrade_discriminator(&self, _discriminator: &str, _version: Option<&str>) -> Option<String> {
        None
    }
}

/// Engine that never upgrades anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUpgrade;

impl UpgradeEngine for NoUpgrade {
    fn try_upgrade(&self, _document: &Document, _version: Option<&str>) -> Option<Document> {
        None
    }
}

/// Trait for transforming documents from one schema version to another
pub trait DocumentUpcaster: Send + Sync {
    /// Transform a document from an older version to a newer version
    fn upcast(&self, document: &Document) -> Result<Document, UpgradeError>;

    /// Get the source version this upcaster transforms from
    fn source_version(&self) -> SchemaVersion;

    /// Get the target version this upcaster transforms to
    fn target_version(&self) -> SchemaVersion;
}

/// A simple implementation of DocumentUpcaster using a closure
pub struct SimpleUpcaster {
    from: SchemaVersion,
    to: SchemaVersion,
    transformer: DocumentTransformerFn,
}

impl SimpleUpcaster {
    /// Create a new simple upcaster with a transformation function
    pub fn new<F>(from: SchemaVersion, to: SchemaVersion, transformer: F) -> Self
    where
        F: Fn(&Document) -> Result<Document, UpgradeError> + Send + Sync + 'static,
    {
        Self {
            from,
            to,
            transformer: Box::new(transformer),
        }
    }
}

impl DocumentUpcaster for SimpleUpcaster {
    fn upcast(&self, document: &Document) -> Result<Document, UpgradeError> {
        (self.transformer)(document)
    }

    fn source_version(&self) -> SchemaVersion {
        self.from
    }

    fn target_version(&self) -> SchemaVersion {
        self.to
    }
}

/// Upgrade engine built from per-type upcaster chains and type renames
///
/// ```mermaid
/// graph LR
///     A[Stored document] -->|rename _t| B[Current discriminator]
///     B -->|6.0 to 6.3| C[Upcast]
///     C -->|6.3 to 7.0| D[Upcast]
///     D -->|stamp _version| E[Current document]
/// ```
pub struct VersionedUpgrader {
    current_version: SchemaVersion,
    upcasters: HashMap<String, Vec<Box<dyn DocumentUpcaster>>>,
    renames: HashMap<String, String>,
}

impl VersionedUpgrader {
    /// Create an upgrader targeting `current_version`
    pub fn new(current_version: SchemaVersion) -> Self {
        Self {
            current_version,
            upcasters: HashMap::new(),
            renames: HashMap::new(),
        }
    }

    /// Version every upgraded document is stamped with
    pub fn current_version(&self) -> SchemaVersion {
        self.current_version
    }

    /// Register an upcaster for documents of `discriminator`
    ///
    /// The discriminator is the current one; documents stored under a renamed
    /// discriminator are renamed first.
    pub fn register_upcaster(&mut self, discriminator: impl Into<String>, upcaster: Box<dyn DocumentUpcaster>) {
        let steps = self.upcasters.entry(discriminator.into()).or_default();
        steps.push(upcaster);
        steps.sort_by_key(|u| u.source_version());
    }

    /// Register a type rename
    pub fn register_rename(&mut self, old: impl Into<String>, new: impl Into<String>) {
        self.renames.insert(old.into(), new.into());
    }

    /// Upgrade a document to the current version
    ///
    /// The document's own `_version` takes precedence over `version`. A
    /// document without any version tag is assumed current, so only renames
    /// apply to it.
    pub fn upgrade_document(&self, document: &Document, version: Option<&str>) -> Result<Document, UpgradeError> {
        let stored = document::discriminator(document)
            .ok_or_else(|| UpgradeError::UnknownType(format!("document without {TYPE_FIELD}")))?;

        let from = match document::version_tag(document).or(version) {
            Some(tag) => SchemaVersion::parse(tag)?,
            None => self.current_version,
        };

        let mut upgraded = document.clone();
        let mut changed = false;

        let discriminator = match self.renames.get(stored) {
            Some(renamed) => {
                upgraded.insert(TYPE_FIELD.to_string(), Node::string(renamed.clone()));
                changed = true;
                renamed.as_str()
            }
            None => stored,
        };

        let mut at = from;
        if let Some(steps) = self.upcasters.get(discriminator) {
            while at < self.current_version {
                let Some(step) = steps
                    .iter()
                    .filter(|u| u.source_version() <= at && at < u.target_version())
                    .max_by_key(|u| u.source_version())
                else {
                    break;
                };
                upgraded = step.upcast(&upgraded)?;
                at = step.target_version();
                changed = true;
            }
        }

        if !changed {
            return Err(UpgradeError::NoUpcaster {
                from,
                to: self.current_version,
            });
        }

        upgraded.insert(
            VERSION_FIELD.to_string(),
            Node::string(self.current_version.to_string()),
        );
        Ok(upgraded)
    }
}

impl UpgradeEngine for VersionedUpgrader {
    fn try_upgrade(&self, document: &Document, version: Option<&str>) -> Option<Document> {
        match self.upgrade_document(document, version) {
            Ok(upgraded) if upgraded != *document => {
                debug!(
                    discriminator = document::discriminator(&upgraded),
                    to = %self.current_version,
                    "Upgraded document"
                );
                Some(upgraded)
            }
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "Document not upgraded");
                None
            }
        }
    }

    fn upgrade_discriminator(&self, discriminator: &str, _version: Option<&str>) -> Option<String> {
        self.renames.get(discriminator).cloned()
    }
}
