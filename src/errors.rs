// Copyright 2025 Cowboy AI, LLC.

//! Error types for serialization operations

use thiserror::Error;

use crate::versioning::UpgradeError;

/// Errors that can occur while reading or writing object graphs
///
/// Most of these never reach the top-level caller: the deserializer reports
/// them to the event sink and degrades per field or element. They are still
/// returned from the lower-level operations (resolution, conversion, setters)
/// so each layer can decide how to recover.
#[derive(Debug, Clone, Error)]
pub enum SerializationError {
    /// The document node does not have the shape the target type requires
    #[error("Expected to deserialise {expected} and received {found} instead")]
    ShapeMismatch {
        /// Shape required by the target type
        expected: String,
        /// Rendering of the node that was received
        found: String,
    },

    /// A stored field has no declared property on the resolved type
    #[error("Unable to find a property named {property} on object of type {type_name}")]
    PropertyNotFound {
        /// Stored field name
        property: String,
        /// Discriminator of the resolved type
        type_name: String,
    },

    /// A deserialised value cannot be assigned to the declared property
    #[error("Unable to set property {property} to object of type {type_name} due to a type mismatch. Expected {expected} but serialised value was {found}")]
    TypeMismatch {
        /// Property being assigned
        property: String,
        /// Discriminator of the host type
        type_name: String,
        /// Declared property type
        expected: String,
        /// Type of the produced value
        found: String,
    },

    /// No registered type matches the stored discriminator
    #[error("Type not found: {discriminator}")]
    TypeNotFound {
        /// Stored discriminator
        discriminator: String,
        /// Whether the document was written under an older schema generation
        outdated: bool,
    },

    /// Several registered types share the stored discriminator
    #[error("Ambiguous type {discriminator}: {} candidates registered", candidates.len())]
    AmbiguousType {
        /// Stored discriminator
        discriminator: String,
        /// Type names of every registered candidate
        candidates: Vec<String>,
    },

    /// The property exists but cannot be written
    #[error("Property {property} of {type_name} is not settable")]
    PropertyNotSettable {
        /// Property name
        property: String,
        /// Discriminator of the host type
        type_name: String,
    },

    /// A live value could not be converted to the requested Rust type
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Document nesting exceeded the configured limit
    #[error("Maximum nesting depth of {0} exceeded")]
    DepthExceeded(usize),

    /// The input could not be read as a document at all
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// The upgrade engine failed
    #[error("Upgrade error: {0}")]
    Upgrade(String),
}

/// Result type for serialization operations
pub type SerializationResult<T> = Result<T, SerializationError>;

impl From<serde_json::Error> for SerializationError {
    fn from(err: serde_json::Error) -> Self {
        SerializationError::InvalidDocument(err.to_string())
    }
}

impl From<UpgradeError> for SerializationError {
    fn from(err: UpgradeError) -> Self {
        SerializationError::Upgrade(err.to_string())
    }
}

impl SerializationError {
    /// Create a conversion error
    pub fn conversion(msg: impl Into<String>) -> Self {
        SerializationError::Conversion(msg.into())
    }

    /// Create a shape mismatch error
    pub fn shape(expected: impl Into<String>, found: impl Into<String>) -> Self {
        SerializationError::ShapeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Check if this error should send the document through the upgrade path
    pub fn triggers_upgrade(&self) -> bool {
        matches!(
            self,
            SerializationError::PropertyNotFound { .. }
                | SerializationError::TypeMismatch { .. }
                | SerializationError::TypeNotFound { .. }
        )
    }

    /// Check if this error is local to a single field or element
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, SerializationError::InvalidDocument(_))
    }
}
