// Copyright 2025 Cowboy AI, LLC.

//! Serializer configuration

use schemars::{schema::RootSchema, schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use crate::errors::{SerializationError, SerializationResult};
use crate::versioning::SchemaVersion;

/// How rows of unequal length are packed into a 2-D array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JaggedRowPolicy {
    /// Width is the longest row; short rows are padded with the element default
    #[default]
    PadToLongest,
    /// Rows of unequal length are a shape mismatch
    Reject,
}

/// Settings shared by every call made through one context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SerializerConfig {
    /// Schema generation written to `_version` and compared against stored tags
    pub current_version: SchemaVersion,
    /// Packing of jagged 2-D arrays
    pub jagged_rows: JaggedRowPolicy,
    /// Maximum document nesting depth
    pub max_depth: usize,
    /// Capacity of the discriminator rename cache
    pub resolution_cache_size: usize,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            current_version: SchemaVersion::new(7, 0, 0),
            jagged_rows: JaggedRowPolicy::PadToLongest,
            max_depth: 128,
            resolution_cache_size: 256,
        }
    }
}

impl SerializerConfig {
    /// Read a configuration from JSON, filling missing settings with defaults
    pub fn from_json_str(text: &str) -> SerializationResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// JSON schema of the configuration
    pub fn json_schema() -> RootSchema {
        schema_for!(SerializerConfig)
    }

    /// Check the settings are usable
    pub fn validate(&self) -> SerializationResult<()> {
        if self.max_depth == 0 {
            return Err(SerializationError::InvalidDocument(
                "max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Set the current schema generation
    pub fn with_current_version(mut self, version: SchemaVersion) -> Self {
        self.current_version = version;
        self
    }

    /// Set the jagged row policy
    pub fn with_jagged_rows(mut self, policy: JaggedRowPolicy) -> Self {
        self.jagged_rows = policy;
        self
    }

    /// Set the maximum nesting depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
