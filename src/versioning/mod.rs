// Copyright 2025 Cowboy AI, LLC.

//! Schema versioning and document upgrades
//!
//! The deserializer only depends on the [`UpgradeEngine`] trait. The
//! [`VersionedUpgrader`] is a concrete engine built from per-type chains of
//! [`DocumentUpcaster`] steps plus a table of discriminator renames.

mod schema_version;
mod upgrade;

pub use schema_version::SchemaVersion;
pub use upgrade::{
    DocumentUpcaster, NoUpgrade, SimpleUpcaster, UpgradeEngine, UpgradeError, VersionedUpgrader,
};
