// Copyright 2025 Cowboy AI, LLC.

//! Schema generation numbers carried by documents in `_version`

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::UpgradeError;

/// Schema version of a stored document
///
/// Parsed from `major.minor` or `major.minor.patch`; a missing patch
/// component is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SchemaVersion {
    /// Major version
    pub major: u32,
    /// Minor version
    pub minor: u32,
    /// Patch version
    pub patch: u32,
}

impl SchemaVersion {
    /// Create a new schema version
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Parse from string (e.g., "7.1" or "7.1.2")
    pub fn parse(s: &str) -> Result<Self, UpgradeError> {
        let invalid = || UpgradeError::InvalidVersion(s.to_string());
        let parts: Vec<&str> = s.trim().split('.').collect();
        if !(2..=3).contains(&parts.len()) {
            return Err(invalid());
        }

        let number = |part: &str| part.parse::<u32>().map_err(|_| invalid());
        Ok(Self {
            major: number(parts[0])?,
            minor: number(parts[1])?,
            patch: parts.get(2).map_or(Ok(0), |p| number(*p))?,
        })
    }

    /// Whether a stored version tag is older than this version
    ///
    /// Missing and unparsable tags are never considered older.
    pub fn is_newer_than_tag(&self, tag: Option<&str>) -> bool {
        tag.and_then(|t| Self::parse(t).ok())
            .is_some_and(|stored| stored < *self)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SchemaVersion {
    type Err = UpgradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialOrd for SchemaVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SchemaVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
    }
}

impl Serialize for SchemaVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SchemaVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

impl JsonSchema for SchemaVersion {
    fn schema_name() -> String {
        "SchemaVersion".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        String::json_schema(gen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("7.0", SchemaVersion::new(7, 0, 0) ; "two components")]
    #[test_case("6.3.2", SchemaVersion::new(6, 3, 2) ; "three components")]
    #[test_case(" 8.1 ", SchemaVersion::new(8, 1, 0) ; "surrounding whitespace")]
    fn test_parse(text: &str, expected: SchemaVersion) {
        assert_eq!(SchemaVersion::parse(text).unwrap(), expected);
    }

    #[test_case("" ; "empty")]
    #[test_case("7" ; "single component")]
    #[test_case("7.x" ; "not a number")]
    #[test_case("1.2.3.4" ; "too many components")]
    fn test_parse_invalid(text: &str) {
        assert!(matches!(
            SchemaVersion::parse(text),
            Err(UpgradeError::InvalidVersion(_))
        ));
    }

    #[test]
    fn test_ordering() {
        assert!(SchemaVersion::new(6, 3, 0) < SchemaVersion::new(7, 0, 0));
        assert!(SchemaVersion::new(7, 0, 1) > SchemaVersion::new(7, 0, 0));
        assert!(SchemaVersion::new(7, 1, 0) > SchemaVersion::new(7, 0, 9));
    }

    #[test]
    fn test_is_newer_than_tag() {
        let current = SchemaVersion::new(7, 0, 0);
        assert!(current.is_newer_than_tag(Some("6.3")));
        assert!(!current.is_newer_than_tag(Some("7.0")));
        assert!(!current.is_newer_than_tag(Some("garbage")));
        assert!(!current.is_newer_than_tag(None));
    }

    #[test]
    fn test_serde_as_string() {
        let version = SchemaVersion::new(7, 2, 1);
        let json = serde_json::to_string(&version).unwrap();
        assert_eq!(json, "\"7.2.1\"");
        assert_eq!(serde_json::from_str::<SchemaVersion>(&json).unwrap(), version);
        assert!(serde_json::from_str::<SchemaVersion>("\"seven\"").is_err());
    }
}
