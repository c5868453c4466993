// Copyright 2025 Cowboy AI, LLC.

//! Declared types of properties and deserialisation targets

use serde::{Deserialize, Serialize};
use std::fmt;

/// The semantic type a node is deserialised against
///
/// This is the finite set of shapes the dispatcher knows about. Object
/// types are referenced by discriminator (or by a base/capability name they
/// implement), enums by their registered name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemanticType {
    /// Anything; the value is inferred from the node shape
    Any,
    /// Boolean
    Bool,
    /// 64-bit integer
    Int,
    /// 64-bit float
    Float,
    /// Text
    String,
    /// GUID, stored as text
    Guid,
    /// UTC timestamp, stored as RFC 3339 text
    DateTime,
    /// Raw bytes
    Binary,
    /// Registered enumeration
    Enum(String),
    /// Value type that also accepts null
    Nullable(Box<SemanticType>),
    /// One dimensional array or list
    Array(Box<SemanticType>),
    /// Two dimensional rectangular array
    Grid(Box<SemanticType>),
    /// String-keyed dictionary
    Map(Box<SemanticType>),
    /// Type-keyed collection of fragments
    FragmentSet,
    /// Domain object, optionally restricted to a discriminator or base name
    Object(Option<String>),
}

impl SemanticType {
    /// `T[]`
    pub fn array(element: SemanticType) -> Self {
        SemanticType::Array(Box::new(element))
    }

    /// `T[,]`
    pub fn grid(element: SemanticType) -> Self {
        SemanticType::Grid(Box::new(element))
    }

    /// `Dictionary<string, T>`
    pub fn map(value: SemanticType) -> Self {
        SemanticType::Map(Box::new(value))
    }

    /// `T?`
    pub fn nullable(inner: SemanticType) -> Self {
        match inner {
            already @ SemanticType::Nullable(_) => already,
            inner => SemanticType::Nullable(Box::new(inner)),
        }
    }

    /// Object assignable to `base`
    pub fn object(base: impl Into<String>) -> Self {
        SemanticType::Object(Some(base.into()))
    }

    /// Any object
    pub fn any_object() -> Self {
        SemanticType::Object(None)
    }

    /// Registered enumeration
    pub fn enumeration(name: impl Into<String>) -> Self {
        SemanticType::Enum(name.into())
    }

    /// Whether null is an acceptable value of this type
    pub fn is_nullable(&self) -> bool {
        !self.is_value_scalar()
    }

    /// Non-nullable scalar value types
    pub fn is_value_scalar(&self) -> bool {
        matches!(
            self,
            SemanticType::Bool
                | SemanticType::Int
                | SemanticType::Float
                | SemanticType::Guid
                | SemanticType::DateTime
                | SemanticType::Enum(_)
        )
    }

    /// Element type of arrays and grids
    pub fn element(&self) -> Option<&SemanticType> {
        match self {
            SemanticType::Array(e) | SemanticType::Grid(e) | SemanticType::Map(e) => Some(e),
            SemanticType::Nullable(inner) => inner.element(),
            _ => None,
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::Any => f.write_str("object"),
            SemanticType::Bool => f.write_str("bool"),
            SemanticType::Int => f.write_str("int"),
            SemanticType::Float => f.write_str("double"),
            SemanticType::String => f.write_str("string"),
            SemanticType::Guid => f.write_str("Guid"),
            SemanticType::DateTime => f.write_str("DateTime"),
            SemanticType::Binary => f.write_str("byte[]"),
            SemanticType::Enum(name) => f.write_str(name),
            SemanticType::Nullable(inner) => write!(f, "{inner}?"),
            SemanticType::Array(e) => write!(f, "{e}[]"),
            SemanticType::Grid(e) => write!(f, "{e}[,]"),
            SemanticType::Map(v) => write!(f, "Dictionary<string, {v}>"),
            SemanticType::FragmentSet => f.write_str("FragmentSet"),
            SemanticType::Object(Some(base)) => f.write_str(base),
            SemanticType::Object(None) => f.write_str("IObject"),
        }
    }
}
