// Copyright 2025 Cowboy AI, LLC.

//! # Object Graph Deserialisation
//!
//! A [`Deserializer`] turns a document [`Node`] into a live [`Value`] guided by
//! a target [`SemanticType`]. Dispatch is a fixed, ordered match on the
//! target:
//!
//! 1. null node
//! 2. nullable wrapper
//! 3. arrays and 2-D grids
//! 4. fragment sets
//! 5. objects (mutable, immutable, deprecated or generic)
//! 6. maps
//! 7. untyped values inferred from the node
//! 8. scalar conversion
//!
//! No step ever aborts the call. Failures are reported to the context's
//! event sink and the step yields the previous value, the type default or a
//! generic [`CustomObject`](crate::CustomObject).
//!
//! ```mermaid
//! graph TD
//!     A[Node + target] --> B{Null?}
//!     B -->|yes| C[Null or previous/default]
//!     B -->|no| D{Target shape}
//!     D -->|Array / Grid| E[array]
//!     D -->|FragmentSet| F[fragment_set]
//!     D -->|Object| G[resolve]
//!     G -->|mutable| H[object_graph]
//!     G -->|immutable| I[immutable]
//!     G -->|not found| J[upgrade or fallback]
//!     D -->|Map| K[map]
//!     D -->|scalar| L[scalar]
//! ```

mod array;
mod fallback;
mod fragment_set;
mod immutable;
mod map;
mod object_graph;
mod scalar;

pub use object_graph::BuildState;

use std::cell::Cell;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::context::SerializationContext;
use crate::document::{self, Document, Node, Scalar};
use crate::errors::SerializationError;
use crate::events::EventLevel;
use crate::registry::{ResolvedType, SemanticType, TypeDescriptor, TypeRegistry};
use crate::value::Value;

/// One deserialisation call over a context
///
/// The deserializer itself only tracks nesting depth; all other state lives
/// in the borrowed [`SerializationContext`].
pub struct Deserializer<'a> {
    ctx: &'a SerializationContext,
    depth: Cell<usize>,
}

impl<'a> Deserializer<'a> {
    /// Create a deserializer over `ctx`
    pub fn new(ctx: &'a SerializationContext) -> Self {
        Self {
            ctx,
            depth: Cell::new(0),
        }
    }

    /// Context this call reads from
    pub fn context(&self) -> &'a SerializationContext {
        self.ctx
    }

    pub(crate) fn registry(&self) -> &'a TypeRegistry {
        self.ctx.registry()
    }

    pub(crate) fn report(&self, level: EventLevel, error: &SerializationError) {
        self.ctx.report(level, error);
    }

    /// Deserialise an untyped node
    pub fn deserialize_node(&self, node: &Node) -> Value {
        self.deserialize(node, &SemanticType::Any, None, None, false)
    }

    /// Deserialise `node` against `target`
    ///
    /// `previous` is the value currently held by the destination; it is
    /// reused for objects of the same type and returned when the node cannot
    /// be converted. `version` is the inherited version tag, and `upgraded`
    /// marks documents produced by the upgrade engine.
    pub fn deserialize(
        &self,
        node: &Node,
        target: &SemanticType,
        previous: Option<Value>,
        version: Option<&str>,
        upgraded: bool,
    ) -> Value {
        let depth = self.depth.get();
        let max_depth = self.ctx.config().max_depth;
        if depth >= max_depth {
            self.report(EventLevel::Error, &SerializationError::DepthExceeded(max_depth));
            return self.previous_or_default(previous, target);
        }

        self.depth.set(depth + 1);
        let value = self.dispatch(node, target, previous, version, upgraded);
        self.depth.set(depth);
        value
    }

    fn dispatch(
        &self,
        node: &Node,
        target: &SemanticType,
        previous: Option<Value>,
        version: Option<&str>,
        upgraded: bool,
    ) -> Value {
        trace!(target = %target, node = node.kind(), "Dispatching");

        if node.is_null() {
            return if target.is_nullable() {
                Value::Null
            } else {
                self.previous_or_default(previous, target)
            };
        }

        match target {
            SemanticType::Nullable(inner) => self.dispatch(node, inner, previous, version, upgraded),
            SemanticType::Array(element) => array::deserialize_array(self, node, element, previous, version, upgraded),
            SemanticType::Grid(element) => array::deserialize_grid(self, node, element, previous, version, upgraded),
            SemanticType::FragmentSet => self.deserialize_fragment_set(node, previous, version, upgraded),
            SemanticType::Object(base) => match node {
                Node::Document(doc) => self.deserialize_object(doc, base.as_deref(), previous, version, upgraded),
                other => {
                    self.report(EventLevel::Error, &SerializationError::shape(target.to_string(), other.to_string()));
                    previous.unwrap_or_default()
                }
            },
            SemanticType::Map(element) => map::deserialize_map(self, node, element, previous, version, upgraded),
            SemanticType::Any => self.deserialize_any(node, previous, version, upgraded),
            scalar => scalar::deserialize_scalar(self, node, scalar, previous),
        }
    }

    /// Deserialise a fragment set, appending to `existing`
    pub fn deserialize_fragment_set(
        &self,
        node: &Node,
        existing: Option<Value>,
        version: Option<&str>,
        upgraded: bool,
    ) -> Value {
        fragment_set::deserialize_fragment_set(self, node, existing, version, upgraded)
    }

    /// Populate an instance of a resolved mutable type from `doc`
    ///
    /// `existing` is reused when it is an object of the descriptor's type.
    pub fn build_object(
        &self,
        doc: &Document,
        descriptor: &Arc<TypeDescriptor>,
        existing: Option<Value>,
        version: Option<&str>,
        upgraded: bool,
    ) -> Value {
        object_graph::build_object(self, doc, descriptor, existing, version, upgraded)
    }

    /// Ask the upgrade engine for a newer form of `doc` and deserialise it
    ///
    /// Returns `None` when the engine declines, returns the document
    /// unchanged, or the upgraded document deserialises to null.
    pub fn try_upgrade(&self, doc: &Document, version: Option<&str>) -> Option<Value> {
        let upgraded = self.ctx.upgrader().try_upgrade(doc, version)?;
        if upgraded == *doc {
            return None;
        }

        debug!(
            "Upgraded {} from version {}",
            document::discriminator(doc).unwrap_or("<untyped>"),
            version.unwrap_or("<current>")
        );
        let value = self.deserialize(
            &Node::Document(upgraded),
            &SemanticType::any_object(),
            None,
            None,
            true,
        );
        (!value.is_null()).then_some(value)
    }

    pub(crate) fn deserialize_object(
        &self,
        doc: &Document,
        base: Option<&str>,
        previous: Option<Value>,
        version: Option<&str>,
        upgraded: bool,
    ) -> Value {
        let version = document::version_tag(doc).or(version);

        let discriminator = match (document::discriminator(doc), base) {
            (Some(discriminator), _) => discriminator,
            (None, Some(base)) if self.registry().contains(base) => base,
            (None, base) => {
                if let Some(base) = base {
                    self.ctx.warn(format!(
                        "Document has no type discriminator and {base} is not a registered type. Data stored in a CustomObject."
                    ));
                }
                return fallback::generic_object(self, doc, None, version);
            }
        };

        match self.ctx.resolver().resolve(discriminator, version, upgraded) {
            Ok(ResolvedType::Mutable(descriptor)) => {
                object_graph::build_object(self, doc, &descriptor, previous, version, upgraded)
            }
            Ok(ResolvedType::Immutable(descriptor)) => {
                immutable::construct_object(self, doc, &descriptor, version, upgraded)
            }
            Err(error @ SerializationError::TypeNotFound { .. }) => {
                self.deserialize_deprecated(doc, discriminator, &error, version, upgraded)
            }
            Err(error) => {
                self.report(EventLevel::Error, &error);
                fallback::generic_object(self, doc, Some(discriminator), version)
            }
        }
    }

    fn deserialize_deprecated(
        &self,
        doc: &Document,
        discriminator: &str,
        error: &SerializationError,
        version: Option<&str>,
        upgraded: bool,
    ) -> Value {
        if !upgraded {
            if let Some(value) = self.try_upgrade(doc, version) {
                return value;
            }
        }
        self.report(EventLevel::Error, error);
        fallback::generic_object(self, doc, Some(discriminator), version)
    }

    fn deserialize_any(&self, node: &Node, previous: Option<Value>, version: Option<&str>, upgraded: bool) -> Value {
        match node {
            Node::Null => Value::Null,
            Node::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
            Node::Scalar(Scalar::Int(i)) => Value::Int(*i),
            Node::Scalar(Scalar::Float(f)) => Value::Float(*f),
            Node::Scalar(Scalar::String(s)) => Value::String(s.clone()),
            Node::Scalar(Scalar::Binary(b)) => Value::Binary(b.clone()),
            Node::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.deserialize(item, &SemanticType::Any, None, version, upgraded))
                    .collect(),
            ),
            Node::Document(doc) if document::discriminator(doc).is_some() => {
                self.deserialize_object(doc, None, previous, version, upgraded)
            }
            Node::Document(_) => {
                let unwrapped = node.unwrap_collection();
                if std::ptr::eq(unwrapped, node) {
                    map::deserialize_map(self, node, &SemanticType::Any, previous, version, upgraded)
                } else {
                    self.deserialize(unwrapped, &SemanticType::Any, previous, version, upgraded)
                }
            }
        }
    }

    fn previous_or_default(&self, previous: Option<Value>, target: &SemanticType) -> Value {
        match previous {
            Some(value) if !value.is_null() || target.is_nullable() => value,
            _ => self.registry().default_value(target),
        }
    }
}
