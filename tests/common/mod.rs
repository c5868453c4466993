// Copyright 2025 Cowboy AI, LLC.

//! Shared structural model used by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use habitat_serialization::{
    domain_object, CustomData, Document, EnumDescriptor, EventLog, FragmentSet, FromValue, Grid, Parameter,
    SemanticType, SerializationContext, SerializationError, SerializationResult, TypeDescriptor,
    TypeRegistry, UpgradeEngine, Value,
};

/// Support condition of a structural node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Restraint {
    #[default]
    Free,
    Pinned,
    Fixed,
}

impl Restraint {
    pub const VARIANTS: [&'static str; 3] = ["Free", "Pinned", "Fixed"];

    fn name(self) -> &'static str {
        match self {
            Restraint::Free => "Free",
            Restraint::Pinned => "Pinned",
            Restraint::Fixed => "Fixed",
        }
    }

    fn from_value(value: Value) -> SerializationResult<Self> {
        match value {
            Value::Enum { variant, .. } => match variant.as_str() {
                "Free" => Ok(Restraint::Free),
                "Pinned" => Ok(Restraint::Pinned),
                "Fixed" => Ok(Restraint::Fixed),
                other => Err(SerializationError::conversion(format!("Unknown restraint {other}"))),
            },
            other => Err(SerializationError::conversion(format!(
                "Expected a Restraint and received {}",
                other.type_label()
            ))),
        }
    }
}

/// Immutable 3-D point
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}
domain_object!(Point);

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructuralNode {
    pub name: String,
    pub position: Point,
    pub support: Restraint,
    pub custom_data: CustomData,
}
domain_object!(StructuralNode, custom_data = custom_data);

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bar {
    pub name: String,
    pub length: f64,
    pub start: Option<StructuralNode>,
    pub end: Option<StructuralNode>,
    pub tags: Vec<String>,
    pub fragments: FragmentSet,
    pub custom_data: CustomData,
}
domain_object!(Bar, custom_data = custom_data);

/// Fragment labelling its host
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tag {
    pub label: String,
}
domain_object!(Tag, fragment);

/// Fragment assigning a material to its host
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Material {
    pub grade: String,
    pub density: f64,
}
domain_object!(Material, fragment);

/// Cross section sampled on a 2-D grid
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Section {
    pub name: String,
    pub samples: Grid<f64>,
}
domain_object!(Section);

pub fn registry() -> TypeRegistry {
    let registry = TypeRegistry::new();
    registry.register_enum(EnumDescriptor::new("Restraint", Restraint::VARIANTS));

    registry.register(
        TypeDescriptor::immutable::<Point, _>(
            "Geometry.Point",
            vec![
                Parameter::new("x", SemanticType::Float),
                Parameter::new("y", SemanticType::Float),
                Parameter::new("z", SemanticType::Float),
            ],
            |args: Vec<Value>| {
                let mut coords = args.into_iter().map(f64::from_value);
                let mut next = || coords.next().unwrap_or(Ok(0.0));
                Ok(Point {
                    x: next()?,
                    y: next()?,
                    z: next()?,
                })
            },
        )
        .read_only("X", SemanticType::Float, |p: &Point| Value::Float(p.x))
        .read_only("Y", SemanticType::Float, |p: &Point| Value::Float(p.y))
        .read_only("Z", SemanticType::Float, |p: &Point| Value::Float(p.z)),
    );

    registry.register(
        TypeDescriptor::mutable::<StructuralNode>("Structure.Node")
            .implements("IElement0D")
            .field(
                "Name",
                SemanticType::String,
                |n: &StructuralNode| &n.name,
                |n: &mut StructuralNode| &mut n.name,
            )
            .field(
                "Position",
                SemanticType::object("Geometry.Point"),
                |n: &StructuralNode| &n.position,
                |n: &mut StructuralNode| &mut n.position,
            )
            .property(
                "Support",
                SemanticType::enumeration("Restraint"),
                |n: &StructuralNode| Value::Enum {
                    type_name: "Restraint".to_string(),
                    variant: n.support.name().to_string(),
                },
                |n: &mut StructuralNode, value| {
                    n.support = Restraint::from_value(value)?;
                    Ok(())
                },
            ),
    );

    registry.register(
        TypeDescriptor::mutable::<Bar>("Structure.Bar")
            .implements("IElement1D")
            .field("Name", SemanticType::String, |b: &Bar| &b.name, |b: &mut Bar| &mut b.name)
            .field("Length", SemanticType::Float, |b: &Bar| &b.length, |b: &mut Bar| &mut b.length)
            .field(
                "Start",
                SemanticType::nullable(SemanticType::object("IElement0D")),
                |b: &Bar| &b.start,
                |b: &mut Bar| &mut b.start,
            )
            .field(
                "End",
                SemanticType::nullable(SemanticType::object("IElement0D")),
                |b: &Bar| &b.end,
                |b: &mut Bar| &mut b.end,
            )
            .field(
                "Tags",
                SemanticType::array(SemanticType::String),
                |b: &Bar| &b.tags,
                |b: &mut Bar| &mut b.tags,
            )
            .field(
                "Fragments",
                SemanticType::FragmentSet,
                |b: &Bar| &b.fragments,
                |b: &mut Bar| &mut b.fragments,
            ),
    );

    registry.register(
        TypeDescriptor::mutable::<Tag>("Meta.Tag").field(
            "Label",
            SemanticType::String,
            |t: &Tag| &t.label,
            |t: &mut Tag| &mut t.label,
        ),
    );

    registry.register(
        TypeDescriptor::mutable::<Material>("Physical.Material")
            .field("Grade", SemanticType::String, |m: &Material| &m.grade, |m: &mut Material| &mut m.grade)
            .field(
                "Density",
                SemanticType::Float,
                |m: &Material| &m.density,
                |m: &mut Material| &mut m.density,
            ),
    );

    registry.register(
        TypeDescriptor::mutable::<Section>("Spatial.Section")
            .field("Name", SemanticType::String, |s: &Section| &s.name, |s: &mut Section| &mut s.name)
            .field(
                "Samples",
                SemanticType::grid(SemanticType::Float),
                |s: &Section| &s.samples,
                |s: &mut Section| &mut s.samples,
            ),
    );

    registry
}

pub fn context(log: Arc<EventLog>, upgrader: Arc<dyn UpgradeEngine>) -> SerializationContext {
    SerializationContext::builder()
        .registry(Arc::new(registry()))
        .upgrader(upgrader)
        .sink(log)
        .build()
        .unwrap()
}

pub fn node(name: &str, x: f64, support: Restraint) -> StructuralNode {
    StructuralNode {
        name: name.to_string(),
        position: Point { x, y: 0.0, z: 0.0 },
        support,
        custom_data: CustomData::new(),
    }
}

/// Upgrade engine that counts how often it is consulted
#[derive(Default)]
pub struct CountingUpgrader {
    calls: AtomicUsize,
    echo: bool,
    replacement: Option<Document>,
}

impl CountingUpgrader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every upgrade request with `replacement`
    pub fn replying(replacement: Document) -> Self {
        Self {
            replacement: Some(replacement),
            ..Self::default()
        }
    }

    /// Answer every upgrade request with the document unchanged
    pub fn echoing() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl UpgradeEngine for CountingUpgrader {
    fn try_upgrade(&self, document: &Document, _version: Option<&str>) -> Option<Document> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.replacement {
            Some(replacement) => Some(replacement.clone()),
            None => self.echo.then(|| document.clone()),
        }
    }
}
