// Copyright 2025 Cowboy AI, LLC.

//! Registration-time type descriptors
//!
//! A [`TypeDescriptor`] is built once per type when the catalog is
//! populated. It holds the property accessor table (typed getter and setter
//! closures keyed by property name), so reconciling a stored field against a
//! declared property is a map lookup plus a closure call.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::{SerializationError, SerializationResult};
use crate::object::DomainObject;
use crate::registry::SemanticType;
use crate::value::{FromValue, IntoValue, Value};

type Getter = Arc<dyn Fn(&dyn DomainObject) -> SerializationResult<Value> + Send + Sync>;
type Setter = Arc<dyn Fn(&mut dyn DomainObject, Value) -> SerializationResult<()> + Send + Sync>;
type Factory = Arc<dyn Fn() -> Box<dyn DomainObject> + Send + Sync>;
type Constructor =
    Arc<dyn Fn(Vec<Value>) -> SerializationResult<Box<dyn DomainObject>> + Send + Sync>;

fn downcast<'o, T: DomainObject>(
    object: &'o dyn DomainObject,
    type_name: &str,
) -> SerializationResult<&'o T> {
    object.downcast_ref::<T>().ok_or_else(|| {
        SerializationError::conversion(format!(
            "accessor of {type_name} applied to {}",
            object.type_name()
        ))
    })
}

fn downcast_mut<'o, T: DomainObject>(
    object: &'o mut dyn DomainObject,
    type_name: &str,
) -> SerializationResult<&'o mut T> {
    let found = object.type_name();
    object.downcast_mut::<T>().ok_or_else(|| {
        SerializationError::conversion(format!("accessor of {type_name} applied to {found}"))
    })
}

/// A declared property of a registered type
#[derive(Clone)]
pub struct PropertyDescriptor {
    name: String,
    semantic_type: SemanticType,
    getter: Option<Getter>,
    setter: Option<Setter>,
}

impl PropertyDescriptor {
    /// Property name as stored in documents
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type
    pub fn semantic_type(&self) -> &SemanticType {
        &self.semantic_type
    }

    /// Whether the property has a getter
    pub fn is_readable(&self) -> bool {
        self.getter.is_some()
    }

    /// Whether the property has a setter
    pub fn is_settable(&self) -> bool {
        self.setter.is_some()
    }

    /// Read the property from `object`
    pub fn get(&self, object: &dyn DomainObject) -> SerializationResult<Value> {
        match &self.getter {
            Some(getter) => getter(object),
            None => Err(SerializationError::conversion(format!(
                "property {} is not readable",
                self.name
            ))),
        }
    }

    /// Write the property on `object`
    pub fn set(&self, object: &mut dyn DomainObject, value: Value) -> SerializationResult<()> {
        match &self.setter {
            Some(setter) => setter(object, value),
            None => Err(SerializationError::PropertyNotSettable {
                property: self.name.clone(),
                type_name: object.type_name().to_string(),
            }),
        }
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("semantic_type", &self.semantic_type)
            .field("readable", &self.is_readable())
            .field("settable", &self.is_settable())
            .finish()
    }
}

/// A constructor parameter of an immutable type
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter name, matched case-insensitively against stored fields
    pub name: String,
    /// Parameter type
    pub semantic_type: SemanticType,
}

impl Parameter {
    /// Create a parameter
    pub fn new(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic_type,
        }
    }
}

/// How instances of a type come into existence
#[derive(Clone)]
pub enum Construction {
    /// Default instance populated property by property
    Mutable(Factory),
    /// All-args constructor
    Immutable {
        /// Constructor parameters in call order
        parameters: Vec<Parameter>,
        /// The constructor
        constructor: Constructor,
    },
}

/// Runtime description of a registered type
#[derive(Clone)]
pub struct TypeDescriptor {
    name: String,
    type_id: TypeId,
    rust_type_name: &'static str,
    implements: Vec<String>,
    properties: Vec<PropertyDescriptor>,
    index: HashMap<String, usize>,
    construction: Construction,
}

impl TypeDescriptor {
    fn with_construction<T: DomainObject>(name: impl Into<String>, construction: Construction) -> Self {
        Self {
            name: name.into(),
            type_id: TypeId::of::<T>(),
            rust_type_name: std::any::type_name::<T>(),
            implements: Vec::new(),
            properties: Vec::new(),
            index: HashMap::new(),
            construction,
        }
    }

    /// Describe a mutable type built from `T::default()`
    pub fn mutable<T: DomainObject + Default>(name: impl Into<String>) -> Self {
        Self::mutable_with(name, T::default)
    }

    /// Describe a mutable type built from `factory`
    pub fn mutable_with<T, F>(name: impl Into<String>, factory: F) -> Self
    where
        T: DomainObject,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::with_construction::<T>(
            name,
            Construction::Mutable(Arc::new(move || Box::new(factory()) as Box<dyn DomainObject>)),
        )
    }

    /// Describe an immutable type built through an all-args constructor
    pub fn immutable<T, F>(name: impl Into<String>, parameters: Vec<Parameter>, constructor: F) -> Self
    where
        T: DomainObject,
        F: Fn(Vec<Value>) -> SerializationResult<T> + Send + Sync + 'static,
    {
        Self::with_construction::<T>(
            name,
            Construction::Immutable {
                parameters,
                constructor: Arc::new(move |args: Vec<Value>| {
                    constructor(args).map(|obj| Box::new(obj) as Box<dyn DomainObject>)
                }),
            },
        )
    }

    /// Declare a base type or capability this type is assignable to
    pub fn implements(mut self, base: impl Into<String>) -> Self {
        self.implements.push(base.into());
        self
    }

    fn push_property(mut self, property: PropertyDescriptor) -> Self {
        match self.index.get(&property.name) {
            Some(&existing) => self.properties[existing] = property,
            None => {
                self.index
                    .insert(property.name.clone(), self.properties.len());
                self.properties.push(property);
            }
        }
        self
    }

    /// Declare a read/write property backed by a struct field
    pub fn field<T, F, G, M>(self, name: impl Into<String>, semantic_type: SemanticType, get: G, get_mut: M) -> Self
    where
        T: DomainObject,
        F: IntoValue + FromValue + Clone + 'static,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        let type_name = self.name.clone();
        let setter_type_name = self.name.clone();
        self.push_property(PropertyDescriptor {
            name: name.into(),
            semantic_type,
            getter: Some(Arc::new(move |object: &dyn DomainObject| {
                let object = downcast::<T>(object, &type_name)?;
                Ok(get(object).clone().into_value())
            })),
            setter: Some(Arc::new(move |object: &mut dyn DomainObject, value: Value| {
                let object = downcast_mut::<T>(object, &setter_type_name)?;
                *get_mut(object) = F::from_value(value)?;
                Ok(())
            })),
        })
    }

    /// Declare a read/write property with explicit accessors
    pub fn property<T, G, S>(self, name: impl Into<String>, semantic_type: SemanticType, get: G, set: S) -> Self
    where
        T: DomainObject,
        G: Fn(&T) -> Value + Send + Sync + 'static,
        S: Fn(&mut T, Value) -> SerializationResult<()> + Send + Sync + 'static,
    {
        let type_name = self.name.clone();
        let setter_type_name = self.name.clone();
        self.push_property(PropertyDescriptor {
            name: name.into(),
            semantic_type,
            getter: Some(Arc::new(move |object: &dyn DomainObject| {
                downcast::<T>(object, &type_name).map(&get)
            })),
            setter: Some(Arc::new(move |object: &mut dyn DomainObject, value: Value| {
                set(downcast_mut::<T>(object, &setter_type_name)?, value)
            })),
        })
    }

    /// Declare a computed or otherwise non-settable property
    pub fn read_only<T, G>(self, name: impl Into<String>, semantic_type: SemanticType, get: G) -> Self
    where
        T: DomainObject,
        G: Fn(&T) -> Value + Send + Sync + 'static,
    {
        let type_name = self.name.clone();
        self.push_property(PropertyDescriptor {
            name: name.into(),
            semantic_type,
            getter: Some(Arc::new(move |object: &dyn DomainObject| {
                downcast::<T>(object, &type_name).map(&get)
            })),
            setter: None,
        })
    }

    /// Discriminator
    pub fn name(&self) -> &str {
        &self.name
    }

    /// [`TypeId`] of the Rust type
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Rust type name
    pub fn rust_type_name(&self) -> &'static str {
        self.rust_type_name
    }

    /// Declared base types and capabilities
    pub fn bases(&self) -> &[String] {
        &self.implements
    }

    /// Whether values of this type can be assigned to `base`
    pub fn is_assignable_to(&self, base: &str) -> bool {
        self.name == base || self.implements.iter().any(|b| b == base)
    }

    /// Declared properties in declaration order
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Look up a declared property by exact name
    pub fn property_named(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.index.get(name).map(|&i| &self.properties[i])
    }

    /// Whether instances are built through a constructor
    pub fn is_immutable(&self) -> bool {
        matches!(self.construction, Construction::Immutable { .. })
    }

    /// Constructor parameters (empty for mutable types)
    pub fn parameters(&self) -> &[Parameter] {
        match &self.construction {
            Construction::Immutable { parameters, .. } => parameters,
            Construction::Mutable(_) => &[],
        }
    }

    /// Create a default instance of a mutable type
    ///
    /// # Errors
    ///
    /// Immutable types have no default instance
    pub fn instantiate(&self) -> SerializationResult<Box<dyn DomainObject>> {
        match &self.construction {
            Construction::Mutable(factory) => Ok(factory()),
            Construction::Immutable { .. } => Err(SerializationError::conversion(format!(
                "{} is immutable and has no default instance",
                self.name
            ))),
        }
    }

    /// Build an immutable instance from constructor arguments
    ///
    /// # Errors
    ///
    /// Returns an error for mutable types, for a wrong argument count, or
    /// when the constructor rejects an argument
    pub fn construct(&self, args: Vec<Value>) -> SerializationResult<Box<dyn DomainObject>> {
        match &self.construction {
            Construction::Immutable {
                parameters,
                constructor,
            } => {
                if args.len() != parameters.len() {
                    return Err(SerializationError::conversion(format!(
                        "{} expects {} constructor arguments, got {}",
                        self.name,
                        parameters.len(),
                        args.len()
                    )));
                }
                constructor(args)
            }
            Construction::Mutable(_) => Err(SerializationError::conversion(format!(
                "{} is mutable and has no constructor",
                self.name
            ))),
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("rust_type", &self.rust_type_name)
            .field("implements", &self.implements)
            .field("properties", &self.properties)
            .field("immutable", &self.is_immutable())
            .finish()
    }
}

/// A registered enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    name: String,
    variants: Vec<String>,
}

impl EnumDescriptor {
    /// Create an enum descriptor; variant order defines ordinals
    pub fn new<I, S>(name: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    /// Enum name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Variants in ordinal order
    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    /// Canonical variant matching `name` case-insensitively
    pub fn variant_named(&self, name: &str) -> Option<&str> {
        self.variants
            .iter()
            .find(|v| v.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    /// Variant at `ordinal`
    pub fn variant_at(&self, ordinal: i64) -> Option<&str> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|i| self.variants.get(i))
            .map(String::as_str)
    }

    /// Value of the variant matching `name` case-insensitively
    pub fn value_of(&self, name: &str) -> Option<Value> {
        self.variant_named(name).map(|variant| Value::Enum {
            type_name: self.name.clone(),
            variant: variant.to_string(),
        })
    }
}
