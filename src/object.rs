// Copyright 2025 Cowboy AI, LLC.

//! Domain object capability trait
//!
//! Every type the deserializer can reconstruct implements [`DomainObject`].
//! The trait is object safe so heterogeneous graphs can be held as
//! `Box<dyn DomainObject>`; capabilities (custom data bag, fragment) are
//! exposed as provided methods rather than through inheritance.

use std::any::{Any, TypeId};
use std::fmt;

use crate::value::CustomData;

/// Trait for objects that can be stored in and rebuilt from documents
///
/// Implementations are usually generated with [`domain_object!`](crate::domain_object).
///
/// # Example
///
/// ```
/// use habitat_serialization::{domain_object, CustomData, DomainObject};
///
/// #[derive(Debug, Clone, PartialEq, Default)]
/// struct Bar {
///     name: String,
///     custom_data: CustomData,
/// }
///
/// domain_object!(Bar, custom_data = custom_data);
///
/// let bar = Bar::default();
/// assert!(bar.custom_data().is_some());
/// assert!(!bar.is_fragment());
/// ```
pub trait DomainObject: Any + Send + Sync + fmt::Debug {
    /// Get the object as Any for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Get the object as mutable Any for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Convert the box into `Box<dyn Any>` to move the concrete value out
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Clone the object into a box
    fn clone_box(&self) -> Box<dyn DomainObject>;

    /// Compare with another object of any type
    fn eq_box(&self, other: &dyn DomainObject) -> bool;

    /// Rust type name of the object
    fn type_name(&self) -> &'static str;

    /// Custom data bag, for objects that carry one
    fn custom_data(&self) -> Option<&CustomData> {
        None
    }

    /// Mutable custom data bag, for objects that carry one
    fn custom_data_mut(&mut self) -> Option<&mut CustomData> {
        None
    }

    /// Whether the object can be attached to a host as a fragment
    fn is_fragment(&self) -> bool {
        false
    }
}

impl dyn DomainObject {
    /// [`TypeId`] of the concrete object
    pub fn concrete_type_id(&self) -> TypeId {
        self.as_any().type_id()
    }

    /// Check the concrete type
    pub fn is<T: DomainObject>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Borrow as a concrete type
    pub fn downcast_ref<T: DomainObject>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Mutably borrow as a concrete type
    pub fn downcast_mut<T: DomainObject>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

impl Clone for Box<dyn DomainObject> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl PartialEq for dyn DomainObject {
    fn eq(&self, other: &Self) -> bool {
        self.eq_box(other)
    }
}

/// Implement [`DomainObject`], [`IntoValue`](crate::IntoValue) and
/// [`FromValue`](crate::FromValue) for a `Clone + PartialEq + Debug` type
///
/// ```
/// use habitat_serialization::{domain_object, CustomData};
///
/// #[derive(Debug, Clone, PartialEq, Default)]
/// struct Point { x: f64, y: f64 }
/// domain_object!(Point);
///
/// #[derive(Debug, Clone, PartialEq, Default)]
/// struct Tag { label: String }
/// domain_object!(Tag, fragment);
///
/// #[derive(Debug, Clone, PartialEq, Default)]
/// struct Node { custom_data: CustomData }
/// domain_object!(Node, custom_data = custom_data);
/// ```
#[macro_export]
macro_rules! domain_object {
    (@common $ty:ty) => {
        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
            self
        }

        fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
            self
        }

        fn clone_box(&self) -> ::std::boxed::Box<dyn $crate::DomainObject> {
            ::std::boxed::Box::new(::std::clone::Clone::clone(self))
        }

        fn eq_box(&self, other: &dyn $crate::DomainObject) -> bool {
            other
                .as_any()
                .downcast_ref::<$ty>()
                .map_or(false, |other| self == other)
        }

        fn type_name(&self) -> &'static str {
            ::std::any::type_name::<$ty>()
        }
    };
    (@bag $field:ident) => {
        fn custom_data(&self) -> ::std::option::Option<&$crate::CustomData> {
            ::std::option::Option::Some(&self.$field)
        }

        fn custom_data_mut(&mut self) -> ::std::option::Option<&mut $crate::CustomData> {
            ::std::option::Option::Some(&mut self.$field)
        }
    };
    (@values $ty:ty) => {
        impl $crate::IntoValue for $ty {
            fn into_value(self) -> $crate::Value {
                $crate::Value::Object(::std::boxed::Box::new(self))
            }
        }

        impl $crate::FromValue for $ty {
            fn from_value(value: $crate::Value) -> $crate::SerializationResult<Self> {
                value.into_object::<$ty>()
            }
        }
    };
    ($ty:ty) => {
        impl $crate::DomainObject for $ty {
            $crate::domain_object!(@common $ty);
        }
        $crate::domain_object!(@values $ty);
    };
    ($ty:ty, custom_data = $field:ident) => {
        impl $crate::DomainObject for $ty {
            $crate::domain_object!(@common $ty);
            $crate::domain_object!(@bag $field);
        }
        $crate::domain_object!(@values $ty);
    };
    ($ty:ty, fragment) => {
        impl $crate::DomainObject for $ty {
            $crate::domain_object!(@common $ty);

            fn is_fragment(&self) -> bool {
                true
            }
        }
        $crate::domain_object!(@values $ty);
    };
    ($ty:ty, fragment, custom_data = $field:ident) => {
        impl $crate::DomainObject for $ty {
            $crate::domain_object!(@common $ty);
            $crate::domain_object!(@bag $field);

            fn is_fragment(&self) -> bool {
                true
            }
        }
        $crate::domain_object!(@values $ty);
    };
}

/// Discriminator under which [`CustomObject`] is registered
pub const CUSTOM_OBJECT_TYPE: &str = "CustomObject";

/// Generic untyped object
///
/// Returned in place of an object that could not be reconstructed
/// faithfully, and used for documents whose type is unknown. Every stored
/// field ends up in the custom data bag.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CustomObject {
    /// Discriminator of the document this object stands in for
    pub discriminator: Option<String>,
    /// Stored fields
    pub custom_data: CustomData,
}

impl CustomObject {
    /// Create an empty custom object standing in for `discriminator`
    pub fn new(discriminator: Option<String>) -> Self {
        Self {
            discriminator,
            custom_data: CustomData::new(),
        }
    }
}

crate::domain_object!(CustomObject, custom_data = custom_data);
