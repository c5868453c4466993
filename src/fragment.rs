// Copyright 2025 Cowboy AI, LLC.

//! Fragment sets attached to host objects
//!
//! Fragments are capability objects addressed by their concrete type rather
//! than by name. Insertion is append-only and duplicates of one type are
//! allowed; lookups return the first fragment of the requested type.

use std::any::TypeId;
use std::fmt;

use crate::errors::{SerializationError, SerializationResult};
use crate::object::DomainObject;

/// Ordered collection of fragments belonging to one host object
#[derive(Default, Clone, PartialEq)]
pub struct FragmentSet {
    fragments: Vec<Box<dyn DomainObject>>,
}

impl FragmentSet {
    /// Create a new empty fragment set
    pub fn new() -> Self {
        Self {
            fragments: Vec::new(),
        }
    }

    /// Append a fragment
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not have the fragment capability
    pub fn add(&mut self, fragment: Box<dyn DomainObject>) -> SerializationResult<()> {
        if !fragment.is_fragment() {
            return Err(SerializationError::conversion(format!(
                "{} is not a fragment",
                fragment.type_name()
            )));
        }
        self.fragments.push(fragment);
        Ok(())
    }

    /// Append a typed fragment
    pub fn push<T: DomainObject>(&mut self, fragment: T) -> SerializationResult<()> {
        self.add(Box::new(fragment))
    }

    /// Replace the first fragment of the same concrete type, or append
    ///
    /// Returns the replaced fragment.
    pub fn add_or_replace(
        &mut self,
        fragment: Box<dyn DomainObject>,
    ) -> SerializationResult<Option<Box<dyn DomainObject>>> {
        let type_id = fragment.concrete_type_id();
        match self
            .fragments
            .iter()
            .position(|f| f.concrete_type_id() == type_id)
        {
            Some(index) if fragment.is_fragment() => {
                Ok(Some(std::mem::replace(&mut self.fragments[index], fragment)))
            }
            _ => self.add(fragment).map(|_| None),
        }
    }

    /// Get the first fragment of type `T`
    pub fn get<T: DomainObject>(&self) -> Option<&T> {
        self.fragments.iter().find_map(|f| f.downcast_ref::<T>())
    }

    /// Mutably get the first fragment of type `T`
    pub fn get_mut<T: DomainObject>(&mut self) -> Option<&mut T> {
        self.fragments
            .iter_mut()
            .find_map(|f| f.as_mut().downcast_mut::<T>())
    }

    /// Get the first fragment whose Rust type name ends with `name`
    pub fn get_by_type_name(&self, name: &str) -> Option<&dyn DomainObject> {
        self.fragments
            .iter()
            .find(|f| f.type_name() == name || f.type_name().ends_with(&format!("::{name}")))
            .map(|f| f.as_ref())
    }

    /// Remove the first fragment of type `T`
    pub fn remove<T: DomainObject>(&mut self) -> Option<Box<dyn DomainObject>> {
        let type_id = TypeId::of::<T>();
        self.fragments
            .iter()
            .position(|f| f.concrete_type_id() == type_id)
            .map(|index| self.fragments.remove(index))
    }

    /// Check if a fragment of type `T` exists
    pub fn contains<T: DomainObject>(&self) -> bool {
        self.get::<T>().is_some()
    }

    /// Iterate over all fragments in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &dyn DomainObject> {
        self.fragments.iter().map(|f| f.as_ref())
    }

    /// Get the number of fragments
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

impl fmt::Debug for FragmentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fragment_names: Vec<&str> = self.fragments.iter().map(|c| c.type_name()).collect();
        f.debug_struct("FragmentSet")
            .field("fragments", &fragment_names)
            .finish()
    }
}
