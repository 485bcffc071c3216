// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Type descriptors and the descriptor cache
//!
//! A [`TypeDescriptor`] is the structural description of one cacheable
//! type: which of its members link to other cacheables (single values or
//! homogeneous collections), how to read and write those members through
//! `dyn Cacheable`, and how to decode a persisted value blob back into the
//! concrete type.
//!
//! [`TypeRegistry`] memoizes descriptors per type name: the first call for
//! a type stores the computed descriptor, subsequent calls return the
//! stored one without recomputation. Concurrent first calls may race and
//! compute twice; results are semantically identical, so this is wasted
//! work rather than a correctness hazard.

use crate::error::CacheError;
use crate::model::cacheable::{Cacheable, CacheableType};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Decoder from a persisted value blob back to a boxed cacheable
pub type DecodeFn = fn(&[u8]) -> Result<Box<dyn Cacheable>, CacheError>;

/// Accessor pair for one linked member of a cacheable type
///
/// Getters clone the child out of the parent (entries own their values
/// exclusively); setters splice a re-hydrated child back in. A getter
/// returns `None` when the member is absent: an unset single, or an empty
/// collection, neither of which is recorded as a link.
pub enum MemberAccessor {
    Single {
        get: fn(&dyn Cacheable) -> Option<Box<dyn Cacheable>>,
        set: fn(&mut dyn Cacheable, Box<dyn Cacheable>),
    },
    Collection {
        get: fn(&dyn Cacheable) -> Option<Vec<Box<dyn Cacheable>>>,
        set: fn(&mut dyn Cacheable, Vec<Box<dyn Cacheable>>),
    },
}

/// One linked cacheable member of a type
pub struct MemberDescriptor {
    /// Member name, for diagnostics
    pub name: &'static str,

    /// Type name of the linked cacheable (the element type for
    /// collections); matches re-hydrated children back to members
    pub child_type: &'static str,

    pub accessor: MemberAccessor,
}

/// Structural description of one cacheable type
pub struct TypeDescriptor {
    /// Stable type identifier; must equal what instances report through
    /// `Cacheable::type_name`
    pub type_name: &'static str,

    /// Linked cacheable members, in declaration order
    pub members: Vec<MemberDescriptor>,

    /// Value codec for the load path
    pub decode: DecodeFn,
}

/// Memoizing registry of type descriptors
///
/// Read-through: `describe` computes a descriptor at most once per type and
/// serves the stored one afterwards. `register` seeds the registry without
/// an instance so persisted archives can be decoded in a fresh process.
pub struct TypeRegistry {
    descriptors: RwLock<HashMap<&'static str, Arc<TypeDescriptor>>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            descriptors: RwLock::new(HashMap::new()),
        }
    }

    /// Get the descriptor for a value's type, computing and storing it on
    /// first sight.
    pub fn describe(&self, value: &dyn Cacheable) -> Arc<TypeDescriptor> {
        if let Some(found) = self.descriptors.read().get(value.type_name()) {
            return found.clone();
        }

        // Racing first calls both compute; the first insert wins and the
        // loser's result is dropped.
        let computed = Arc::new(value.descriptor());
        self.descriptors
            .write()
            .entry(value.type_name())
            .or_insert(computed)
            .clone()
    }

    /// Register a type's descriptor without an instance
    pub fn register<T: CacheableType>(&self) {
        let descriptor = Arc::new(T::cache_descriptor());
        self.descriptors
            .write()
            .entry(descriptor.type_name)
            .or_insert(descriptor);
    }

    /// Look up the decoder for a persisted archive's type
    pub fn decoder(&self, type_name: &str) -> Result<DecodeFn, CacheError> {
        self.descriptors
            .read()
            .get(type_name)
            .map(|descriptor| descriptor.decode)
            .ok_or_else(|| CacheError::UnknownType(type_name.to_string()))
    }

    /// Whether a descriptor is known for the given type name
    pub fn is_registered(&self, type_name: &str) -> bool {
        self.descriptors.read().contains_key(type_name)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
