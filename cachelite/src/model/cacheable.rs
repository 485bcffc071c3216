// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! The cacheable capability
//!
//! Types that participate in the cache implement [`Cacheable`]: a stable
//! key, a stable type identifier, lifecycle stamps, and a structural
//! descriptor of their linked members. The descriptor replaces runtime
//! reflection: each type declares which of its members are themselves
//! cacheable, and how to read and write them through `dyn Cacheable`.

use crate::error::CacheError;
use crate::model::descriptor::TypeDescriptor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt::Debug;

/// The state of an object in the cache
///
/// Represents whether the object was persisted to the local store and what
/// the next save must do with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheState {
    /// Object was saved. All is well.
    Saved,
    /// Object has not yet been saved. Awaiting the next save.
    Unsaved,
    /// Object was altered after a save. Awaiting the next save.
    Altered,
    /// Object was deleted. Hidden from reads, awaiting durable removal.
    Deleted,
}

impl Default for CacheState {
    fn default() -> Self {
        CacheState::Unsaved
    }
}

/// Lifecycle fields every cacheable carries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStamp {
    /// When the object was last handed out by a `get`
    pub read_from_cache: Option<DateTime<Utc>>,

    /// When the object was last added to the cache
    pub added_to_cache: Option<DateTime<Utc>>,

    /// When the object was last written to the durable store
    pub persisted: Option<DateTime<Utc>>,

    /// Dirty state governing what the next save must do
    pub state: CacheState,
}

/// Objects that must be cached have to implement `Cacheable`.
///
/// The cache engine knows nothing about a type beyond this contract: it
/// stores values as `Box<dyn Cacheable>`, walks their linked members
/// through the descriptor, and round-trips them through the store with the
/// `encode` / descriptor-decode pair.
pub trait Cacheable: Any + Debug + Send + Sync {
    /// The unique identifier of this object within its type.
    ///
    /// Must be stable and non-empty; an empty key is a fatal precondition
    /// violation at the `add` call site.
    fn cache_key(&self) -> String;

    /// Stable type identifier; doubles as the archive name in memory and in
    /// the durable store, so it must not change between runs.
    fn type_name(&self) -> &'static str;

    /// Lifecycle stamp access
    fn stamp(&self) -> &CacheStamp;

    fn stamp_mut(&mut self) -> &mut CacheStamp;

    /// Structural description of this type's linked cacheable members plus
    /// its value codec. Implementations delegate to
    /// [`CacheableType::cache_descriptor`].
    fn descriptor(&self) -> TypeDescriptor;

    /// Serialize the full public state of this value for the durable store
    fn encode(&self) -> Result<Vec<u8>, CacheError>;

    /// Object-safe clone; entries own their value exclusively, so insertion
    /// clones the caller's instance.
    fn clone_boxed(&self) -> Box<dyn Cacheable>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// Static side of the cacheable capability.
///
/// Lets a type's descriptor be obtained without an instance, which is what
/// `CacheProvider::register_type` needs so a fresh process can decode a
/// persisted cache before anything was added.
pub trait CacheableType: Cacheable + Sized {
    fn cache_descriptor() -> TypeDescriptor;
}
