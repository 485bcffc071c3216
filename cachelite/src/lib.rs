// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CacheLite - A lightweight normalizing object cache with durable storage
//!
//! CacheLite transparently normalizes nested object graphs into flat,
//! keyed records, indexes them by the query that produced them, tracks
//! per-record dirty state, and synchronizes that state against an embedded
//! persistent store.
//!
//! # Features
//!
//! - **Graph normalization**: nested cacheable members and collections are
//!   decomposed into per-type archives and re-hydrated on read
//! - **Two lookup paths**: by query fingerprint (method + arguments) or by
//!   type and key
//! - **Dirty-state lifecycle**: unsaved / altered / deleted / saved, with a
//!   three-phase diff against the store on save
//! - **Embedded storage**: sled-backed durable store, or a memory store for
//!   tests and ephemeral caches
//!
//! # Usage
//!
//! ```ignore
//! use cachelite::{CacheConfig, CacheProvider};
//!
//! let provider = CacheProvider::open(&CacheConfig::new("./cache"))?;
//! provider.add("GetCustomer", &[&"Dries"], &customer)?;
//! let cached = provider.get_by_caller("Customer", "GetCustomer", &[&"Dries"])?;
//! provider.save_cache()?;
//! ```
//!
//! Types opt in by implementing [`Cacheable`] (a stable key, lifecycle
//! stamps, and a structural descriptor of their linked members); see the
//! trait documentation for the contract.

// Internal modules
pub(crate) mod cache;
pub(crate) mod model;
pub(crate) mod provider;
pub(crate) mod storage;

pub mod config;
pub mod error;

// Re-export the public API
pub use config::CacheConfig;
pub use error::CacheError;
pub use model::{
    CacheState, CacheStamp, Cacheable, CacheableType, DecodeFn, MemberAccessor, MemberDescriptor,
    TypeDescriptor, TypeRegistry,
};
pub use provider::{caller_fingerprint, CacheProvider};
pub use storage::persistent::{
    create_cache_store, CacheStore, MemoryStore, StoreBackend, StoreError, StoredEntry,
};

/// CacheLite version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// CacheLite crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
