// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Store contract
//!
//! The cache persistor talks to durable storage exclusively through
//! [`CacheStore`]. Backends translate the cache's row model - an archive
//! registry, opaque value blobs per (archive, key), and caller/link rows -
//! onto whatever storage technology they wrap.

use super::types::StoreResult;
use std::collections::{HashMap, HashSet};

/// One durable row, as handed back by [`CacheStore::load_entries`]
///
/// Holds key-based links only; live nested references are reconstructed
/// lazily by the cache engine, never by the store.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub key: String,
    pub value: Vec<u8>,
    pub callers: HashSet<String>,
    pub linked_singles: HashMap<String, String>,
    pub linked_collections: HashMap<String, Vec<String>>,
}

/// Contract between the cache and its durable store
///
/// `replace_*` methods overwrite whatever was stored for the (archive, key)
/// pair; an empty set removes the row entirely. `flush` is the durability
/// boundary - the persistor calls it once per archive, mirroring a
/// transaction-per-archive model: a crash between archives can leave some
/// types synchronized and others not.
pub trait CacheStore: Send + Sync {
    /// Make sure the archive's type identifier exists as a registry row
    fn ensure_archive_registered(&self, type_name: &str) -> StoreResult<()>;

    /// Insert or overwrite the value blob for an entry
    fn upsert_entry(&self, archive: &str, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Remove an entry's value blob
    fn delete_entry(&self, archive: &str, key: &str) -> StoreResult<()>;

    /// Overwrite the caller set for an entry; empty removes the row
    fn replace_callers(
        &self,
        archive: &str,
        key: &str,
        callers: &HashSet<String>,
    ) -> StoreResult<()>;

    /// Overwrite the linked-single mapping for an entry; empty removes the row
    fn replace_linked_singles(
        &self,
        archive: &str,
        key: &str,
        links: &HashMap<String, String>,
    ) -> StoreResult<()>;

    /// Overwrite the linked-collection mapping for an entry; empty removes
    /// the row
    fn replace_linked_collections(
        &self,
        archive: &str,
        key: &str,
        links: &HashMap<String, Vec<String>>,
    ) -> StoreResult<()>;

    /// All registered archive names
    fn load_all_archives(&self) -> StoreResult<Vec<String>>;

    /// All rows of one archive
    fn load_entries(&self, archive: &str) -> StoreResult<Vec<StoredEntry>>;

    /// Remove every row from every table; the store stays usable
    fn erase_everything(&self) -> StoreResult<()>;

    /// Delete and recreate the store from scratch.
    ///
    /// Recovery path for an unusable store: not a retry of the same
    /// connection but a teardown of the underlying files.
    fn reinstall(&self) -> StoreResult<()>;

    /// Flush pending writes; the per-archive durability point
    fn flush(&self) -> StoreResult<()>;
}
