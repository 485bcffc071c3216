// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! The cache engine
//!
//! `CacheProvider` orchestrates the whole cache: it decomposes object
//! graphs into normalized entries on `add`, re-hydrates them on `get`,
//! manages the altered/deleted state transitions, and drives save and load
//! against the durable store.

use crate::cache::{CacheArchive, CacheContainer};
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::model::{CacheState, Cacheable, CacheableType, MemberAccessor, TypeRegistry};
use crate::provider::fingerprint::caller_fingerprint;
use crate::storage::persistent::CacheStore;
use crate::storage::CachePersistor;
use chrono::Utc;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;

/// Visited-set key during decomposition and re-hydration
type NodeId = (String, String);

/// Type-indexed, normalizing object cache with durable synchronization
pub struct CacheProvider {
    container: CacheContainer,
    registry: TypeRegistry,
    persistor: CachePersistor,
}

impl CacheProvider {
    /// Open a provider against the configured store.
    ///
    /// Failure to open or create the store is fatal;
    /// [`reinstall_data_store`](Self::reinstall_data_store) is the recovery
    /// path for a store that can no longer be opened cleanly.
    pub fn open(config: &CacheConfig) -> Result<Self, CacheError> {
        Ok(Self {
            container: CacheContainer::new(),
            registry: TypeRegistry::new(),
            persistor: CachePersistor::open(config)?,
        })
    }

    /// Open a provider with the default backend at the given path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        Self::open(&CacheConfig::new(path))
    }

    /// Wrap an already-opened store
    pub fn with_store(store: Arc<dyn CacheStore>) -> Self {
        Self {
            container: CacheContainer::new(),
            registry: TypeRegistry::new(),
            persistor: CachePersistor::with_store(store),
        }
    }

    /// Register a cacheable type so persisted archives of it can be decoded
    /// before any instance was added in this process
    pub fn register_type<T: CacheableType>(&self) {
        self.registry.register::<T>();
    }

    /// Add an object graph to the cache.
    ///
    /// `method` and `arguments` identify the query that produced the graph;
    /// the root becomes reachable through that fingerprint. The graph is
    /// decomposed recursively: every linked cacheable member and every
    /// element of every linked collection gets its own entry in its own
    /// type's archive, reachable by key. The cache stores clones - the
    /// caller keeps ownership of the passed graph.
    pub fn add(
        &self,
        method: &str,
        arguments: &[&dyn Display],
        value: &dyn Cacheable,
    ) -> Result<(), CacheError> {
        let caller = caller_fingerprint(method, arguments);
        debug!(
            "Adding '{}' ({}) for caller '{}'",
            value.cache_key(),
            value.type_name(),
            caller
        );
        let mut visited = HashSet::new();
        self.add_graph(&caller, value, true, &mut visited)
    }

    /// Add several object graphs under the same query fingerprint,
    /// decomposing each element independently in sequence order
    pub fn add_all(
        &self,
        method: &str,
        arguments: &[&dyn Display],
        values: &[&dyn Cacheable],
    ) -> Result<(), CacheError> {
        for value in values {
            self.add(method, arguments, *value)?;
        }
        Ok(())
    }

    fn add_graph(
        &self,
        caller: &str,
        value: &dyn Cacheable,
        is_root: bool,
        visited: &mut HashSet<NodeId>,
    ) -> Result<(), CacheError> {
        let node = (value.type_name().to_string(), value.cache_key());
        if !visited.insert(node) {
            // Already being decomposed higher up this call; the link to it
            // is recorded by whoever holds it, so walking it again would
            // only recurse forever on cyclic graphs.
            return Ok(());
        }

        // The stored instance is a clone of the caller's, stamped as fresh.
        // On a repeated add of an existing key this clone replaces the old
        // value wholesale, stamp included.
        let mut snapshot = value.clone_boxed();
        {
            let stamp = snapshot.stamp_mut();
            stamp.state = CacheState::Unsaved;
            stamp.added_to_cache = Some(Utc::now());
        }

        let descriptor = self.registry.describe(value);
        let mut linked_entries: HashMap<String, String> = HashMap::new();
        let mut linked_collections: HashMap<String, Vec<String>> = HashMap::new();

        for member in &descriptor.members {
            match &member.accessor {
                MemberAccessor::Single { get, .. } => {
                    if let Some(child) = get(value) {
                        self.add_graph(caller, child.as_ref(), false, visited)?;
                        linked_entries.insert(child.type_name().to_string(), child.cache_key());
                    }
                }
                MemberAccessor::Collection { get, .. } => {
                    let children = match get(value) {
                        Some(children) if !children.is_empty() => children,
                        _ => continue,
                    };
                    // Collections are homogeneous; the element type is
                    // taken from the first element.
                    let element_type = children[0].type_name().to_string();
                    let mut keys = Vec::with_capacity(children.len());
                    for child in &children {
                        self.add_graph(caller, child.as_ref(), false, visited)?;
                        keys.push(child.cache_key());
                    }
                    linked_collections.insert(element_type, keys);
                }
            }
        }

        let archive = self.container.archive_for(value.type_name())?;
        archive.add_or_update(snapshot, caller, linked_entries, linked_collections, is_root)
    }

    /// Get all instances linked to a query fingerprint.
    ///
    /// Returns `None` when no archive for the type was ever created, as
    /// opposed to `Some` with an empty vector when the type is cached but
    /// nothing matches. Matched entries are re-hydrated in place - linked
    /// singles and linked collections are spliced back from their own
    /// archives - and handed out as clones, minus anything soft-deleted.
    pub fn get_by_caller(
        &self,
        type_name: &str,
        method: &str,
        arguments: &[&dyn Display],
    ) -> Result<Option<Vec<Box<dyn Cacheable>>>, CacheError> {
        let caller = caller_fingerprint(method, arguments);
        let archive = match self.container.get(type_name)? {
            Some(archive) => archive,
            None => return Ok(None),
        };

        let keys = archive.select_by_caller(&caller)?;
        debug!(
            "Caller '{}' selects {} entries in archive '{}'",
            caller,
            keys.len(),
            type_name
        );

        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            let mut visited = HashSet::new();
            if let Some(value) = self.hydrate_entry(&archive, &key, true, &mut visited)? {
                if value.stamp().state != CacheState::Deleted {
                    results.push(value);
                }
            }
        }
        Ok(Some(results))
    }

    /// Get the instance of a type with a given key.
    ///
    /// Same absent/empty distinction as
    /// [`get_by_caller`](Self::get_by_caller). Re-hydration here covers
    /// linked singles only, not linked collections; callers that rely on
    /// collection re-hydration use the fingerprint-based lookup.
    pub fn get_by_key(
        &self,
        type_name: &str,
        key: &str,
    ) -> Result<Option<Vec<Box<dyn Cacheable>>>, CacheError> {
        let archive = match self.container.get(type_name)? {
            Some(archive) => archive,
            None => return Ok(None),
        };

        let mut results = Vec::new();
        let mut visited = HashSet::new();
        if let Some(value) = self.hydrate_entry(&archive, key, false, &mut visited)? {
            if value.stamp().state != CacheState::Deleted {
                results.push(value);
            }
        }
        Ok(Some(results))
    }

    /// Stamp an entry as read, splice its links back in place, and clone it
    /// out. Locks are released while children are resolved, so link chains
    /// crossing back into the same archive cannot deadlock; the visited set
    /// terminates cyclic chains by returning a revisited entry as stored.
    fn hydrate_entry(
        &self,
        archive: &Arc<CacheArchive>,
        key: &str,
        include_collections: bool,
        visited: &mut HashSet<NodeId>,
    ) -> Result<Option<Box<dyn Cacheable>>, CacheError> {
        let links = archive.with_entry(key, |entry| {
            (entry.linked_entries.clone(), entry.linked_collections.clone())
        })?;
        let (linked_entries, linked_collections) = match links {
            Some(links) => links,
            None => return Ok(None),
        };

        if !visited.insert((archive.name().to_string(), key.to_string())) {
            return archive.with_entry_mut(key, |entry| {
                entry.value.stamp_mut().read_from_cache = Some(Utc::now());
                entry.value.clone_boxed()
            });
        }

        // Resolve linked singles from their own archives
        let mut single_children: HashMap<String, Box<dyn Cacheable>> = HashMap::new();
        for (child_type, child_key) in &linked_entries {
            if let Some(child_archive) = self.container.get(child_type)? {
                if let Some(child) =
                    self.hydrate_entry(&child_archive, child_key, false, visited)?
                {
                    single_children.insert(child_type.clone(), child);
                }
            }
        }

        // Rebuild linked collections in stored key order
        let mut collection_children: HashMap<String, Vec<Box<dyn Cacheable>>> = HashMap::new();
        if include_collections {
            for (child_type, child_keys) in &linked_collections {
                let child_archive = match self.container.get(child_type)? {
                    Some(child_archive) => child_archive,
                    None => continue,
                };
                let mut rebuilt = Vec::with_capacity(child_keys.len());
                for child_key in child_keys {
                    if let Some(mut child) =
                        self.hydrate_entry(&child_archive, child_key, false, visited)?
                    {
                        child.stamp_mut().read_from_cache = Some(Utc::now());
                        rebuilt.push(child);
                    }
                }
                collection_children.insert(child_type.clone(), rebuilt);
            }
        }

        let registry = &self.registry;
        archive.with_entry_mut(key, |entry| {
            entry.value.stamp_mut().read_from_cache = Some(Utc::now());

            let descriptor = registry.describe(entry.value.as_ref());
            for member in &descriptor.members {
                match &member.accessor {
                    MemberAccessor::Single { set, .. } => {
                        if let Some(child) = single_children.remove(member.child_type) {
                            set(entry.value.as_mut(), child);
                        }
                    }
                    MemberAccessor::Collection { set, .. } => {
                        if let Some(children) = collection_children.remove(member.child_type) {
                            set(entry.value.as_mut(), children);
                        }
                    }
                }
            }
            entry.value.clone_boxed()
        })
    }

    /// Mark a cached record as altered, taking over the caller's edits.
    ///
    /// Returns the number of records marked. A record that was never added
    /// is not implicitly added (0); a record that was never saved is not
    /// yet "altered" relative to a persisted baseline (0); otherwise the
    /// stored value is replaced with a clone of `value` and the record
    /// moves to `Altered` (1), so the next save persists the edits.
    pub fn update(&self, value: &dyn Cacheable) -> Result<usize, CacheError> {
        match self.container.get(value.type_name())? {
            Some(archive) => {
                let marked = archive.mark_altered(&value.cache_key(), value.clone_boxed())?;
                debug!(
                    "Update of '{}' ({}) marked {} record(s)",
                    value.cache_key(),
                    value.type_name(),
                    marked
                );
                Ok(marked)
            }
            None => Ok(0),
        }
    }

    /// Soft-delete a cached record.
    ///
    /// The record disappears from `get` results immediately but stays in
    /// memory until the next save physically removes it from both memory
    /// and store. Returns the number of records marked.
    pub fn delete(&self, value: &dyn Cacheable) -> Result<usize, CacheError> {
        match self.container.get(value.type_name())? {
            Some(archive) => {
                let marked = archive.mark_deleted(&value.cache_key())?;
                debug!(
                    "Delete of '{}' ({}) marked {} record(s)",
                    value.cache_key(),
                    value.type_name(),
                    marked
                );
                Ok(marked)
            }
            None => Ok(0),
        }
    }

    /// Save the current in-memory cache to the durable store.
    ///
    /// Not safe to run concurrently with `add`/`update`/`delete` calls
    /// touching the same entries; the caller enforces exclusive access.
    pub fn save_cache(&self) -> Result<(), CacheError> {
        self.persistor.save_cache(&self.container)
    }

    /// Clear the cache in memory and delete all cache rows in the store
    pub fn clear_cache(&self) -> Result<(), CacheError> {
        self.container.clear()?;
        self.persistor.empty_database()
    }

    /// Clear the cache in memory only.
    ///
    /// All archives are dropped; once handed-out references are gone the
    /// entries are freed.
    pub fn clear_cache_in_memory(&self) -> Result<(), CacheError> {
        self.container.clear()
    }

    /// Discard the in-memory cache and reload it from the durable store.
    ///
    /// Every persisted archive's type must be known to the registry -
    /// either seen by an earlier `add` in this process or registered
    /// through [`register_type`](Self::register_type).
    pub fn load_cache_from_database(&self) -> Result<(), CacheError> {
        self.container.clear()?;
        let archives = self.persistor.load_archives_from_database()?;
        self.persistor
            .load_entries_from_database(&archives, &self.registry)?;
        self.container.install(archives)
    }

    /// Delete the durable store and recreate it from scratch
    pub fn reinstall_data_store(&self) -> Result<(), CacheError> {
        self.persistor.reinstall()
    }

    /// Names of all archives currently in memory
    pub fn archive_names(&self) -> Result<Vec<String>, CacheError> {
        self.container.archive_names()
    }

    /// Number of entries held for a type; 0 when the type was never cached
    pub fn entry_count(&self, type_name: &str) -> Result<usize, CacheError> {
        match self.container.get(type_name)? {
            Some(archive) => archive.entry_count(),
            None => Ok(0),
        }
    }
}
