// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Per-type partition of the cache
//!
//! A `CacheArchive` owns exactly the entries for one concrete type, keyed
//! by entry key. Keying the map by the key makes the "at most one entry per
//! key" invariant structural, and `add_or_update` is an atomic upsert under
//! the write lock, so the find-then-insert race of a scan-based archive
//! cannot occur.

use crate::cache::entry::CacheEntry;
use crate::error::CacheError;
use crate::model::{CacheStamp, CacheState, Cacheable};
use log::debug;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// The unordered collection of cache entries for one concrete type
#[derive(Debug)]
pub struct CacheArchive {
    name: String,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl CacheArchive {
    pub fn new(name: String) -> Self {
        Self {
            name,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The stable type identifier this archive holds entries for
    pub fn name(&self) -> &str {
        &self.name
    }

    fn read_guard(&self) -> Result<RwLockReadGuard<'_, HashMap<String, CacheEntry>>, CacheError> {
        self.entries
            .read()
            .map_err(|e| CacheError::Lock(format!("failed to acquire read lock: {}", e)))
    }

    fn write_guard(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, CacheEntry>>, CacheError> {
        self.entries
            .write()
            .map_err(|e| CacheError::Lock(format!("failed to acquire write lock: {}", e)))
    }

    /// Insert a new entry for the value's key, or update the existing one.
    ///
    /// For an existing key the fingerprint is appended to the caller set
    /// (roots only) and the value is replaced wholesale (last write wins),
    /// and the recorded links stay as they were written at creation. For a
    /// new key the caller set is seeded only for roots: nested objects are
    /// addressable by key, never directly by the fingerprint that reached
    /// them.
    pub fn add_or_update(
        &self,
        value: Box<dyn Cacheable>,
        caller: &str,
        linked_entries: HashMap<String, String>,
        linked_collections: HashMap<String, Vec<String>>,
        is_root: bool,
    ) -> Result<(), CacheError> {
        let key = value.cache_key();
        if key.is_empty() {
            return Err(CacheError::EmptyCacheKey(value.type_name().to_string()));
        }

        let mut entries = self.write_guard()?;
        match entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if is_root {
                    entry.callers.insert(caller.to_string());
                }
                entry.value = value;
            }
            Entry::Vacant(vacant) => {
                let mut callers = HashSet::new();
                if is_root {
                    callers.insert(caller.to_string());
                }
                let key = vacant.key().clone();
                debug!("Creating entry '{}' in archive '{}'", key, self.name);
                vacant.insert(CacheEntry::new(
                    key,
                    value,
                    callers,
                    linked_entries,
                    linked_collections,
                ));
            }
        }
        Ok(())
    }

    /// Insert an entry rebuilt from durable storage.
    ///
    /// Two durable rows sharing a key is an internal-consistency violation,
    /// never expected from a store written through the save path.
    pub fn insert_loaded(&self, entry: CacheEntry) -> Result<(), CacheError> {
        let mut entries = self.write_guard()?;
        if entries.contains_key(&entry.key) {
            return Err(CacheError::DuplicateKey {
                archive: self.name.clone(),
                key: entry.key,
            });
        }
        entries.insert(entry.key.clone(), entry);
        Ok(())
    }

    /// Keys of entries whose caller set contains the fingerprint
    pub fn select_by_caller(&self, caller: &str) -> Result<Vec<String>, CacheError> {
        let entries = self.read_guard()?;
        Ok(entries
            .values()
            .filter(|entry| entry.callers.contains(caller))
            .map(|entry| entry.key.clone())
            .collect())
    }

    /// Run a closure against the entry for `key`, if present
    pub fn with_entry<R>(
        &self,
        key: &str,
        f: impl FnOnce(&CacheEntry) -> R,
    ) -> Result<Option<R>, CacheError> {
        let entries = self.read_guard()?;
        Ok(entries.get(key).map(f))
    }

    /// Run a closure against the entry for `key` with mutable access
    pub fn with_entry_mut<R>(
        &self,
        key: &str,
        f: impl FnOnce(&mut CacheEntry) -> R,
    ) -> Result<Option<R>, CacheError> {
        let mut entries = self.write_guard()?;
        Ok(entries.get_mut(key).map(f))
    }

    /// Mark the entry as altered and take over the caller's current state,
    /// if that transition applies.
    ///
    /// Returns the number of entries marked: 0 when the key is absent, the
    /// record was never saved (`Unsaved` is not "altered" relative to a
    /// persisted baseline), or the record is already deleted and therefore
    /// invisible; 1 otherwise. When the transition applies, `incoming`
    /// replaces the stored value so the next save persists the caller's
    /// edits; the entry's lifecycle stamps are carried over.
    pub fn mark_altered(
        &self,
        key: &str,
        incoming: Box<dyn Cacheable>,
    ) -> Result<usize, CacheError> {
        let mut entries = self.write_guard()?;
        match entries.get_mut(key) {
            Some(entry) => match entry.value.stamp().state {
                CacheState::Unsaved | CacheState::Deleted => Ok(0),
                _ => {
                    let stamp = entry.value.stamp().clone();
                    entry.value = incoming;
                    *entry.value.stamp_mut() = CacheStamp {
                        state: CacheState::Altered,
                        ..stamp
                    };
                    Ok(1)
                }
            },
            None => Ok(0),
        }
    }

    /// Soft-delete the entry. Returns 1 when a visible entry was marked,
    /// 0 when the key is absent or already deleted.
    pub fn mark_deleted(&self, key: &str) -> Result<usize, CacheError> {
        let mut entries = self.write_guard()?;
        match entries.get_mut(key) {
            Some(entry) => match entry.value.stamp().state {
                CacheState::Deleted => Ok(0),
                _ => {
                    entry.value.stamp_mut().state = CacheState::Deleted;
                    Ok(1)
                }
            },
            None => Ok(0),
        }
    }

    /// Snapshot of every entry's key and dirty state.
    ///
    /// The save path partitions this snapshot into its three phases before
    /// touching anything, so an entry it just inserted as `Unsaved` is not
    /// reconsidered as `Altered` within the same save call.
    pub fn snapshot_states(&self) -> Result<Vec<(String, CacheState)>, CacheError> {
        let entries = self.read_guard()?;
        Ok(entries
            .values()
            .map(|entry| (entry.key.clone(), entry.value.stamp().state))
            .collect())
    }

    /// Physically remove an entry from memory
    pub fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.write_guard()?;
        if entries.remove(key).is_some() {
            debug!("Removed entry '{}' from archive '{}'", key, self.name);
        }
        Ok(())
    }

    pub fn entry_count(&self) -> Result<usize, CacheError> {
        Ok(self.read_guard()?.len())
    }
}
