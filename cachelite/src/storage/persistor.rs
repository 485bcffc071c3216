// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Diff-based synchronization between the in-memory cache and the store
//!
//! Saves the cache residing in memory to the durable store and rebuilds it
//! from there. Each archive is reconciled with a three-phase diff in fixed
//! order: insert everything `Unsaved`, update everything `Altered`, delete
//! everything `Deleted`. The phases are computed from a snapshot of entry
//! states taken before any phase runs, so an entry that was just inserted
//! is not reconsidered as altered within the same save call.

use crate::cache::{CacheArchive, CacheContainer, CacheEntry};
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::model::{CacheState, TypeRegistry};
use crate::storage::persistent::{create_cache_store, CacheStore};
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

struct EntryRow {
    bytes: Vec<u8>,
    callers: HashSet<String>,
    linked_singles: HashMap<String, String>,
    linked_collections: HashMap<String, Vec<String>>,
    persisted_at: DateTime<Utc>,
}

/// Synchronizes cache containers against a durable [`CacheStore`]
pub struct CachePersistor {
    store: Arc<dyn CacheStore>,
}

impl CachePersistor {
    /// Open the configured store and wrap it in a persistor.
    ///
    /// A store that cannot be opened or created is fatal here;
    /// `reinstall` is the recovery path, not a retry.
    pub fn open(config: &CacheConfig) -> Result<Self, CacheError> {
        let store = create_cache_store(config.backend, &config.path)?;
        Ok(Self { store })
    }

    /// Wrap an already-opened store
    pub fn with_store(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Save the container to the durable store.
    ///
    /// First pass registers every archive's type identifier; second pass
    /// reconciles each archive's entries. The store is flushed once per
    /// archive - the durability boundary. Not safe to run concurrently
    /// with mutation of the same entries; the caller serializes.
    pub fn save_cache(&self, container: &CacheContainer) -> Result<(), CacheError> {
        let archives = container.archives()?;

        for archive in &archives {
            self.store.ensure_archive_registered(archive.name())?;
        }

        for archive in &archives {
            self.save_entries(archive)?;
        }
        Ok(())
    }

    fn save_entries(&self, archive: &CacheArchive) -> Result<(), CacheError> {
        let mut unsaved = Vec::new();
        let mut altered = Vec::new();
        let mut deleted = Vec::new();
        for (key, state) in archive.snapshot_states()? {
            match state {
                CacheState::Unsaved => unsaved.push(key),
                CacheState::Altered => altered.push(key),
                CacheState::Deleted => deleted.push(key),
                CacheState::Saved => {}
            }
        }

        debug!(
            "Saving archive '{}': {} unsaved, {} altered, {} deleted",
            archive.name(),
            unsaved.len(),
            altered.len(),
            deleted.len()
        );

        for key in &unsaved {
            self.persist_entry(archive, key, false)?;
        }
        for key in &altered {
            self.persist_entry(archive, key, true)?;
        }
        for key in &deleted {
            self.delete_persisted(archive, key)?;
        }

        self.store.flush()?;
        Ok(())
    }

    /// Write one entry's value, callers and links, then mark it saved.
    ///
    /// The value blob is encoded from a clone already stamped
    /// `Saved`/`persisted`, so a reloaded cache comes back clean; the
    /// in-memory entry is stamped only after the store writes succeed.
    /// `replace_links` distinguishes the update phase (overwrite
    /// unconditionally, clearing stale rows) from the insert phase (only
    /// write rows that exist).
    fn persist_entry(
        &self,
        archive: &CacheArchive,
        key: &str,
        replace_links: bool,
    ) -> Result<(), CacheError> {
        let row = archive.with_entry(key, |entry| {
            let persisted_at = Utc::now();
            let mut value = entry.value.clone_boxed();
            {
                let stamp = value.stamp_mut();
                stamp.state = CacheState::Saved;
                stamp.persisted = Some(persisted_at);
            }
            value.encode().map(|bytes| EntryRow {
                bytes,
                callers: entry.callers.clone(),
                linked_singles: entry.linked_entries.clone(),
                linked_collections: entry.linked_collections.clone(),
                persisted_at,
            })
        })?;
        let row = match row {
            Some(row) => row?,
            None => return Ok(()),
        };

        let name = archive.name();
        self.store.upsert_entry(name, key, &row.bytes)?;

        if replace_links || !row.callers.is_empty() {
            self.store.replace_callers(name, key, &row.callers)?;
        }
        if replace_links || !row.linked_singles.is_empty() {
            self.store
                .replace_linked_singles(name, key, &row.linked_singles)?;
        }
        if replace_links || !row.linked_collections.is_empty() {
            self.store
                .replace_linked_collections(name, key, &row.linked_collections)?;
        }

        archive.with_entry_mut(key, |entry| {
            let stamp = entry.value.stamp_mut();
            stamp.state = CacheState::Saved;
            stamp.persisted = Some(row.persisted_at);
        })?;
        Ok(())
    }

    /// Remove a soft-deleted entry from the store and from memory
    fn delete_persisted(&self, archive: &CacheArchive, key: &str) -> Result<(), CacheError> {
        let name = archive.name();
        self.store.delete_entry(name, key)?;
        self.store.replace_callers(name, key, &HashSet::new())?;
        self.store
            .replace_linked_singles(name, key, &HashMap::new())?;
        self.store
            .replace_linked_collections(name, key, &HashMap::new())?;

        archive.remove(key)?;
        Ok(())
    }

    /// Rebuild empty archives from the store's registry rows
    pub fn load_archives_from_database(&self) -> Result<Vec<Arc<CacheArchive>>, CacheError> {
        let names = self.store.load_all_archives()?;
        debug!("Loading {} archives from store", names.len());
        Ok(names
            .into_iter()
            .map(|name| Arc::new(CacheArchive::new(name)))
            .collect())
    }

    /// Fill rebuilt archives with their durable entries.
    ///
    /// Loaded entries hold key-based links only; live nested references are
    /// reconstructed lazily through `get`, identically to entries that were
    /// never persisted.
    pub fn load_entries_from_database(
        &self,
        archives: &[Arc<CacheArchive>],
        registry: &TypeRegistry,
    ) -> Result<(), CacheError> {
        for archive in archives {
            let decode = registry.decoder(archive.name())?;
            for stored in self.store.load_entries(archive.name())? {
                let value = decode(&stored.value)?;
                archive.insert_loaded(CacheEntry::new(
                    stored.key,
                    value,
                    stored.callers,
                    stored.linked_singles,
                    stored.linked_collections,
                ))?;
            }
        }
        Ok(())
    }

    /// Remove every row from the store; the store stays usable
    pub fn empty_database(&self) -> Result<(), CacheError> {
        self.store.erase_everything()?;
        Ok(())
    }

    /// Delete and recreate the durable store from scratch
    pub fn reinstall(&self) -> Result<(), CacheError> {
        info!("Reinstalling the durable cache store");
        self.store.reinstall()?;
        Ok(())
    }
}
