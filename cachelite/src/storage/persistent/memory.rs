// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory store implementation for testing and ephemeral caches

use super::traits::{CacheStore, StoredEntry};
use super::types::StoreResult;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

type RowKey = (String, String);

/// In-memory cache store
///
/// Keeps the same row model as the durable backends in plain maps. Counts
/// write operations, which lets tests observe that an idempotent save
/// performs no redundant work.
#[derive(Default)]
pub struct MemoryStore {
    archives: RwLock<HashSet<String>>,
    entries: RwLock<HashMap<RowKey, Vec<u8>>>,
    callers: RwLock<HashMap<RowKey, HashSet<String>>>,
    linked_singles: RwLock<HashMap<RowKey, HashMap<String, String>>>,
    linked_collections: RwLock<HashMap<RowKey, HashMap<String, Vec<String>>>>,
    write_ops: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of write operations performed since construction
    pub fn write_op_count(&self) -> u64 {
        self.write_ops.load(Ordering::Relaxed)
    }

    /// Number of stored entry rows across all archives
    pub fn entry_row_count(&self) -> usize {
        self.entries.read().len()
    }

    fn count_write(&self) {
        self.write_ops.fetch_add(1, Ordering::Relaxed);
    }
}

impl CacheStore for MemoryStore {
    fn ensure_archive_registered(&self, type_name: &str) -> StoreResult<()> {
        self.archives.write().insert(type_name.to_string());
        Ok(())
    }

    fn upsert_entry(&self, archive: &str, key: &str, value: &[u8]) -> StoreResult<()> {
        self.count_write();
        self.entries
            .write()
            .insert((archive.to_string(), key.to_string()), value.to_vec());
        Ok(())
    }

    fn delete_entry(&self, archive: &str, key: &str) -> StoreResult<()> {
        self.count_write();
        self.entries
            .write()
            .remove(&(archive.to_string(), key.to_string()));
        Ok(())
    }

    fn replace_callers(
        &self,
        archive: &str,
        key: &str,
        callers: &HashSet<String>,
    ) -> StoreResult<()> {
        self.count_write();
        let row = (archive.to_string(), key.to_string());
        if callers.is_empty() {
            self.callers.write().remove(&row);
        } else {
            self.callers.write().insert(row, callers.clone());
        }
        Ok(())
    }

    fn replace_linked_singles(
        &self,
        archive: &str,
        key: &str,
        links: &HashMap<String, String>,
    ) -> StoreResult<()> {
        self.count_write();
        let row = (archive.to_string(), key.to_string());
        if links.is_empty() {
            self.linked_singles.write().remove(&row);
        } else {
            self.linked_singles.write().insert(row, links.clone());
        }
        Ok(())
    }

    fn replace_linked_collections(
        &self,
        archive: &str,
        key: &str,
        links: &HashMap<String, Vec<String>>,
    ) -> StoreResult<()> {
        self.count_write();
        let row = (archive.to_string(), key.to_string());
        if links.is_empty() {
            self.linked_collections.write().remove(&row);
        } else {
            self.linked_collections.write().insert(row, links.clone());
        }
        Ok(())
    }

    fn load_all_archives(&self) -> StoreResult<Vec<String>> {
        Ok(self.archives.read().iter().cloned().collect())
    }

    fn load_entries(&self, archive: &str) -> StoreResult<Vec<StoredEntry>> {
        let entries = self.entries.read();
        let callers = self.callers.read();
        let singles = self.linked_singles.read();
        let collections = self.linked_collections.read();

        let mut rows = Vec::new();
        for ((archive_name, key), value) in entries.iter() {
            if archive_name != archive {
                continue;
            }
            let row = (archive_name.clone(), key.clone());
            rows.push(StoredEntry {
                key: key.clone(),
                value: value.clone(),
                callers: callers.get(&row).cloned().unwrap_or_default(),
                linked_singles: singles.get(&row).cloned().unwrap_or_default(),
                linked_collections: collections.get(&row).cloned().unwrap_or_default(),
            });
        }
        Ok(rows)
    }

    fn erase_everything(&self) -> StoreResult<()> {
        self.archives.write().clear();
        self.entries.write().clear();
        self.callers.write().clear();
        self.linked_singles.write().clear();
        self.linked_collections.write().clear();
        Ok(())
    }

    fn reinstall(&self) -> StoreResult<()> {
        // Nothing on disk to tear down
        self.erase_everything()
    }

    fn flush(&self) -> StoreResult<()> {
        // No-op for memory storage
        Ok(())
    }
}
