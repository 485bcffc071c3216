// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Sled store implementation
//!
//! Lays the cache's row model out over five sled trees:
//! - `archives`: registry of archive type names
//! - `entries`: value blobs, keyed `archive \0 key`
//! - `callers`: caller sets per entry, bincode-encoded
//! - `linked_entries`: linked-single mappings per entry
//! - `linked_collections`: linked-collection mappings per entry

use super::traits::{CacheStore, StoredEntry};
use super::types::{StoreError, StoreResult};
use log::{debug, info};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

const ARCHIVES_TREE: &str = "archives";
const ENTRIES_TREE: &str = "entries";
const CALLERS_TREE: &str = "callers";
const LINKED_ENTRIES_TREE: &str = "linked_entries";
const LINKED_COLLECTIONS_TREE: &str = "linked_collections";

/// Durable cache store backed by sled
pub struct SledStore {
    path: PathBuf,
    // None only transiently during reinstall; a handle clone per operation
    // keeps the file lock releasable.
    db: RwLock<Option<sled::Db>>,
}

/// Separator between archive name and entry key in row keys. Archive names
/// are type identifiers and never contain NUL.
const KEY_SEPARATOR: u8 = 0;

fn row_key(archive: &str, key: &str) -> Vec<u8> {
    let mut row = Vec::with_capacity(archive.len() + key.len() + 1);
    row.extend_from_slice(archive.as_bytes());
    row.push(KEY_SEPARATOR);
    row.extend_from_slice(key.as_bytes());
    row
}

fn row_prefix(archive: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(archive.len() + 1);
    prefix.extend_from_slice(archive.as_bytes());
    prefix.push(KEY_SEPARATOR);
    prefix
}

impl SledStore {
    /// Open or create the store at the given directory
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let db = sled::open(&path).map_err(|e| StoreError::Backend(e.to_string()))?;
        info!("Opened sled cache store at {:?}", path);
        Ok(Self {
            path,
            db: RwLock::new(Some(db)),
        })
    }

    fn db(&self) -> StoreResult<sled::Db> {
        self.db
            .read()
            .clone()
            .ok_or_else(|| StoreError::Unavailable("store is being reinstalled".to_string()))
    }

    fn tree(&self, name: &str) -> StoreResult<sled::Tree> {
        self.db()?
            .open_tree(name)
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    /// Overwrite or remove one bincode-encoded row
    fn replace_row<T: serde::Serialize>(
        &self,
        tree_name: &str,
        archive: &str,
        key: &str,
        value: &T,
        is_empty: bool,
    ) -> StoreResult<()> {
        let tree = self.tree(tree_name)?;
        let row = row_key(archive, key);
        if is_empty {
            tree.remove(row)
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        } else {
            let encoded = bincode::serialize(value)?;
            tree.insert(row, encoded)
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        Ok(())
    }

    fn read_row<T: serde::de::DeserializeOwned + Default>(
        &self,
        tree_name: &str,
        archive: &str,
        key: &str,
    ) -> StoreResult<T> {
        let tree = self.tree(tree_name)?;
        match tree
            .get(row_key(archive, key))
            .map_err(|e| StoreError::Backend(e.to_string()))?
        {
            Some(bytes) => Ok(bincode::deserialize(&bytes)?),
            None => Ok(T::default()),
        }
    }
}

impl CacheStore for SledStore {
    fn ensure_archive_registered(&self, type_name: &str) -> StoreResult<()> {
        let tree = self.tree(ARCHIVES_TREE)?;
        let exists = tree
            .contains_key(type_name.as_bytes())
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        if !exists {
            debug!("Registering archive '{}'", type_name);
            tree.insert(type_name.as_bytes(), Vec::<u8>::new())
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        Ok(())
    }

    fn upsert_entry(&self, archive: &str, key: &str, value: &[u8]) -> StoreResult<()> {
        self.tree(ENTRIES_TREE)?
            .insert(row_key(archive, key), value)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    fn delete_entry(&self, archive: &str, key: &str) -> StoreResult<()> {
        self.tree(ENTRIES_TREE)?
            .remove(row_key(archive, key))
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    fn replace_callers(
        &self,
        archive: &str,
        key: &str,
        callers: &HashSet<String>,
    ) -> StoreResult<()> {
        self.replace_row(CALLERS_TREE, archive, key, callers, callers.is_empty())
    }

    fn replace_linked_singles(
        &self,
        archive: &str,
        key: &str,
        links: &HashMap<String, String>,
    ) -> StoreResult<()> {
        self.replace_row(LINKED_ENTRIES_TREE, archive, key, links, links.is_empty())
    }

    fn replace_linked_collections(
        &self,
        archive: &str,
        key: &str,
        links: &HashMap<String, Vec<String>>,
    ) -> StoreResult<()> {
        self.replace_row(
            LINKED_COLLECTIONS_TREE,
            archive,
            key,
            links,
            links.is_empty(),
        )
    }

    fn load_all_archives(&self) -> StoreResult<Vec<String>> {
        let tree = self.tree(ARCHIVES_TREE)?;
        let mut names = Vec::new();
        for row in tree.iter() {
            let (name, _) = row.map_err(|e| StoreError::Backend(e.to_string()))?;
            names.push(String::from_utf8_lossy(&name).to_string());
        }
        Ok(names)
    }

    fn load_entries(&self, archive: &str) -> StoreResult<Vec<StoredEntry>> {
        let entries_tree = self.tree(ENTRIES_TREE)?;
        let prefix = row_prefix(archive);

        let mut entries = Vec::new();
        for row in entries_tree.scan_prefix(&prefix) {
            let (row_key, value) = row.map_err(|e| StoreError::Backend(e.to_string()))?;
            let key = String::from_utf8_lossy(&row_key[prefix.len()..]).to_string();

            entries.push(StoredEntry {
                value: value.to_vec(),
                callers: self.read_row(CALLERS_TREE, archive, &key)?,
                linked_singles: self.read_row(LINKED_ENTRIES_TREE, archive, &key)?,
                linked_collections: self.read_row(LINKED_COLLECTIONS_TREE, archive, &key)?,
                key,
            });
        }
        debug!("Loaded {} entries for archive '{}'", entries.len(), archive);
        Ok(entries)
    }

    fn erase_everything(&self) -> StoreResult<()> {
        for tree_name in [
            ARCHIVES_TREE,
            ENTRIES_TREE,
            CALLERS_TREE,
            LINKED_ENTRIES_TREE,
            LINKED_COLLECTIONS_TREE,
        ] {
            self.tree(tree_name)?
                .clear()
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        debug!("Erased all rows from sled store");
        Ok(())
    }

    fn reinstall(&self) -> StoreResult<()> {
        let mut guard = self.db.write();
        // Drop the live handle first so sled releases its file lock
        guard.take();
        if self.path.exists() {
            std::fs::remove_dir_all(&self.path)?;
        }
        let db = sled::open(&self.path).map_err(|e| StoreError::Backend(e.to_string()))?;
        *guard = Some(db);
        info!("Reinstalled sled cache store at {:?}", self.path);
        Ok(())
    }

    fn flush(&self) -> StoreResult<()> {
        self.db()?
            .flush()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }
}
