// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Registry of cache archives, one per cacheable type
//!
//! The container is an explicitly owned value inside the cache provider,
//! not process-wide state: tests and embedders construct as many isolated
//! instances as they need.

use crate::cache::archive::CacheArchive;
use crate::error::CacheError;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Collection of named archives, keyed by type name
#[derive(Debug)]
pub struct CacheContainer {
    archives: RwLock<HashMap<String, Arc<CacheArchive>>>,
}

impl CacheContainer {
    pub fn new() -> Self {
        Self {
            archives: RwLock::new(HashMap::new()),
        }
    }

    fn read_guard(
        &self,
    ) -> Result<RwLockReadGuard<'_, HashMap<String, Arc<CacheArchive>>>, CacheError> {
        self.archives
            .read()
            .map_err(|e| CacheError::Lock(format!("failed to acquire read lock: {}", e)))
    }

    fn write_guard(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<String, Arc<CacheArchive>>>, CacheError> {
        self.archives
            .write()
            .map_err(|e| CacheError::Lock(format!("failed to acquire write lock: {}", e)))
    }

    /// Find the archive for a type, creating it if this is the first time
    /// the type is seen. Find-or-create happens under the write lock, so
    /// concurrent first adds of a type converge on one archive.
    pub fn archive_for(&self, type_name: &str) -> Result<Arc<CacheArchive>, CacheError> {
        let mut archives = self.write_guard()?;
        let archive = archives
            .entry(type_name.to_string())
            .or_insert_with(|| {
                debug!("Creating archive for type '{}'", type_name);
                Arc::new(CacheArchive::new(type_name.to_string()))
            })
            .clone();
        Ok(archive)
    }

    /// Find the archive for a type without creating one
    pub fn get(&self, type_name: &str) -> Result<Option<Arc<CacheArchive>>, CacheError> {
        Ok(self.read_guard()?.get(type_name).cloned())
    }

    /// Snapshot of all archives
    pub fn archives(&self) -> Result<Vec<Arc<CacheArchive>>, CacheError> {
        Ok(self.read_guard()?.values().cloned().collect())
    }

    pub fn archive_names(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.read_guard()?.keys().cloned().collect())
    }

    /// Drop every archive. Entries become unreachable and are freed once
    /// all handed-out references are gone.
    pub fn clear(&self) -> Result<(), CacheError> {
        let mut archives = self.write_guard()?;
        archives.clear();
        debug!("Cleared all archives from container");
        Ok(())
    }

    /// Replace the container's contents with archives rebuilt from the
    /// durable store
    pub fn install(&self, loaded: Vec<Arc<CacheArchive>>) -> Result<(), CacheError> {
        let mut archives = self.write_guard()?;
        archives.clear();
        for archive in loaded {
            archives.insert(archive.name().to_string(), archive);
        }
        debug!("Installed {} archives into container", archives.len());
        Ok(())
    }
}

impl Default for CacheContainer {
    fn default() -> Self {
        Self::new()
    }
}
