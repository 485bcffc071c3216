// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Cache configuration

use crate::storage::persistent::StoreBackend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a cache provider instance
///
/// The path points at the directory holding the durable store. The backend
/// selects the storage technology; `StoreBackend::Sled` is the default and
/// the right choice for anything that must survive a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory where the durable store lives
    pub path: PathBuf,

    /// Storage backend to use
    pub backend: StoreBackend,
}

impl CacheConfig {
    /// Create a configuration with the default backend
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            backend: StoreBackend::default(),
        }
    }

    /// Override the storage backend
    pub fn with_backend(mut self, backend: StoreBackend) -> Self {
        self.backend = backend;
        self
    }
}
