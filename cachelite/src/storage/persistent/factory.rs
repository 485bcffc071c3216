// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Store factory
//!
//! Creates the configured store backend behind the [`CacheStore`] trait.

use super::traits::CacheStore;
use super::types::{StoreBackend, StoreResult};
use std::path::Path;
use std::sync::Arc;

/// Create a cache store for the configured backend.
///
/// Opening the store happens here: failure to open or create it is fatal at
/// provider construction time, per the install contract.
pub fn create_cache_store<P: AsRef<Path>>(
    backend: StoreBackend,
    path: P,
) -> StoreResult<Arc<dyn CacheStore>> {
    match backend {
        #[cfg(feature = "sled-backend")]
        StoreBackend::Sled => {
            use super::sled::SledStore;
            let store = SledStore::open(path)?;
            Ok(Arc::new(store) as Arc<dyn CacheStore>)
        }
        #[cfg(not(feature = "sled-backend"))]
        StoreBackend::Sled => Err(super::types::StoreError::Backend(
            "sled backend not compiled in; enable the `sled-backend` feature".to_string(),
        )),
        StoreBackend::Memory => {
            use super::memory::MemoryStore;
            let _ = path;
            Ok(Arc::new(MemoryStore::new()) as Arc<dyn CacheStore>)
        }
    }
}
