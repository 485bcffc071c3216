// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for the cache engine

use crate::storage::persistent::StoreError;
use thiserror::Error;

/// Error type for cache operations
///
/// Precondition violations (`EmptyCacheKey`) and internal consistency
/// violations (`DuplicateKey`) are fatal: they signal a defective
/// `Cacheable` implementation or a corrupted durable store, not a condition
/// the caller can retry. Not-found is never an error; the `get` operations
/// express it through their return type instead.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache key may never be empty: did you implement it? ({0})")]
    EmptyCacheKey(String),

    #[error("more than one entry with the same key found: {archive}/{key}")]
    DuplicateKey { archive: String, key: String },

    #[error("no decoder registered for cached type: {0}")]
    UnknownType(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("lock error: {0}")]
    Lock(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<bincode::Error> for CacheError {
    fn from(err: bincode::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}
