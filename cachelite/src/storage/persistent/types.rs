// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Store backend types and error handling

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage backend configuration
///
/// Specifies which underlying storage technology backs the cache.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StoreBackend {
    /// Sled - pure Rust embedded database. The default; survives restarts.
    Sled,

    /// Memory - in-memory store for testing and ephemeral caches
    Memory,
}

impl Default for StoreBackend {
    fn default() -> Self {
        StoreBackend::Sled
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sled" => Ok(StoreBackend::Sled),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!(
                "Unknown store backend: {}. Valid options: sled, memory",
                s
            )),
        }
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StoreBackend::Sled => "sled",
            StoreBackend::Memory => "memory",
        };
        write!(f, "{}", name)
    }
}

/// Error type for durable store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type for durable store operations
pub type StoreResult<T> = Result<T, StoreError>;
