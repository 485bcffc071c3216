// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Durable storage for the cache
//!
//! This module provides:
//! - The store contract and its backends (sled, memory)
//! - The persistor that diffs in-memory archives against the store

pub mod persistent;
pub mod persistor;

pub use persistor::CachePersistor;
