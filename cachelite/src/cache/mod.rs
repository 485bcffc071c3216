// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory cache structures: container, archive, entry
//!
//! The container registers one archive per cacheable type; each archive
//! holds the normalized entries for its type, keyed by cache key. All
//! collections are lock-guarded so concurrent adds and gets from
//! independent callers cannot corrupt structure.

pub mod archive;
pub mod container;
pub mod entry;

pub use archive::CacheArchive;
pub use container::CacheContainer;
pub use entry::CacheEntry;
