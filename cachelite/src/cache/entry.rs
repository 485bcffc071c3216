// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! A single normalized cache record

use crate::model::Cacheable;
use std::collections::{HashMap, HashSet};

/// One normalized, keyed record within an archive
#[derive(Debug)]
pub struct CacheEntry {
    /// Key of the entity at insertion time
    pub key: String,

    /// The entity itself. Exclusively owned by the entry: `get` mutates
    /// this instance in place (stamps, spliced links) and hands out clones.
    pub value: Box<dyn Cacheable>,

    /// Query fingerprints that return this record as (part of) their result
    pub callers: HashSet<String>,

    /// Links to single nested records, child type name -> child key
    pub linked_entries: HashMap<String, String>,

    /// Links to nested collections, child type name -> ordered child keys
    pub linked_collections: HashMap<String, Vec<String>>,
}

impl CacheEntry {
    /// Create an entry for a freshly decomposed value
    pub fn new(
        key: String,
        value: Box<dyn Cacheable>,
        callers: HashSet<String>,
        linked_entries: HashMap<String, String>,
        linked_collections: HashMap<String, Vec<String>>,
    ) -> Self {
        Self {
            key,
            value,
            callers,
            linked_entries,
            linked_collections,
        }
    }
}
