// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Data model for the cacheable capability
//!
//! This module provides:
//! - The `Cacheable` trait: stable key, lifecycle stamps, structural
//!   member descriptors, value codec
//! - Dirty-state tracking (`CacheState`, `CacheStamp`)
//! - The memoizing type descriptor registry

pub mod cacheable;
pub mod descriptor;

pub use cacheable::{CacheState, CacheStamp, Cacheable, CacheableType};
pub use descriptor::{
    DecodeFn, MemberAccessor, MemberDescriptor, TypeDescriptor, TypeRegistry,
};
