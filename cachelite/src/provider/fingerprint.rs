// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query fingerprints
//!
//! A fingerprint identifies "this query with these arguments" and is the
//! secondary index over cache entries. It is an exact-match, order-sensitive
//! string: the method name, a delimiter, and the `,`-joined display form of
//! each argument. Two calls collide exactly when their methods match and
//! their arguments render to the same strings - argument types whose string
//! form is ambiguous can collide or fail to collide unexpectedly. That is a
//! known limitation of the format, kept as-is.

use std::fmt::Display;

const DELIMITER: char = '-';

/// Build the fingerprint for a method and its arguments
pub fn caller_fingerprint(method: &str, arguments: &[&dyn Display]) -> String {
    let rendered: Vec<String> = arguments.iter().map(|a| a.to_string()).collect();
    format!("{}{}{}", method, DELIMITER, rendered.join(","))
}
