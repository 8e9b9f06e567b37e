// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog data model
//!
//! This module provides:
//! - Company records with denormalized aggregate statistics
//! - Problem records with difficulty, tags and recency buckets
//! - User-scoped sub-records (bookmarks, statuses, history entries)
//! - Key normalization and slug derivation helpers

mod company;
mod problem;
mod user;

pub use company::{Company, DifficultyCounts, RecencyCounts, TagCount};
pub use problem::{Difficulty, Problem, RecencyBucket};
pub use user::{Bookmark, EducationEntry, ProblemStatus, StatusRecord, WorkEntry};

/// Lowercased, trimmed form of a display field
///
/// Used for case-insensitive uniqueness checks and range-based search;
/// collections ordered on a normalized key sort ascending by this value.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Derive a URL-safe slug from a display name
///
/// Deterministic: the same name always yields the same slug. Runs of
/// non-alphanumeric characters collapse into a single dash.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.trim().to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(ch);
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key_trims_and_lowercases() {
        assert_eq!(normalize_key("  Acme Corp  "), "acme corp");
        assert_eq!(normalize_key("ACME"), "acme");
        assert_eq!(normalize_key(""), "");
    }

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Acme Corp"), "acme-corp");
        assert_eq!(slugify("Jane Street"), "jane-street");
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("A & B   Labs"), "a-b-labs");
        assert_eq!(slugify("--Edge--Case--"), "edge-case");
    }

    #[test]
    fn test_slugify_deterministic() {
        assert_eq!(slugify("Acme, Inc."), slugify("Acme, Inc."));
    }
}
