// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Search and filter engine
//!
//! The primary filter is a classic string-prefix range scan on a normalized
//! key: every key in `[term, term + PREFIX_SENTINEL)` starts with the term.
//! The range is expressed either as store conditions (for driver-side
//! scans) or as a binary-search slice over the cached, key-sorted list.

use serde_json::json;

use crate::model::{normalize_key, Company};
use crate::storage::{Condition, ConditionOp};

/// Highest-sorting character of the key alphabet; upper bound of the
/// prefix range `[term, term + PREFIX_SENTINEL)`.
pub const PREFIX_SENTINEL: char = '\u{10FFFF}';

/// Exclusive upper bound of the prefix range for `term`
pub fn prefix_upper_bound(term: &str) -> String {
    format!("{}{}", term, PREFIX_SENTINEL)
}

/// Store conditions selecting all records whose `field` starts with `term`
///
/// The caller must order the query on the same field; the adapter rejects
/// a range condition combined with ordering on any other field.
pub fn prefix_conditions(field: &str, term: &str) -> Vec<Condition> {
    vec![
        Condition {
            field: field.to_string(),
            op: ConditionOp::Gte,
            value: json!(term),
        },
        Condition {
            field: field.to_string(),
            op: ConditionOp::Lt,
            value: json!(prefix_upper_bound(term)),
        },
    ]
}

/// The contiguous prefix-range slice of a list sorted by normalized name
pub fn prefix_range(companies: &[Company], term: &str) -> std::ops::Range<usize> {
    let upper = prefix_upper_bound(term);
    let start = companies.partition_point(|c| c.normalized_name.as_str() < term);
    let end = companies.partition_point(|c| c.normalized_name.as_str() < upper.as_str());
    start..end
}

/// Filter a name-sorted company list by a search term
///
/// An empty or whitespace-only term means no filter. Otherwise the primary
/// name-prefix matches come first (in name order), followed by companies
/// whose description contains the term as a case-insensitive substring,
/// the secondary pass the store cannot express. Companies already selected
/// by the name prefix are not re-checked against their description.
pub fn filter_companies(companies: &[Company], raw_term: &str) -> Vec<Company> {
    let term = normalize_key(raw_term);
    if term.is_empty() {
        return companies.to_vec();
    }

    let range = prefix_range(companies, &term);
    let mut out: Vec<Company> = companies[range.clone()].to_vec();

    for (index, company) in companies.iter().enumerate() {
        if range.contains(&index) {
            continue;
        }
        let matches_description = company
            .description
            .as_deref()
            .map(|d| d.to_lowercase().contains(&term))
            .unwrap_or(false);
        if matches_description {
            out.push(company.clone());
        }
    }

    out
}
