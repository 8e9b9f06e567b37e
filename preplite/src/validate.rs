// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Field validation shared by single-entity writes and bulk reconciliation

use once_cell::sync::Lazy;
use regex::Regex;

static SCHEME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://").expect("valid scheme regex"));

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("valid url regex"));

/// Normalize and validate a URL-ish input field
///
/// Schemeless inputs get `https://` prepended before validation; the result
/// must be an absolute http/https URL. The error is the user-facing message
/// for the named field.
pub fn normalize_url(field: &str, raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    let candidate = if SCHEME_RE.is_match(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    if URL_RE.is_match(&candidate) {
        Ok(candidate)
    } else {
        Err(format!("Invalid {} URL: {}", field, raw.trim()))
    }
}

/// Normalize an optional URL field; empty input collapses to `None`
pub fn normalize_optional_url(field: &str, raw: Option<&str>) -> Result<Option<String>, String> {
    match raw.map(str::trim) {
        None => Ok(None),
        Some("") => Ok(None),
        Some(value) => normalize_url(field, value).map(Some),
    }
}

/// Require a non-empty trimmed value for a named field
pub fn require(field: &str, raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(format!("{} is required", field))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Trim a tag list, dropping empties and duplicates, preserving order
pub fn clean_tags(raw: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw {
        let tag = tag.trim();
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Validate an optional year pair for a history entry
pub fn check_year_range(
    start_year: Option<i32>,
    end_year: Option<i32>,
) -> Result<(), String> {
    for year in [start_year, end_year].into_iter().flatten() {
        if !(1900..=2100).contains(&year) {
            return Err(format!("Year out of range: {}", year));
        }
    }
    if let (Some(start), Some(end)) = (start_year, end_year) {
        if end < start {
            return Err(format!("End year {} precedes start year {}", end, start));
        }
    }
    Ok(())
}
