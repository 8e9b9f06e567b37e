// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Bulk reconciliation
//!
//! Batches of externally-sourced rows are matched against existing records
//! and every row is independently classified as added, updated, skipped or
//! error; one row's failure never aborts the batch. The full per-row audit
//! is returned alongside aggregate counts.

pub mod engine;

pub use engine::{ReconcileEngine, ReconcileOutcome};

use serde::{Deserialize, Serialize};

/// Classification of one processed row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    Added,
    Updated,
    Skipped,
    Error,
}

impl std::fmt::Display for RowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RowStatus::Added => "added",
            RowStatus::Updated => "updated",
            RowStatus::Skipped => "skipped",
            RowStatus::Error => "error",
        };
        write!(f, "{}", name)
    }
}

/// Audit record for one processed row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowOutcome {
    /// Position of the row in the submitted batch
    pub index: usize,
    /// Identifying name/title as submitted (trimmed)
    pub identifier: String,
    pub status: RowStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Aggregate counts plus the ordered per-row audit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
    pub rows: Vec<RowOutcome>,
}

impl ReconcileReport {
    pub(crate) fn record(
        &mut self,
        index: usize,
        identifier: impl Into<String>,
        status: RowStatus,
        message: Option<String>,
    ) {
        match status {
            RowStatus::Added => self.added += 1,
            RowStatus::Updated => self.updated += 1,
            RowStatus::Skipped => self.skipped += 1,
            RowStatus::Error => self.errors += 1,
        }
        self.rows.push(RowOutcome {
            index,
            identifier: identifier.into(),
            status,
            message,
        });
    }
}

/// One raw company row from a bulk upload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyRow {
    pub name: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
}

/// One raw problem row from a bulk upload
///
/// Difficulty and recency arrive as uploaded text and are validated here,
/// not at the parsing layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemRow {
    /// Display name of the owning company
    pub company: String,
    pub title: String,
    pub difficulty: String,
    pub link: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub recency: Option<String>,
}
