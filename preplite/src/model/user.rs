// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! User-scoped sub-records
//!
//! All of these live in a per-user namespace keyed by an externally
//! supplied user identifier; the catalog core never models users themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-user progress state for one problem; absence means "none"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemStatus {
    Todo,
    Attempted,
    Solved,
}

impl std::fmt::Display for ProblemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProblemStatus::Todo => "todo",
            ProblemStatus::Attempted => "attempted",
            ProblemStatus::Solved => "solved",
        };
        write!(f, "{}", name)
    }
}

/// Storage shape of one status entry, keyed by problem id
///
/// Absence of a record means "none"; the UI never sees this directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub id: String,
    pub status: ProblemStatus,
}

/// A bookmarked problem
///
/// Company and problem identifiers are denormalized so the UI can rebuild
/// a link to the problem without fetching either parent record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub problem_id: String,
    pub company_slug: String,
    pub problem_title: String,
    pub bookmarked_at: DateTime<Utc>,
}

/// A free-form education history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub id: String,
    pub school: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_year: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// A free-form work history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkEntry {
    pub id: String,
    pub company: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
