// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Company records and their denormalized aggregates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{normalize_key, slugify};

/// Problem counts per difficulty bucket, denormalized onto a company
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyCounts {
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
}

/// Problem counts per recency bucket, denormalized onto a company
///
/// Problems without a recency value are excluded from all four buckets, so
/// these do not necessarily sum to `problem_count`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecencyCounts {
    pub thirty_days: u32,
    pub three_months: u32,
    pub six_months: u32,
    pub more_than_six_months: u32,
}

/// One entry of the top-tag aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: u32,
}

/// A company in the catalog
///
/// `normalized_name` is unique (case-insensitive) across all companies and
/// `slug` is derived deterministically from `name`; both are maintained
/// through [`Company::new`] and [`Company::rename`] so they never drift.
/// The aggregate fields are written only by the stats recalculator and are
/// eventually consistent with the problem collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    pub normalized_name: String,
    pub slug: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,

    #[serde(default)]
    pub problem_count: u32,
    #[serde(default)]
    pub difficulty_counts: DifficultyCounts,
    #[serde(default)]
    pub recency_counts: RecencyCounts,
    #[serde(default)]
    pub top_tags: Vec<TagCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_recalculated_at: Option<DateTime<Utc>>,
}

impl Company {
    /// Build a fresh company record with empty aggregates
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        let normalized_name = normalize_key(&name);
        let slug = slugify(&name);

        Self {
            id: id.into(),
            name,
            normalized_name,
            slug,
            logo_url: None,
            description: None,
            website_url: None,
            problem_count: 0,
            difficulty_counts: DifficultyCounts::default(),
            recency_counts: RecencyCounts::default(),
            top_tags: Vec::new(),
            stats_recalculated_at: None,
        }
    }

    /// Change the display name, keeping the derived keys in sync
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.normalized_name = normalize_key(&self.name);
        self.slug = slugify(&self.name);
    }
}
