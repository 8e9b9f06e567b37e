// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Aggregate stats recalculator
//!
//! Recomputes the denormalized statistics on a company from its full
//! problem set and writes them back in one atomic batch. Reads go straight
//! to the store: this runs adjacent to writes and must never trust a cached
//! view. Safe to re-run for every company in a fleet-wide sweep.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeSet;

use crate::cache::tags::{company_tag, Tag, COMPANIES_TAG};
use crate::clock::Clock;
use crate::error::{CatalogError, CatalogResult};
use crate::model::{
    Company, Difficulty, DifficultyCounts, Problem, RecencyBucket, RecencyCounts, TagCount,
};
use crate::storage::{
    from_document, ConditionOp, EntityStore, ListQuery, Patch, WriteOp, COMPANIES, PROBLEMS,
};

/// Result of a fleet-wide recalculation sweep
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub updated_count: usize,
    pub errors: Vec<String>,
}

/// Sweep report plus the invalidation tags touched by the sweep
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub report: SweepReport,
    pub affected_tags: Vec<Tag>,
}

/// Recomputes denormalized per-company statistics
pub struct StatsRecalculator<'a> {
    store: &'a dyn EntityStore,
    clock: &'a dyn Clock,
    top_tag_count: usize,
}

impl<'a> StatsRecalculator<'a> {
    pub fn new(store: &'a dyn EntityStore, clock: &'a dyn Clock, top_tag_count: usize) -> Self {
        Self {
            store,
            clock,
            top_tag_count,
        }
    }

    /// Recompute and persist the aggregates of one company
    ///
    /// All four aggregates, the corrected problem count and the
    /// recalculation timestamp land in a single atomic update, so a crash
    /// can never leave them inconsistent with each other.
    pub fn recalculate_company(&self, company_id: &str) -> CatalogResult<()> {
        let document = self
            .store
            .get(COMPANIES, company_id)?
            .ok_or_else(|| CatalogError::NotFound(format!("company {}", company_id)))?;
        let company: Company = from_document(document)?;

        let problems = self.problems_of(company_id)?;
        let aggregates = compute_aggregates(&problems, self.top_tag_count);

        let mut patch = Patch::new();
        patch.set("problem_count", json!(aggregates.problem_count));
        patch.set("difficulty_counts", json!(aggregates.difficulty_counts));
        patch.set("recency_counts", json!(aggregates.recency_counts));
        patch.set("top_tags", json!(aggregates.top_tags));
        patch.set("stats_recalculated_at", json!(self.clock.now()));

        self.store.batch_write(vec![WriteOp::Update {
            collection: COMPANIES.to_string(),
            id: company_id.to_string(),
            patch,
        }])?;

        log::debug!(
            "recalculated stats for {}: {} problems",
            company.name,
            aggregates.problem_count
        );

        Ok(())
    }

    /// Recompute aggregates for every company
    ///
    /// Per-company failures accumulate in the report; the sweep keeps going.
    pub fn recalculate_all(&self) -> CatalogResult<SweepOutcome> {
        let documents = self.store.list(COMPANIES, &ListQuery::new())?;

        let mut report = SweepReport::default();
        let mut tags: BTreeSet<Tag> = BTreeSet::new();

        for document in documents {
            let company: Company = match from_document(document) {
                Ok(company) => company,
                Err(e) => {
                    report.errors.push(e.to_string());
                    continue;
                }
            };

            match self.recalculate_company(&company.id) {
                Ok(()) => {
                    report.updated_count += 1;
                    tags.insert(COMPANIES_TAG.to_string());
                    tags.insert(company_tag(&company.id));
                }
                Err(e) => {
                    report.errors.push(format!("{}: {}", company.name, e));
                }
            }
        }

        log::info!(
            "aggregate sweep: {} companies updated, {} errors",
            report.updated_count,
            report.errors.len()
        );

        Ok(SweepOutcome {
            report,
            affected_tags: tags.into_iter().collect(),
        })
    }

    fn problems_of(&self, company_id: &str) -> CatalogResult<Vec<Problem>> {
        let query = ListQuery::new().filter("company_id", ConditionOp::Eq, json!(company_id));
        let documents = self.store.list(PROBLEMS, &query)?;
        documents.into_iter().map(from_document).collect()
    }
}

struct Aggregates {
    problem_count: u32,
    difficulty_counts: DifficultyCounts,
    recency_counts: RecencyCounts,
    top_tags: Vec<TagCount>,
}

/// Pure aggregate computation over a fetched problem set
///
/// Every problem lands in exactly one difficulty bucket; problems without a
/// recency value are excluded from all recency buckets. Top tags are
/// ordered by descending frequency, ties broken by first appearance in the
/// fetched set.
fn compute_aggregates(problems: &[Problem], top_tag_count: usize) -> Aggregates {
    let mut difficulty_counts = DifficultyCounts::default();
    let mut recency_counts = RecencyCounts::default();

    // tag -> (count, first-seen index)
    let mut tag_counts: Vec<(String, u32, usize)> = Vec::new();

    for problem in problems {
        match problem.difficulty {
            Difficulty::Easy => difficulty_counts.easy += 1,
            Difficulty::Medium => difficulty_counts.medium += 1,
            Difficulty::Hard => difficulty_counts.hard += 1,
        }

        match problem.recency {
            Some(RecencyBucket::ThirtyDays) => recency_counts.thirty_days += 1,
            Some(RecencyBucket::ThreeMonths) => recency_counts.three_months += 1,
            Some(RecencyBucket::SixMonths) => recency_counts.six_months += 1,
            Some(RecencyBucket::MoreThanSixMonths) => recency_counts.more_than_six_months += 1,
            None => {}
        }

        for tag in &problem.tags {
            match tag_counts.iter_mut().find(|(name, _, _)| name == tag) {
                Some((_, count, _)) => *count += 1,
                None => {
                    let first_seen = tag_counts.len();
                    tag_counts.push((tag.clone(), 1, first_seen));
                }
            }
        }
    }

    tag_counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    let top_tags = tag_counts
        .into_iter()
        .take(top_tag_count)
        .map(|(tag, count, _)| TagCount { tag, count })
        .collect();

    Aggregates {
        problem_count: problems.len() as u32,
        difficulty_counts,
        recency_counts,
        top_tags,
    }
}
