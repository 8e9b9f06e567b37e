// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog Coordinator - the public entry point
//!
//! Composes the cached reader, the raw writer, the reconciliation engine
//! and the stats recalculator over one shared store, cache and clock.
//! Reads are served through the query cache; writes invalidate the affected
//! tags exactly once before returning. Single-entity mutations surface
//! failures as structured results the UI can render directly, never as
//! panics.

use serde::Serialize;
use std::sync::Arc;

use crate::cache::{CacheStats, QueryCache};
use crate::clock::{Clock, SystemClock};
use crate::config::CatalogConfig;
use crate::cooldown::{CooldownGate, KeyValueStore};
use crate::error::{CatalogError, CatalogResult};
use crate::model::{Bookmark, Company, EducationEntry, ProblemStatus, WorkEntry};
use crate::paging::{CursorPage, Page};
use crate::reader::{CatalogReader, ProblemFilters, ProblemView};
use crate::reconcile::{CompanyRow, ProblemRow, ReconcileEngine, ReconcileReport};
use crate::stats::{StatsRecalculator, SweepReport};
use crate::storage::EntityStore;
use crate::writer::{
    CatalogWriter, NewCompany, NewEducationEntry, NewProblem, NewWorkEntry,
};
use std::collections::HashMap;

/// Structured outcome of a single-entity mutation
///
/// Carries the specific validation message ("Invalid website URL: ...")
/// rather than a generic failure string, so forms can render it verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }

    fn from_result<T>(result: CatalogResult<T>) -> Self {
        match result {
            Ok(_) => Self::ok(),
            Err(e) => {
                log::warn!("operation failed: {}", e);
                Self::fail(user_message(&e))
            }
        }
    }
}

/// Field-level messages stand alone; other errors keep their category prefix
fn user_message(error: &CatalogError) -> String {
    match error {
        CatalogError::Validation(message) => message.clone(),
        other => other.to_string(),
    }
}

/// Catalog Coordinator - orchestrates reads, writes and reconciliation
///
/// This is the main entry point for embedding the catalog core. It owns
/// the query cache and guarantees the coherence invariant: a read issued
/// after a completed write observes that write.
pub struct CatalogCoordinator {
    store: Arc<dyn EntityStore>,
    cache: Arc<QueryCache>,
    clock: Arc<dyn Clock>,
    config: CatalogConfig,
    reader: CatalogReader,
    writer: CatalogWriter,
}

impl CatalogCoordinator {
    /// Create a coordinator over a store with the system clock
    pub fn new(store: Arc<dyn EntityStore>, config: CatalogConfig) -> CatalogResult<Self> {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Create a coordinator with an injected clock
    pub fn with_clock(
        store: Arc<dyn EntityStore>,
        config: CatalogConfig,
        clock: Arc<dyn Clock>,
    ) -> CatalogResult<Self> {
        config.validate()?;

        let cache = Arc::new(QueryCache::new(config.cache_ttl));
        let reader = CatalogReader::new(store.clone(), cache.clone(), config.clone());
        let writer = CatalogWriter::new(store.clone(), cache.clone(), clock.clone());

        Ok(Self {
            store,
            cache,
            clock,
            config,
            reader,
            writer,
        })
    }

    /// Create a coordinator over a sled database at the given path
    ///
    /// This is the recommended way to embed the catalog engine: it
    /// initializes the storage driver and all internal components.
    #[cfg(feature = "sled-backend")]
    pub fn from_path(path: impl AsRef<std::path::Path>) -> CatalogResult<Self> {
        let store = Arc::new(crate::storage::SledStore::open(path)?);
        Self::new(store, CatalogConfig::default())
    }

    // ------------------------------------------------------------------
    // Reads (served through the query cache)
    // ------------------------------------------------------------------

    pub fn list_companies(
        &self,
        page: usize,
        page_size: usize,
        search_term: Option<&str>,
    ) -> CatalogResult<Page<Company>> {
        self.reader.list_companies(page, page_size, search_term)
    }

    pub fn list_companies_cursor(
        &self,
        cursor: Option<&str>,
        page_size: usize,
        search_term: Option<&str>,
    ) -> CatalogResult<CursorPage<Company>> {
        self.reader
            .list_companies_cursor(cursor, page_size, search_term)
    }

    pub fn get_company_by_slug(&self, slug: &str) -> CatalogResult<Option<Company>> {
        self.reader.get_company_by_slug(slug)
    }

    pub fn list_problems_for_company(
        &self,
        company_id: &str,
        page: usize,
        page_size: usize,
        filters: &ProblemFilters,
        user_id: Option<&str>,
    ) -> CatalogResult<Page<ProblemView>> {
        self.reader
            .list_problems_for_company(company_id, page, page_size, filters, user_id)
    }

    pub fn user_bookmarks(&self, user_id: &str) -> CatalogResult<HashMap<String, Bookmark>> {
        self.reader.user_bookmarks(user_id)
    }

    pub fn user_statuses(&self, user_id: &str) -> CatalogResult<HashMap<String, ProblemStatus>> {
        self.reader.user_statuses(user_id)
    }

    pub fn list_education(&self, user_id: &str) -> CatalogResult<Vec<EducationEntry>> {
        self.reader.list_education(user_id)
    }

    pub fn list_work(&self, user_id: &str) -> CatalogResult<Vec<WorkEntry>> {
        self.reader.list_work(user_id)
    }

    // ------------------------------------------------------------------
    // Single-entity writes
    // ------------------------------------------------------------------

    pub fn add_company(&self, input: NewCompany) -> ActionResult {
        ActionResult::from_result(self.writer.add_company(input))
    }

    pub fn add_problem(&self, input: NewProblem) -> ActionResult {
        ActionResult::from_result(self.writer.add_problem(input))
    }

    pub fn toggle_bookmark(&self, user_id: &str, problem_id: &str) -> ActionResult {
        ActionResult::from_result(self.writer.toggle_bookmark(user_id, problem_id))
    }

    pub fn set_problem_status(
        &self,
        user_id: &str,
        problem_id: &str,
        status: ProblemStatus,
    ) -> ActionResult {
        ActionResult::from_result(self.writer.set_problem_status(user_id, problem_id, status))
    }

    pub fn add_education_entry(&self, user_id: &str, input: NewEducationEntry) -> ActionResult {
        ActionResult::from_result(self.writer.add_education_entry(user_id, input))
    }

    pub fn add_work_entry(&self, user_id: &str, input: NewWorkEntry) -> ActionResult {
        ActionResult::from_result(self.writer.add_work_entry(user_id, input))
    }

    // ------------------------------------------------------------------
    // Batch operations
    // ------------------------------------------------------------------

    /// Reconcile a batch of company rows; always returns the full audit
    pub fn bulk_reconcile_companies(
        &self,
        rows: Vec<CompanyRow>,
    ) -> CatalogResult<ReconcileReport> {
        let engine = ReconcileEngine::new(self.store.as_ref());
        let outcome = engine.run_companies(rows)?;
        self.invalidate_batch(&outcome.affected_tags);
        Ok(outcome.report)
    }

    /// Reconcile a batch of problem rows; always returns the full audit
    pub fn bulk_reconcile_problems(&self, rows: Vec<ProblemRow>) -> CatalogResult<ReconcileReport> {
        let engine = ReconcileEngine::new(self.store.as_ref());
        let outcome = engine.run_problems(rows)?;
        self.invalidate_batch(&outcome.affected_tags);
        Ok(outcome.report)
    }

    /// Recompute the denormalized aggregates of one company
    pub fn recalculate_company_aggregates(&self, company_id: &str) -> CatalogResult<()> {
        let recalculator = StatsRecalculator::new(
            self.store.as_ref(),
            self.clock.as_ref(),
            self.config.top_tag_count,
        );
        recalculator.recalculate_company(company_id)?;
        self.invalidate_batch(&[
            crate::cache::COMPANIES_TAG.to_string(),
            crate::cache::tags::company_tag(company_id),
        ]);
        Ok(())
    }

    /// Recompute aggregates for every company, accumulating per-company errors
    pub fn recalculate_all_aggregates(&self) -> CatalogResult<SweepReport> {
        let recalculator = StatsRecalculator::new(
            self.store.as_ref(),
            self.clock.as_ref(),
            self.config.top_tag_count,
        );
        let outcome = recalculator.recalculate_all()?;
        self.invalidate_batch(&outcome.affected_tags);
        Ok(outcome.report)
    }

    // ------------------------------------------------------------------
    // Auxiliary
    // ------------------------------------------------------------------

    /// Build a cooldown gate sharing this coordinator's clock and config
    pub fn cooldown_gate(&self, kv: Arc<dyn KeyValueStore>) -> CooldownGate {
        CooldownGate::new(kv, self.clock.clone(), self.config.cooldown_duration)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Invalidate a batch's tag set, each tag exactly once
    fn invalidate_batch(&self, tags: &[String]) {
        for tag in tags {
            self.cache.invalidate(tag);
        }
    }
}
