// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! PrepLite - A lightweight interview-prep catalog engine
//!
//! PrepLite is the data-access core of an interview-prep catalog browser:
//! two entity collections (companies and their problems), user-scoped
//! progress records, and the machinery a browsing UI needs on top.
//!
//! # Features
//!
//! - **Coherent caching**: reads are memoized under deterministic keys and
//!   tagged for invalidation; a read issued after a completed write always
//!   observes the write
//! - **Stable pagination**: page-number mode over materialized lists and
//!   cursor mode over a sorted key for infinite scroll
//! - **Prefix-range search**: case-insensitive prefix matching with a
//!   secondary description-substring pass
//! - **Bulk reconciliation**: imports classified row-by-row into
//!   added/updated/skipped/error with a complete audit report
//! - **Aggregate recalculation**: idempotent recomputation of per-company
//!   statistics from the problem set
//! - **Cooldown gate**: a persisted, clock-driven limiter for expensive
//!   external calls
//!
//! # Usage
//!
//! ```ignore
//! use preplite::{CatalogCoordinator, CompanyRow};
//!
//! let coordinator = CatalogCoordinator::from_path("./catalog-db")?;
//!
//! let report = coordinator.bulk_reconcile_companies(vec![
//!     CompanyRow { name: "Acme".into(), ..Default::default() },
//! ])?;
//!
//! let page = coordinator.list_companies(1, 20, Some("acm"))?;
//! ```

// Public modules - exposed to external users
pub mod coordinator;
pub mod cooldown;

// Internal modules - only visible within the preplite crate
pub(crate) mod cache;
pub(crate) mod clock;
pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod model;
pub(crate) mod paging;
pub(crate) mod reader;
pub(crate) mod reconcile;
pub(crate) mod search;
pub(crate) mod stats;
pub(crate) mod storage;
pub(crate) mod validate;
pub(crate) mod writer;

// Re-export the public API - CatalogCoordinator is the entry point
pub use coordinator::{ActionResult, CatalogCoordinator};
pub use cooldown::{
    CooldownGate, CooldownState, CooldownStatus, CooldownTicker, FileKeyValueStore, KeyValueStore,
    MemoryKeyValueStore,
};

pub use cache::{CacheStats, QueryCache, ReadOp, Tag, cache_key, tags_for, COMPANIES_TAG};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CatalogConfig, PAGE_SIZE_LIMIT};
pub use error::{CatalogError, CatalogResult};
pub use model::{
    normalize_key, slugify, Bookmark, Company, Difficulty, DifficultyCounts, EducationEntry,
    Problem, ProblemStatus, RecencyBucket, RecencyCounts, TagCount, WorkEntry,
};
pub use paging::{CursorPage, Page};
pub use reader::{ProblemFilters, ProblemView};
pub use reconcile::{
    CompanyRow, ProblemRow, ReconcileEngine, ReconcileOutcome, ReconcileReport, RowOutcome,
    RowStatus,
};
pub use stats::SweepReport;
pub use storage::{
    Condition, ConditionOp, Document, EntityStore, ListQuery, MemoryStore, OrderBy, Patch, PatchOp,
    WriteOp,
};
#[cfg(feature = "sled-backend")]
pub use storage::SledStore;
pub use writer::{NewCompany, NewEducationEntry, NewProblem, NewWorkEntry};

/// PrepLite version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// PrepLite crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
