// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Cached read operations
//!
//! Every read goes through the query cache under a deterministic key and
//! the tags produced by `tags_for`, falling through to the entity store on
//! a miss. Writes never pass through here; see `writer`.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::{cache_key, tags_for, QueryCache, ReadOp};
use crate::config::CatalogConfig;
use crate::error::CatalogResult;
use crate::model::{
    normalize_key, Bookmark, Company, Difficulty, EducationEntry, Problem, ProblemStatus,
    RecencyBucket, StatusRecord, WorkEntry,
};
use crate::paging::{cursor_paginate, paginate, CursorPage, Page};
use crate::search::{filter_companies, prefix_conditions};
use crate::storage::{
    from_document, ConditionOp, EntityStore, ListQuery, user_collection, COMPANIES, PROBLEMS,
};

/// Field carrying the company sort/search key
const NORMALIZED_NAME: &str = "normalized_name";

/// Optional narrowing applied to a company's problem listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProblemFilters {
    pub difficulty: Option<Difficulty>,
    pub recency: Option<RecencyBucket>,
    /// Prefix match on the normalized title
    pub search: Option<String>,
}

/// A problem as presented to one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemView {
    #[serde(flatten)]
    pub problem: Problem,
    pub bookmarked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProblemStatus>,
}

/// Cached reader over the two entity collections and user sub-records
pub struct CatalogReader {
    store: Arc<dyn EntityStore>,
    cache: Arc<QueryCache>,
    config: CatalogConfig,
}

impl CatalogReader {
    pub fn new(store: Arc<dyn EntityStore>, cache: Arc<QueryCache>, config: CatalogConfig) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    /// Page-number listing over the (possibly filtered) company list
    pub fn list_companies(
        &self,
        page: usize,
        page_size: usize,
        search_term: Option<&str>,
    ) -> CatalogResult<Page<Company>> {
        let all = self.companies_sorted()?;
        let filtered = filter_companies(&all, search_term.unwrap_or(""));
        Ok(paginate(
            filtered,
            page,
            self.effective_page_size(page_size),
            self.config.max_page_size,
        ))
    }

    /// Cursor listing over the company list, keyed by normalized name
    ///
    /// Only the name-prefix filter applies here: the description pass has
    /// no stable position in a normalized-name cursor walk.
    pub fn list_companies_cursor(
        &self,
        cursor: Option<&str>,
        page_size: usize,
        search_term: Option<&str>,
    ) -> CatalogResult<CursorPage<Company>> {
        let term = normalize_key(search_term.unwrap_or(""));
        let op = ReadOp::CompaniesCursor {
            cursor,
            page_size,
            term: &term,
        };

        self.cache.cached(&cache_key(&op), &tags_for(&op), None, || {
            let mut query = ListQuery::new().order_by(NORMALIZED_NAME);
            if !term.is_empty() {
                query.conditions.extend(prefix_conditions(NORMALIZED_NAME, &term));
            }
            if let Some(cursor) = cursor {
                query = query.filter(NORMALIZED_NAME, ConditionOp::Gt, json!(cursor));
            }

            let documents = self.store.list(COMPANIES, &query)?;
            let companies = documents
                .into_iter()
                .map(from_document::<Company>)
                .collect::<CatalogResult<Vec<_>>>()?;

            cursor_paginate(
                companies,
                cursor,
                page_size,
                self.config.max_page_size,
                |company| company.normalized_name.as_str(),
            )
        })
    }

    pub fn get_company_by_slug(&self, slug: &str) -> CatalogResult<Option<Company>> {
        let companies = self.companies_sorted()?;
        Ok(companies.into_iter().find(|c| c.slug == slug))
    }

    /// Page-number listing of one company's problems, optionally augmented
    /// with the calling user's bookmark and status state
    pub fn list_problems_for_company(
        &self,
        company_id: &str,
        page: usize,
        page_size: usize,
        filters: &ProblemFilters,
        user_id: Option<&str>,
    ) -> CatalogResult<Page<ProblemView>> {
        let problems = self.problems_for_company(company_id)?;

        let term = filters
            .search
            .as_deref()
            .map(normalize_key)
            .unwrap_or_default();
        let filtered: Vec<Problem> = problems
            .into_iter()
            .filter(|p| filters.difficulty.map_or(true, |d| p.difficulty == d))
            .filter(|p| filters.recency.map_or(true, |r| p.recency == Some(r)))
            .filter(|p| term.is_empty() || p.normalized_title.starts_with(&term))
            .collect();

        let page = paginate(
            filtered,
            page,
            self.effective_page_size(page_size),
            self.config.max_page_size,
        );

        let (bookmarks, statuses) = match user_id {
            Some(user_id) => (self.user_bookmarks(user_id)?, self.user_statuses(user_id)?),
            None => (HashMap::new(), HashMap::new()),
        };

        Ok(Page {
            items: page
                .items
                .into_iter()
                .map(|problem| ProblemView {
                    bookmarked: bookmarks.contains_key(&problem.id),
                    status: statuses.get(&problem.id).copied(),
                    problem,
                })
                .collect(),
            total_items: page.total_items,
            total_pages: page.total_pages,
            current_page: page.current_page,
        })
    }

    /// An unspecified page size falls back to the configured default
    fn effective_page_size(&self, page_size: usize) -> usize {
        if page_size == 0 {
            self.config.default_page_size
        } else {
            page_size
        }
    }

    /// The full company list ordered by normalized name, cached as one unit
    pub fn companies_sorted(&self) -> CatalogResult<Vec<Company>> {
        let op = ReadOp::Companies;
        self.cache.cached(&cache_key(&op), &tags_for(&op), None, || {
            let query = ListQuery::new().order_by(NORMALIZED_NAME);
            let documents = self.store.list(COMPANIES, &query)?;
            documents
                .into_iter()
                .map(from_document::<Company>)
                .collect()
        })
    }

    /// One company's full problem set ordered by normalized title
    pub fn problems_for_company(&self, company_id: &str) -> CatalogResult<Vec<Problem>> {
        let op = ReadOp::ProblemsForCompany { company_id };
        self.cache.cached(&cache_key(&op), &tags_for(&op), None, || {
            let query = ListQuery::new()
                .filter("company_id", ConditionOp::Eq, json!(company_id))
                .order_by("normalized_title");
            let documents = self.store.list(PROBLEMS, &query)?;
            documents
                .into_iter()
                .map(from_document::<Problem>)
                .collect()
        })
    }

    /// The user's bookmark set, keyed by problem id
    pub fn user_bookmarks(&self, user_id: &str) -> CatalogResult<HashMap<String, Bookmark>> {
        let op = ReadOp::UserBookmarks { user_id };
        self.cache.cached(&cache_key(&op), &tags_for(&op), None, || {
            let collection = user_collection(user_id, "bookmarks");
            let documents = self.store.list(&collection, &ListQuery::new())?;
            let mut bookmarks = HashMap::with_capacity(documents.len());
            for document in documents {
                let bookmark: Bookmark = from_document(document)?;
                bookmarks.insert(bookmark.problem_id.clone(), bookmark);
            }
            Ok(bookmarks)
        })
    }

    /// The user's status map; problems absent from it have no status
    pub fn user_statuses(&self, user_id: &str) -> CatalogResult<HashMap<String, ProblemStatus>> {
        let op = ReadOp::UserStatuses { user_id };
        self.cache.cached(&cache_key(&op), &tags_for(&op), None, || {
            let collection = user_collection(user_id, "statuses");
            let documents = self.store.list(&collection, &ListQuery::new())?;
            let mut statuses = HashMap::with_capacity(documents.len());
            for document in documents {
                let record: StatusRecord = from_document(document)?;
                statuses.insert(record.id, record.status);
            }
            Ok(statuses)
        })
    }

    /// Education history, most recent entry first
    pub fn list_education(&self, user_id: &str) -> CatalogResult<Vec<EducationEntry>> {
        let op = ReadOp::UserEducation { user_id };
        self.cache.cached(&cache_key(&op), &tags_for(&op), None, || {
            let collection = user_collection(user_id, "education");
            let documents = self.store.list(&collection, &ListQuery::new())?;
            let mut entries = documents
                .into_iter()
                .map(from_document::<EducationEntry>)
                .collect::<CatalogResult<Vec<_>>>()?;
            entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(entries)
        })
    }

    /// Work history, most recent entry first
    pub fn list_work(&self, user_id: &str) -> CatalogResult<Vec<WorkEntry>> {
        let op = ReadOp::UserWork { user_id };
        self.cache.cached(&cache_key(&op), &tags_for(&op), None, || {
            let collection = user_collection(user_id, "work");
            let documents = self.store.list(&collection, &ListQuery::new())?;
            let mut entries = documents
                .into_iter()
                .map(from_document::<WorkEntry>)
                .collect::<CatalogResult<Vec<_>>>()?;
            entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(entries)
        })
    }
}
