// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Single-entity write operations
//!
//! Writes go straight to the entity store and finish by invalidating the
//! affected cache tags, each exactly once. Uniqueness conflicts on the
//! normalized keys resolve as update-instead-of-insert rather than errors.

use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;

use crate::cache::tags::{company_tag, problems_tag, user_tag, Tag, COMPANIES_TAG};
use crate::cache::QueryCache;
use crate::clock::Clock;
use crate::error::{CatalogError, CatalogResult};
use crate::model::{
    normalize_key, Bookmark, Company, Difficulty, EducationEntry, Problem, ProblemStatus,
    RecencyBucket, StatusRecord, WorkEntry,
};
use crate::reconcile::engine::diff_company;
use crate::storage::{
    from_document, to_document, ConditionOp, EntityStore, ListQuery, Patch, user_collection,
    COMPANIES, PROBLEMS,
};
use crate::validate::{check_year_range, clean_tags, normalize_optional_url, normalize_url, require};

/// Input for adding one company
#[derive(Debug, Clone, Default)]
pub struct NewCompany {
    pub name: String,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub website_url: Option<String>,
}

/// Input for adding one problem
///
/// Difficulty and recency arrive as raw text, mirroring what the submission
/// form produces.
#[derive(Debug, Clone, Default)]
pub struct NewProblem {
    pub company_id: String,
    pub title: String,
    pub difficulty: String,
    pub link: String,
    pub tags: Vec<String>,
    pub recency: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewEducationEntry {
    pub school: String,
    pub degree: Option<String>,
    pub field: Option<String>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct NewWorkEntry {
    pub company: String,
    pub title: String,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub description: Option<String>,
}

/// Raw writes plus their cache invalidations
pub struct CatalogWriter {
    store: Arc<dyn EntityStore>,
    cache: Arc<QueryCache>,
    clock: Arc<dyn Clock>,
}

impl CatalogWriter {
    pub fn new(store: Arc<dyn EntityStore>, cache: Arc<QueryCache>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            cache,
            clock,
        }
    }

    /// Add a company, or update the existing one with the same name
    ///
    /// Name matching is case-insensitive on the normalized name, so this
    /// can never create a duplicate; a no-op resubmission leaves the store
    /// and the cache untouched.
    pub fn add_company(&self, input: NewCompany) -> CatalogResult<Company> {
        let name = require("Company name", &input.name).map_err(CatalogError::Validation)?;
        let logo_url = normalize_optional_url("logo", input.logo_url.as_deref())
            .map_err(CatalogError::Validation)?;
        let description = input
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from);
        let website_url = normalize_optional_url("website", input.website_url.as_deref())
            .map_err(CatalogError::Validation)?;

        match self.find_company_by_name(&name)? {
            Some(existing) => {
                let patch = diff_company(&existing, &name, &logo_url, &description, &website_url);
                if patch.is_empty() {
                    return Ok(existing);
                }

                self.store.update(COMPANIES, &existing.id, &patch)?;
                self.invalidate(&[COMPANIES_TAG.to_string(), company_tag(&existing.id)]);

                let mut updated = existing;
                updated.rename(&name);
                updated.logo_url = logo_url;
                updated.description = description;
                updated.website_url = website_url;
                Ok(updated)
            }
            None => {
                let mut company = Company::new(uuid::Uuid::new_v4().to_string(), &name);
                company.logo_url = logo_url;
                company.description = description;
                company.website_url = website_url;

                self.store.insert(COMPANIES, to_document(&company)?)?;
                self.invalidate(&[COMPANIES_TAG.to_string(), company_tag(&company.id)]);
                Ok(company)
            }
        }
    }

    /// Add a problem, or refresh the recency bucket of the existing one
    ///
    /// `(company_id, normalized_title)` is unique: a resubmission of the
    /// same title under the same company updates the existing record's
    /// recency bucket instead of inserting a duplicate.
    pub fn add_problem(&self, input: NewProblem) -> CatalogResult<Problem> {
        let company_doc = self
            .store
            .get(COMPANIES, &input.company_id)?
            .ok_or_else(|| CatalogError::NotFound(format!("company {}", input.company_id)))?;
        let company: Company = from_document(company_doc)?;

        let title = require("Problem title", &input.title).map_err(CatalogError::Validation)?;
        let difficulty =
            Difficulty::from_str(&input.difficulty).map_err(CatalogError::Validation)?;
        let link = require("Problem link", &input.link)
            .and_then(|link| normalize_url("link", &link))
            .map_err(CatalogError::Validation)?;
        let tags = clean_tags(&input.tags);
        let recency = match input.recency.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(RecencyBucket::from_str(raw).map_err(CatalogError::Validation)?),
        };

        match self.find_problem_by_title(&company.id, &title)? {
            Some(existing) => {
                if existing.recency != recency {
                    let mut patch = Patch::new();
                    match recency {
                        Some(bucket) => patch.set("recency", json!(bucket)),
                        None => patch.delete("recency"),
                    }
                    self.store.update(PROBLEMS, &existing.id, &patch)?;
                    self.invalidate(&[problems_tag(&company.id)]);
                }

                let mut updated = existing;
                updated.recency = recency;
                Ok(updated)
            }
            None => {
                let mut problem = Problem::new(
                    uuid::Uuid::new_v4().to_string(),
                    &company.id,
                    &company.slug,
                    &title,
                    difficulty,
                    &link,
                );
                problem.tags = tags;
                problem.recency = recency;

                self.store.insert(PROBLEMS, to_document(&problem)?)?;
                self.invalidate(&[problems_tag(&company.id)]);
                Ok(problem)
            }
        }
    }

    /// Toggle a bookmark; returns whether the problem is now bookmarked
    pub fn toggle_bookmark(&self, user_id: &str, problem_id: &str) -> CatalogResult<bool> {
        let user_id = require("User id", user_id).map_err(CatalogError::Validation)?;
        let problem = self.get_problem(problem_id)?;

        let collection = user_collection(&user_id, "bookmarks");
        let bookmarked = if self.store.get(&collection, problem_id)?.is_some() {
            self.store.remove(&collection, problem_id)?;
            false
        } else {
            let bookmark = Bookmark {
                problem_id: problem.id.clone(),
                company_slug: problem.company_slug.clone(),
                problem_title: problem.title.clone(),
                bookmarked_at: self.clock.now(),
            };
            let mut document = to_document(&bookmark)?;
            document.insert("id".to_string(), json!(problem.id));
            self.store.insert(&collection, document)?;
            true
        };

        self.invalidate(&[user_tag(&user_id)]);
        Ok(bookmarked)
    }

    /// Set a problem's status for a user; setting the current status again
    /// clears it back to "none". Returns the resulting status.
    pub fn set_problem_status(
        &self,
        user_id: &str,
        problem_id: &str,
        status: ProblemStatus,
    ) -> CatalogResult<Option<ProblemStatus>> {
        let user_id = require("User id", user_id).map_err(CatalogError::Validation)?;
        let problem = self.get_problem(problem_id)?;

        let collection = user_collection(&user_id, "statuses");
        let current = match self.store.get(&collection, problem_id)? {
            Some(document) => Some(from_document::<StatusRecord>(document)?.status),
            None => None,
        };

        let result = if current == Some(status) {
            self.store.remove(&collection, problem_id)?;
            None
        } else {
            let record = StatusRecord {
                id: problem.id.clone(),
                status,
            };
            self.store.insert(&collection, to_document(&record)?)?;
            Some(status)
        };

        self.invalidate(&[user_tag(&user_id)]);
        Ok(result)
    }

    pub fn add_education_entry(
        &self,
        user_id: &str,
        input: NewEducationEntry,
    ) -> CatalogResult<EducationEntry> {
        let user_id = require("User id", user_id).map_err(CatalogError::Validation)?;
        let school = require("School", &input.school).map_err(CatalogError::Validation)?;
        check_year_range(input.start_year, input.end_year).map_err(CatalogError::Validation)?;

        let entry = EducationEntry {
            id: uuid::Uuid::new_v4().to_string(),
            school,
            degree: trimmed(input.degree),
            field: trimmed(input.field),
            start_year: input.start_year,
            end_year: input.end_year,
            created_at: self.clock.now(),
        };

        let collection = user_collection(&user_id, "education");
        self.store.insert(&collection, to_document(&entry)?)?;
        self.invalidate(&[user_tag(&user_id)]);
        Ok(entry)
    }

    pub fn add_work_entry(&self, user_id: &str, input: NewWorkEntry) -> CatalogResult<WorkEntry> {
        let user_id = require("User id", user_id).map_err(CatalogError::Validation)?;
        let company = require("Company", &input.company).map_err(CatalogError::Validation)?;
        let title = require("Job title", &input.title).map_err(CatalogError::Validation)?;
        check_year_range(input.start_year, input.end_year).map_err(CatalogError::Validation)?;

        let entry = WorkEntry {
            id: uuid::Uuid::new_v4().to_string(),
            company,
            title,
            start_year: input.start_year,
            end_year: input.end_year,
            description: trimmed(input.description),
            created_at: self.clock.now(),
        };

        let collection = user_collection(&user_id, "work");
        self.store.insert(&collection, to_document(&entry)?)?;
        self.invalidate(&[user_tag(&user_id)]);
        Ok(entry)
    }

    fn find_company_by_name(&self, name: &str) -> CatalogResult<Option<Company>> {
        let query = ListQuery::new().filter(
            "normalized_name",
            ConditionOp::Eq,
            json!(normalize_key(name)),
        );
        let mut documents = self.store.list(COMPANIES, &query)?;
        match documents.pop() {
            Some(document) => Ok(Some(from_document(document)?)),
            None => Ok(None),
        }
    }

    fn find_problem_by_title(
        &self,
        company_id: &str,
        title: &str,
    ) -> CatalogResult<Option<Problem>> {
        let query = ListQuery::new()
            .filter("company_id", ConditionOp::Eq, json!(company_id))
            .filter("normalized_title", ConditionOp::Eq, json!(normalize_key(title)));
        let mut documents = self.store.list(PROBLEMS, &query)?;
        match documents.pop() {
            Some(document) => Ok(Some(from_document(document)?)),
            None => Ok(None),
        }
    }

    fn get_problem(&self, problem_id: &str) -> CatalogResult<Problem> {
        let document = self
            .store
            .get(PROBLEMS, problem_id)?
            .ok_or_else(|| CatalogError::NotFound(format!("problem {}", problem_id)))?;
        from_document(document)
    }

    fn invalidate(&self, tags: &[Tag]) {
        for tag in tags {
            self.cache.invalidate(tag);
        }
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}
