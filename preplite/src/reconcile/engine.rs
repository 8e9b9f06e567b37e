// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Reconciliation engine
//!
//! Existing records are loaded once per batch into an in-memory map keyed
//! by normalized key, so a batch costs O(existing + rows) lookups. Rows are
//! applied in input order; when two rows target the same entity the later
//! row diffs against the earlier row's result (last-write-wins). The engine
//! returns the deduplicated set of invalidation tags touched by the batch;
//! the caller invalidates each tag exactly once.

use serde_json::json;
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use super::{CompanyRow, ProblemRow, ReconcileReport, RowStatus};
use crate::cache::tags::{company_tag, problems_tag, Tag, COMPANIES_TAG};
use crate::error::CatalogResult;
use crate::model::{
    normalize_key, slugify, Company, Difficulty, Problem, RecencyBucket,
};
use crate::storage::{from_document, to_document, EntityStore, ListQuery, Patch, COMPANIES, PROBLEMS};
use crate::validate::{clean_tags, normalize_optional_url, normalize_url, require};

/// Per-row report plus the batch's deduplicated invalidation tags
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub report: ReconcileReport,
    pub affected_tags: Vec<Tag>,
}

/// Reconciles batches of raw rows against the entity store
pub struct ReconcileEngine<'a> {
    store: &'a dyn EntityStore,
}

impl<'a> ReconcileEngine<'a> {
    pub fn new(store: &'a dyn EntityStore) -> Self {
        Self { store }
    }

    /// Reconcile a batch of company rows
    pub fn run_companies(&self, rows: Vec<CompanyRow>) -> CatalogResult<ReconcileOutcome> {
        let mut existing = self.load_companies()?;

        let mut report = ReconcileReport::default();
        let mut tags: BTreeSet<Tag> = BTreeSet::new();

        for (index, row) in rows.into_iter().enumerate() {
            let identifier = row.name.trim().to_string();

            let parsed = parse_company_row(&row);
            let (name, logo_url, description, website_url) = match parsed {
                Ok(fields) => fields,
                Err(message) => {
                    report.record(index, identifier, RowStatus::Error, Some(message));
                    continue;
                }
            };

            let key = normalize_key(&name);
            match existing.get(&key) {
                Some(current) => {
                    let patch = diff_company(current, &name, &logo_url, &description, &website_url);
                    if patch.is_empty() {
                        report.record(index, identifier, RowStatus::Skipped, None);
                        continue;
                    }

                    match self.store.update(COMPANIES, &current.id, &patch) {
                        Ok(()) => {
                            let id = current.id.clone();
                            let mut updated = current.clone();
                            updated.rename(&name);
                            updated.logo_url = logo_url;
                            updated.description = description;
                            updated.website_url = website_url;
                            existing.insert(key, updated);

                            tags.insert(COMPANIES_TAG.to_string());
                            tags.insert(company_tag(&id));
                            report.record(
                                index,
                                identifier,
                                RowStatus::Updated,
                                Some(format!("{} field(s) changed", patch.len())),
                            );
                        }
                        Err(e) => {
                            report.record(index, identifier, RowStatus::Error, Some(e.to_string()));
                        }
                    }
                }
                None => {
                    let mut company = Company::new(uuid::Uuid::new_v4().to_string(), &name);
                    company.logo_url = logo_url;
                    company.description = description;
                    company.website_url = website_url;

                    let result = to_document(&company)
                        .and_then(|doc| self.store.insert(COMPANIES, doc));
                    match result {
                        Ok(id) => {
                            tags.insert(COMPANIES_TAG.to_string());
                            tags.insert(company_tag(&id));
                            existing.insert(key, company);
                            report.record(index, identifier, RowStatus::Added, None);
                        }
                        Err(e) => {
                            report.record(index, identifier, RowStatus::Error, Some(e.to_string()));
                        }
                    }
                }
            }
        }

        log::info!(
            "company reconciliation: added={} updated={} skipped={} errors={}",
            report.added,
            report.updated,
            report.skipped,
            report.errors
        );

        Ok(ReconcileOutcome {
            report,
            affected_tags: tags.into_iter().collect(),
        })
    }

    /// Reconcile a batch of problem rows
    pub fn run_problems(&self, rows: Vec<ProblemRow>) -> CatalogResult<ReconcileOutcome> {
        let companies = self.load_companies()?;
        let mut existing = self.load_problems()?;

        let mut report = ReconcileReport::default();
        let mut tags: BTreeSet<Tag> = BTreeSet::new();

        for (index, row) in rows.into_iter().enumerate() {
            let identifier = row.title.trim().to_string();

            let parsed = parse_problem_row(&row);
            let (company_name, title, difficulty, link, row_tags, recency) = match parsed {
                Ok(fields) => fields,
                Err(message) => {
                    report.record(index, identifier, RowStatus::Error, Some(message));
                    continue;
                }
            };

            let company = match companies.get(&normalize_key(&company_name)) {
                Some(company) => company,
                None => {
                    report.record(
                        index,
                        identifier,
                        RowStatus::Error,
                        Some(format!("Company not found: {}", company_name)),
                    );
                    continue;
                }
            };

            let key = (company.id.clone(), normalize_key(&title));
            match existing.get(&key) {
                Some(current) => {
                    let patch =
                        diff_problem(current, &title, difficulty, &link, &row_tags, recency);
                    if patch.is_empty() {
                        report.record(index, identifier, RowStatus::Skipped, None);
                        continue;
                    }

                    match self.store.update(PROBLEMS, &current.id, &patch) {
                        Ok(()) => {
                            let mut updated = current.clone();
                            updated.title = title;
                            updated.difficulty = difficulty;
                            updated.link = link;
                            updated.tags = row_tags;
                            updated.recency = recency;
                            existing.insert(key, updated);

                            tags.insert(problems_tag(&company.id));
                            report.record(
                                index,
                                identifier,
                                RowStatus::Updated,
                                Some(format!("{} field(s) changed", patch.len())),
                            );
                        }
                        Err(e) => {
                            report.record(index, identifier, RowStatus::Error, Some(e.to_string()));
                        }
                    }
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
                    problem.tags = row_tags;
                    problem.recency = recency;

                    let result = to_document(&problem)
                        .and_then(|doc| self.store.insert(PROBLEMS, doc));
                    match result {
                        Ok(_) => {
                            tags.insert(problems_tag(&company.id));
                            existing.insert(key, problem);
                            report.record(index, identifier, RowStatus::Added, None);
                        }
                        Err(e) => {
                            report.record(index, identifier, RowStatus::Error, Some(e.to_string()));
                        }
                    }
                }
            }
        }

        log::info!(
            "problem reconciliation: added={} updated={} skipped={} errors={}",
            report.added,
            report.updated,
            report.skipped,
            report.errors
        );

        Ok(ReconcileOutcome {
            report,
            affected_tags: tags.into_iter().collect(),
        })
    }

    fn load_companies(&self) -> CatalogResult<HashMap<String, Company>> {
        let documents = self.store.list(COMPANIES, &ListQuery::new())?;
        let mut map = HashMap::with_capacity(documents.len());
        for document in documents {
            let company: Company = from_document(document)?;
            map.insert(company.normalized_name.clone(), company);
        }
        Ok(map)
    }

    fn load_problems(&self) -> CatalogResult<HashMap<(String, String), Problem>> {
        let documents = self.store.list(PROBLEMS, &ListQuery::new())?;
        let mut map = HashMap::with_capacity(documents.len());
        for document in documents {
            let problem: Problem = from_document(document)?;
            map.insert(
                (problem.company_id.clone(), problem.normalized_title.clone()),
                problem,
            );
        }
        Ok(map)
    }
}

type CompanyFields = (String, Option<String>, Option<String>, Option<String>);

fn parse_company_row(row: &CompanyRow) -> Result<CompanyFields, String> {
    let name = require("Company name", &row.name)?;
    let logo_url = normalize_optional_url("logo", row.logo_url.as_deref())?;
    let description = row
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(String::from);
    let website_url = normalize_optional_url("website", row.website_url.as_deref())?;
    Ok((name, logo_url, description, website_url))
}

type ProblemFields = (
    String,
    String,
    Difficulty,
    String,
    Vec<String>,
    Option<RecencyBucket>,
);

fn parse_problem_row(row: &ProblemRow) -> Result<ProblemFields, String> {
    let company = require("Company name", &row.company)?;
    let title = require("Problem title", &row.title)?;
    let difficulty = Difficulty::from_str(&row.difficulty)?;
    let link = normalize_url("link", &require("Problem link", &row.link)?)?;
    let tags = clean_tags(&row.tags);

    let recency = match row.recency.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(RecencyBucket::from_str(raw)?),
    };

    Ok((company, title, difficulty, link, tags, recency))
}

/// Field-by-field diff of an incoming company row against the stored record
///
/// Cleared optional fields become explicit deletes so stale values never
/// survive an import that dropped them.
pub(crate) fn diff_company(
    current: &Company,
    name: &str,
    logo_url: &Option<String>,
    description: &Option<String>,
    website_url: &Option<String>,
) -> Patch {
    let mut patch = Patch::new();

    if current.name != name {
        patch.set("name", json!(name));
        patch.set("slug", json!(slugify(name)));
    }

    diff_optional(&mut patch, "logo_url", &current.logo_url, logo_url);
    diff_optional(&mut patch, "description", &current.description, description);
    diff_optional(&mut patch, "website_url", &current.website_url, website_url);

    patch
}

fn diff_problem(
    current: &Problem,
    title: &str,
    difficulty: Difficulty,
    link: &str,
    tags: &[String],
    recency: Option<RecencyBucket>,
) -> Patch {
    let mut patch = Patch::new();

    if current.title != title {
        patch.set("title", json!(title));
    }
    if current.difficulty != difficulty {
        patch.set("difficulty", json!(difficulty));
    }
    if current.link != link {
        patch.set("link", json!(link));
    }
    if current.tags != tags {
        patch.set("tags", json!(tags));
    }
    if current.recency != recency {
        match recency {
            Some(bucket) => patch.set("recency", json!(bucket)),
            None => patch.delete("recency"),
        }
    }

    patch
}

fn diff_optional(
    patch: &mut Patch,
    field: &str,
    current: &Option<String>,
    incoming: &Option<String>,
) {
    if current == incoming {
        return;
    }
    match incoming {
        Some(value) => patch.set(field, json!(value)),
        None => patch.delete(field),
    }
}
