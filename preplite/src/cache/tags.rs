// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Invalidation tags and cache key derivation
//!
//! Tags and keys are pure functions of the read operation being cached, so
//! the invalidation surface of every operation can be inspected and tested
//! without executing it.

/// Invalidation label attached to cached entries
pub type Tag = String;

/// Tag carried by every cached view of the company collection
pub const COMPANIES_TAG: &str = "companies";

/// Tag for cached views of one specific company
pub fn company_tag(company_id: &str) -> Tag {
    format!("company:{}", company_id)
}

/// Tag for cached views of one company's problem set
pub fn problems_tag(company_id: &str) -> Tag {
    format!("problems:{}", company_id)
}

/// Tag for all cached sub-records of one user
pub fn user_tag(user_id: &str) -> Tag {
    format!("user:{}", user_id)
}

/// Descriptor of one cached read operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOp<'a> {
    /// The full company list, ordered by normalized name
    Companies,
    /// One cursor-mode page of companies
    CompaniesCursor {
        cursor: Option<&'a str>,
        page_size: usize,
        term: &'a str,
    },
    /// The full problem set of one company, ordered by normalized title
    ProblemsForCompany { company_id: &'a str },
    UserBookmarks { user_id: &'a str },
    UserStatuses { user_id: &'a str },
    UserEducation { user_id: &'a str },
    UserWork { user_id: &'a str },
}

/// Pure mapping from a read operation to its invalidation tags
pub fn tags_for(op: &ReadOp) -> Vec<Tag> {
    match op {
        ReadOp::Companies | ReadOp::CompaniesCursor { .. } => vec![COMPANIES_TAG.to_string()],
        ReadOp::ProblemsForCompany { company_id } => vec![problems_tag(company_id)],
        ReadOp::UserBookmarks { user_id }
        | ReadOp::UserStatuses { user_id }
        | ReadOp::UserEducation { user_id }
        | ReadOp::UserWork { user_id } => vec![user_tag(user_id)],
    }
}

/// Deterministic cache key: a canonical signature of (operation, parameters)
pub fn cache_key(op: &ReadOp) -> String {
    match op {
        ReadOp::Companies => "companies:all".to_string(),
        ReadOp::CompaniesCursor {
            cursor,
            page_size,
            term,
        } => format!(
            "companies:cursor={}:size={}:term={}",
            cursor.unwrap_or(""),
            page_size,
            term
        ),
        ReadOp::ProblemsForCompany { company_id } => format!("problems:company={}", company_id),
        ReadOp::UserBookmarks { user_id } => format!("user:{}:bookmarks", user_id),
        ReadOp::UserStatuses { user_id } => format!("user:{}:statuses", user_id),
        ReadOp::UserEducation { user_id } => format!("user:{}:education", user_id),
        ReadOp::UserWork { user_id } => format!("user:{}:work", user_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_are_pure_functions_of_the_operation() {
        let op = ReadOp::ProblemsForCompany { company_id: "c1" };
        assert_eq!(tags_for(&op), tags_for(&op));
        assert_eq!(tags_for(&op), vec!["problems:c1".to_string()]);
    }

    #[test]
    fn test_company_views_share_the_collection_tag() {
        let all = ReadOp::Companies;
        let cursor = ReadOp::CompaniesCursor {
            cursor: Some("acme"),
            page_size: 10,
            term: "",
        };
        assert_eq!(tags_for(&all), vec![COMPANIES_TAG.to_string()]);
        assert_eq!(tags_for(&cursor), vec![COMPANIES_TAG.to_string()]);
    }

    #[test]
    fn test_user_views_share_the_user_tag() {
        let bookmarks = ReadOp::UserBookmarks { user_id: "u1" };
        let statuses = ReadOp::UserStatuses { user_id: "u1" };
        assert_eq!(tags_for(&bookmarks), tags_for(&statuses));
    }

    #[test]
    fn test_cache_keys_are_deterministic_and_distinct() {
        let first = ReadOp::CompaniesCursor {
            cursor: None,
            page_size: 2,
            term: "acme",
        };
        let second = ReadOp::CompaniesCursor {
            cursor: Some("acme corp"),
            page_size: 2,
            term: "acme",
        };
        assert_eq!(cache_key(&first), cache_key(&first));
        assert_ne!(cache_key(&first), cache_key(&second));
    }
}
