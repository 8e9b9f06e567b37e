// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Problem records, difficulty and recency enums

use serde::{Deserialize, Serialize};

use super::normalize_key;

/// Problem difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(format!(
                "Unknown difficulty: {}. Valid options: easy, medium, hard",
                s
            )),
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        };
        write!(f, "{}", name)
    }
}

/// One of four fixed submission-recency periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecencyBucket {
    ThirtyDays,
    ThreeMonths,
    SixMonths,
    MoreThanSixMonths,
}

impl std::str::FromStr for RecencyBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "thirty-days" | "30-days" => Ok(RecencyBucket::ThirtyDays),
            "three-months" => Ok(RecencyBucket::ThreeMonths),
            "six-months" => Ok(RecencyBucket::SixMonths),
            "more-than-six-months" => Ok(RecencyBucket::MoreThanSixMonths),
            _ => Err(format!(
                "Unknown recency period: {}. Valid options: thirty-days, three-months, \
                 six-months, more-than-six-months",
                s
            )),
        }
    }
}

impl std::fmt::Display for RecencyBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RecencyBucket::ThirtyDays => "thirty-days",
            RecencyBucket::ThreeMonths => "three-months",
            RecencyBucket::SixMonths => "six-months",
            RecencyBucket::MoreThanSixMonths => "more-than-six-months",
        };
        write!(f, "{}", name)
    }
}

/// An interview problem owned by a company
///
/// `(company_id, normalized_title)` is unique: submitting the same title
/// under the same company a second time updates the existing record instead
/// of inserting a duplicate. `company_slug` is denormalized for link
/// reconstruction without a second lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub id: String,
    pub company_id: String,
    pub company_slug: String,
    pub title: String,
    pub normalized_title: String,
    pub difficulty: Difficulty,
    /// Canonical external link; always an absolute http/https URL
    pub link: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recency: Option<RecencyBucket>,
}

impl Problem {
    pub fn new(
        id: impl Into<String>,
        company_id: impl Into<String>,
        company_slug: impl Into<String>,
        title: impl Into<String>,
        difficulty: Difficulty,
        link: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let normalized_title = normalize_key(&title);

        Self {
            id: id.into(),
            company_id: company_id.into(),
            company_slug: company_slug.into(),
            title,
            normalized_title,
            difficulty,
            link: link.into(),
            tags: Vec::new(),
            recency: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_difficulty_parse_roundtrip() {
        assert_eq!(Difficulty::from_str("Easy").unwrap(), Difficulty::Easy);
        assert_eq!(Difficulty::from_str(" hard ").unwrap(), Difficulty::Hard);
        assert!(Difficulty::from_str("extreme").is_err());
    }

    #[test]
    fn test_recency_parse() {
        assert_eq!(
            RecencyBucket::from_str("thirty-days").unwrap(),
            RecencyBucket::ThirtyDays
        );
        assert_eq!(
            RecencyBucket::from_str("more-than-six-months").unwrap(),
            RecencyBucket::MoreThanSixMonths
        );
        assert!(RecencyBucket::from_str("last-week").is_err());
    }

    #[test]
    fn test_new_problem_normalizes_title() {
        let problem = Problem::new("p1", "c1", "acme", "Two Sum", Difficulty::Easy, "https://x.com");
        assert_eq!(problem.normalized_title, "two sum");
        assert!(problem.recency.is_none());
    }
}
