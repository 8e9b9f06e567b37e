#![cfg(feature = "sled-backend")]
//! Tests for the sled-backed store: durability across reopen and the
//! from_path bootstrap path

use preplite::{CatalogCoordinator, CompanyRow, ProblemRow};
use std::path::PathBuf;

struct SledFixture {
    coordinator: CatalogCoordinator,
    path: PathBuf,
    _temp_dir: tempfile::TempDir,
}

impl SledFixture {
    fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir
            .path()
            .join(format!("catalog_{}", fastrand::u64(..)));
        let coordinator =
            CatalogCoordinator::from_path(&path).expect("Failed to open sled catalog");

        Self {
            coordinator,
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Drop the open database and open a fresh coordinator on the same path
    fn reopen(self) -> Self {
        let Self {
            coordinator,
            path,
            _temp_dir,
        } = self;
        drop(coordinator);

        let coordinator =
            CatalogCoordinator::from_path(&path).expect("Failed to reopen sled catalog");
        Self {
            coordinator,
            path,
            _temp_dir,
        }
    }
}

#[test]
fn test_catalog_survives_reopen() {
    let fixture = SledFixture::new();

    let report = fixture
        .coordinator
        .bulk_reconcile_companies(vec![
            CompanyRow {
                name: "Acme".to_string(),
                logo_url: Some("x.com/l.png".to_string()),
                ..Default::default()
            },
            CompanyRow {
                name: "Beta".to_string(),
                ..Default::default()
            },
        ])
        .unwrap();
    assert_eq!(report.added, 2);

    let fixture = fixture.reopen();

    let page = fixture.coordinator.list_companies(1, 10, None).unwrap();
    assert_eq!(page.total_items, 2);
    assert_eq!(
        page.items[0].logo_url.as_deref(),
        Some("https://x.com/l.png")
    );
}

#[test]
fn test_aggregates_persist_across_reopen() {
    let fixture = SledFixture::new();
    fixture
        .coordinator
        .bulk_reconcile_companies(vec![CompanyRow {
            name: "Acme".to_string(),
            ..Default::default()
        }])
        .unwrap();
    fixture
        .coordinator
        .bulk_reconcile_problems(vec![
            ProblemRow {
                company: "Acme".to_string(),
                title: "Two Sum".to_string(),
                difficulty: "easy".to_string(),
                link: "problems.example.com/two-sum".to_string(),
                tags: vec!["array".to_string()],
                recency: Some("thirty-days".to_string()),
            },
            ProblemRow {
                company: "Acme".to_string(),
                title: "Graph Walk".to_string(),
                difficulty: "hard".to_string(),
                link: "problems.example.com/graph-walk".to_string(),
                ..Default::default()
            },
        ])
        .unwrap();

    fixture.coordinator.recalculate_all_aggregates().unwrap();

    let fixture = fixture.reopen();

    let company = fixture
        .coordinator
        .get_company_by_slug("acme")
        .unwrap()
        .unwrap();
    assert_eq!(company.problem_count, 2);
    assert_eq!(company.difficulty_counts.easy, 1);
    assert_eq!(company.difficulty_counts.hard, 1);
    assert_eq!(company.recency_counts.thirty_days, 1);
    assert_eq!(company.top_tags.len(), 1);
}

#[test]
fn test_reconcile_against_reopened_store_is_idempotent() {
    let rows = vec![CompanyRow {
        name: "Acme".to_string(),
        description: Some("widgets".to_string()),
        ..Default::default()
    }];

    let fixture = SledFixture::new();
    let first = fixture
        .coordinator
        .bulk_reconcile_companies(rows.clone())
        .unwrap();
    assert_eq!(first.added, 1);

    let fixture = fixture.reopen();
    let second = fixture.coordinator.bulk_reconcile_companies(rows).unwrap();
    assert_eq!(second.added, 0);
    assert_eq!(second.skipped, 1);
}
