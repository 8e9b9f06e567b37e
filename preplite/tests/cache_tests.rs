//! Tests for cache coherence across the public coordinator API
//!
//! The central invariant: a read issued after a completed write observes
//! that write; no stale hit survives an explicit invalidation.

#[path = "testutils/mod.rs"]
mod testutils;

use preplite::{CompanyRow, NewCompany, ProblemRow, ReadOp, tags_for};
use testutils::test_fixture::TestFixture;

#[test]
fn test_repeated_reads_hit_the_cache() {
    let fixture = TestFixture::with_companies(&["Acme", "Beta"]);

    let first = fixture.coordinator.list_companies(1, 10, None).unwrap();
    let stats_after_first = fixture.coordinator.cache_stats();

    let second = fixture.coordinator.list_companies(1, 10, None).unwrap();
    let stats_after_second = fixture.coordinator.cache_stats();

    assert_eq!(first.items, second.items);
    assert!(
        stats_after_second.hits > stats_after_first.hits,
        "second read should be served from cache"
    );
}

#[test]
fn test_read_after_write_observes_the_write() {
    let fixture = TestFixture::with_companies(&["Acme"]);

    // Warm the cache
    let page = fixture.coordinator.list_companies(1, 10, None).unwrap();
    assert_eq!(page.total_items, 1);

    // Write through the single-entity path, then read again
    let result = fixture.coordinator.add_company(NewCompany {
        name: "Beta".to_string(),
        ..Default::default()
    });
    assert!(result.success, "{:?}", result.error);

    let page = fixture.coordinator.list_companies(1, 10, None).unwrap();
    assert_eq!(page.total_items, 2);
    assert!(page.items.iter().any(|c| c.name == "Beta"));
}

#[test]
fn test_bulk_write_invalidates_company_views() {
    let fixture = TestFixture::with_companies(&["Acme"]);

    // Warm both company views
    fixture.coordinator.list_companies(1, 10, None).unwrap();
    fixture
        .coordinator
        .list_companies_cursor(None, 10, None)
        .unwrap();

    fixture
        .coordinator
        .bulk_reconcile_companies(vec![CompanyRow {
            name: "Gamma".to_string(),
            ..Default::default()
        }])
        .unwrap();

    let page = fixture.coordinator.list_companies(1, 10, None).unwrap();
    let cursor_page = fixture
        .coordinator
        .list_companies_cursor(None, 10, None)
        .unwrap();

    assert_eq!(page.total_items, 2);
    assert_eq!(cursor_page.items.len(), 2);
}

#[test]
fn test_problem_write_invalidates_only_that_company() {
    let fixture = TestFixture::with_companies(&["Acme", "Beta"]);
    fixture.seed_problem("Acme", "Two Sum", "easy");
    fixture.seed_problem("Beta", "Three Sum", "medium");

    let acme_id = fixture.company_id("Acme");
    let beta_id = fixture.company_id("Beta");
    let filters = Default::default();

    // Warm both problem views
    fixture
        .coordinator
        .list_problems_for_company(&acme_id, 1, 10, &filters, None)
        .unwrap();
    fixture
        .coordinator
        .list_problems_for_company(&beta_id, 1, 10, &filters, None)
        .unwrap();
    let warm = fixture.coordinator.cache_stats();

    // Write under Acme only
    fixture
        .coordinator
        .bulk_reconcile_problems(vec![ProblemRow {
            company: "Acme".to_string(),
            title: "Four Sum".to_string(),
            difficulty: "hard".to_string(),
            link: "https://problems.example.com/four-sum".to_string(),
            ..Default::default()
        }])
        .unwrap();

    // Acme reflects the write...
    let acme = fixture
        .coordinator
        .list_problems_for_company(&acme_id, 1, 10, &filters, None)
        .unwrap();
    assert_eq!(acme.total_items, 2);

    // ...while Beta's view is still served from cache
    let beta = fixture
        .coordinator
        .list_problems_for_company(&beta_id, 1, 10, &filters, None)
        .unwrap();
    assert_eq!(beta.total_items, 1);

    let after = fixture.coordinator.cache_stats();
    assert!(
        after.hits > warm.hits,
        "Beta's cached problem view should have survived Acme's write"
    );
}

#[test]
fn test_tag_vocabulary_is_stable() {
    // The invalidation surface is a pure function of the operation
    assert_eq!(tags_for(&ReadOp::Companies), vec!["companies".to_string()]);
    assert_eq!(
        tags_for(&ReadOp::ProblemsForCompany { company_id: "c9" }),
        vec!["problems:c9".to_string()]
    );
    assert_eq!(
        tags_for(&ReadOp::UserBookmarks { user_id: "u1" }),
        tags_for(&ReadOp::UserStatuses { user_id: "u1" })
    );
}
