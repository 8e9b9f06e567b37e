//! Test fixture for PrepLite integration tests
//!
//! Builds an isolated coordinator over an in-memory store with a manually
//! advanced clock. Tests drive only the public CatalogCoordinator API.

use preplite::{
    CatalogConfig, CatalogCoordinator, CompanyRow, ManualClock, MemoryStore, ProblemRow,
};
use std::sync::Arc;

/// Test fixture with an isolated in-memory catalog
pub struct TestFixture {
    pub coordinator: CatalogCoordinator,
    pub clock: Arc<ManualClock>,
}

impl TestFixture {
    /// Create an empty fixture
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::fixed());
        let coordinator =
            CatalogCoordinator::with_clock(store, CatalogConfig::default(), clock.clone())
                .expect("Failed to create coordinator");

        Self { coordinator, clock }
    }

    /// Create a fixture pre-seeded with companies of the given names
    pub fn with_companies(names: &[&str]) -> Self {
        let fixture = Self::new();
        fixture.seed_companies(names);
        fixture
    }

    /// Seed companies through the public bulk-reconcile path
    pub fn seed_companies(&self, names: &[&str]) {
        let rows = names
            .iter()
            .map(|name| CompanyRow {
                name: name.to_string(),
                ..Default::default()
            })
            .collect();

        let report = self
            .coordinator
            .bulk_reconcile_companies(rows)
            .expect("Failed to reconcile seed companies");
        assert_eq!(report.errors, 0, "seed companies must not fail: {:?}", report.rows);
    }

    /// Seed one problem under a company (by company display name)
    pub fn seed_problem(&self, company: &str, title: &str, difficulty: &str) {
        self.seed_problem_full(company, title, difficulty, &[], None);
    }

    pub fn seed_problem_full(
        &self,
        company: &str,
        title: &str,
        difficulty: &str,
        tags: &[&str],
        recency: Option<&str>,
    ) {
        let row = ProblemRow {
            company: company.to_string(),
            title: title.to_string(),
            difficulty: difficulty.to_string(),
            link: format!("https://problems.example.com/{}", preplite::slugify(title)),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            recency: recency.map(String::from),
        };

        let report = self
            .coordinator
            .bulk_reconcile_problems(vec![row])
            .expect("Failed to reconcile seed problem");
        assert_eq!(report.errors, 0, "seed problem must not fail: {:?}", report.rows);
    }

    /// Look up a seeded company's id by display name
    pub fn company_id(&self, name: &str) -> String {
        let key = preplite::normalize_key(name);
        self.coordinator
            .list_companies(1, 50, None)
            .expect("Failed to list companies")
            .items
            .into_iter()
            .find(|c| c.normalized_name == key)
            .map(|c| c.id)
            .expect("company not seeded")
    }

    /// A user id unique to this test run
    pub fn unique_user(&self) -> String {
        format!("user_{}", fastrand::u64(..))
    }
}
