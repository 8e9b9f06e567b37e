// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog configuration and recognized options

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{CatalogError, CatalogResult};

/// Hard upper bound for page sizes in both pagination modes
pub const PAGE_SIZE_LIMIT: usize = 50;

/// Global catalog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Number of items per page when the caller does not specify one
    pub default_page_size: usize,

    /// Upper bound for page sizes, clamped to [1, PAGE_SIZE_LIMIT]
    pub max_page_size: usize,

    /// Number of top tags kept on each company aggregate
    pub top_tag_count: usize,

    /// Fallback TTL for cached reads (explicit invalidation is primary)
    pub cache_ttl: Duration,

    /// Cooldown window guarding expensive external calls
    pub cooldown_duration: Duration,

    /// Cooldown ticker period, used for countdown rendering
    pub cooldown_tick: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: PAGE_SIZE_LIMIT,
            top_tag_count: 7,
            cache_ttl: Duration::from_secs(300),
            cooldown_duration: Duration::from_secs(300), // 5 minutes
            cooldown_tick: Duration::from_secs(1),
        }
    }
}

impl CatalogConfig {
    /// Validate the configuration
    pub fn validate(&self) -> CatalogResult<()> {
        if self.max_page_size == 0 || self.max_page_size > PAGE_SIZE_LIMIT {
            return Err(CatalogError::Configuration(format!(
                "max_page_size must be within [1, {}], got {}",
                PAGE_SIZE_LIMIT, self.max_page_size
            )));
        }

        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(CatalogError::Configuration(format!(
                "default_page_size must be within [1, {}], got {}",
                self.max_page_size, self.default_page_size
            )));
        }

        if self.top_tag_count == 0 {
            return Err(CatalogError::Configuration(
                "top_tag_count must be at least 1".to_string(),
            ));
        }

        if self.cooldown_tick.is_zero() {
            return Err(CatalogError::Configuration(
                "cooldown_tick must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}
