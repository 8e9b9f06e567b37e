// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query caching system
//!
//! This module provides:
//! - Memoized reads keyed by a deterministic (operation, parameters) signature
//! - Tag-based invalidation through an explicit tag -> keys registry
//! - TTL expiry as a fallback when no write triggers an invalidation
//! - Single-flight collapse of concurrent misses for the same key

pub mod query_cache;
pub mod tags;

pub use query_cache::{CacheStats, QueryCache};
pub use tags::{cache_key, tags_for, ReadOp, Tag, COMPANIES_TAG};
