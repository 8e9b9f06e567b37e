// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Memoizing query cache with tag-based invalidation

use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::tags::Tag;
use crate::error::CatalogResult;

/// One memoized read result
#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    tags: Vec<Tag>,
    inserted_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() > self.ttl
    }
}

/// Cache hit/miss counters
#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub expirations: u64,
    /// Entries dropped by explicit tag invalidation
    pub invalidations: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Memoizing query cache
///
/// Values are memoized in serialized form, so one cache serves reads of any
/// serde-compatible result type. Entries stay valid until their TTL elapses
/// or any of their tags is invalidated; invalidation wins over TTL. The tag
/// registry (tag -> keys) is owned by the cache itself rather than hidden in
/// per-call closures, so the invalidation surface is inspectable.
pub struct QueryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// Reverse index: tag -> keys of entries carrying it
    tag_index: RwLock<HashMap<Tag, HashSet<String>>>,
    /// Per-key guards collapsing concurrent misses into one load
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    stats: RwLock<CacheStats>,
    default_ttl: Duration,
}

impl QueryCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            tag_index: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            stats: RwLock::new(CacheStats::default()),
            default_ttl,
        }
    }

    /// Execute `load` and memoize its result under `key`
    ///
    /// Repeated calls with the same key return the memoized value without
    /// re-executing `load` until the TTL elapses or a tag is invalidated.
    /// A failed load is never memoized: the error propagates and the next
    /// call retries. Concurrent misses for the same key are collapsed into
    /// a single load; the waiters observe the winner's value.
    pub fn cached<T, F>(
        &self,
        key: &str,
        tags: &[Tag],
        ttl: Option<Duration>,
        load: F,
    ) -> CatalogResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> CatalogResult<T>,
    {
        if let Some(value) = self.lookup(key) {
            return Ok(serde_json::from_value(value)?);
        }

        let flight = {
            let mut in_flight = self.in_flight.lock();
            in_flight
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _guard = flight.lock();

        // Re-check: the flight we waited on may have populated the entry
        if let Some(value) = self.lookup(key) {
            self.in_flight.lock().remove(key);
            return Ok(serde_json::from_value(value)?);
        }

        let result = load();
        let outcome = match result {
            Ok(value) => match serde_json::to_value(&value) {
                Ok(json) => {
                    self.store(key, tags, ttl, json);
                    Ok(value)
                }
                Err(e) => Err(e.into()),
            },
            Err(e) => {
                log::debug!("cache load for '{}' failed, not memoizing: {}", key, e);
                Err(e)
            }
        };

        self.in_flight.lock().remove(key);
        outcome
    }

    /// Drop every entry carrying `tag`, returning how many were dropped
    ///
    /// After this returns, the next read under any dropped key re-executes
    /// its load regardless of remaining TTL.
    pub fn invalidate(&self, tag: &str) -> usize {
        let keys = match self.tag_index.write().remove(tag) {
            Some(keys) => keys,
            None => return 0,
        };

        let mut entries = self.entries.write();
        let mut tag_index = self.tag_index.write();
        let mut dropped = 0;

        for key in keys {
            if let Some(entry) = entries.remove(&key) {
                dropped += 1;
                // Unregister the entry from its other tags
                for other in &entry.tags {
                    if other != tag {
                        if let Some(set) = tag_index.get_mut(other) {
                            set.remove(&key);
                            if set.is_empty() {
                                tag_index.remove(other);
                            }
                        }
                    }
                }
            }
        }

        if dropped > 0 {
            log::debug!("invalidated {} cached entries for tag '{}'", dropped, tag);
            self.stats.write().invalidations += dropped as u64;
        }

        dropped
    }

    /// Drop all entries and tag registrations
    pub fn clear(&self) {
        self.entries.write().clear();
        self.tag_index.write().clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn lookup(&self, key: &str) -> Option<Value> {
        let expired = {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if !entry.is_expired() => {
                    let value = entry.value.clone();
                    drop(entries);
                    self.stats.write().hits += 1;
                    return Some(value);
                }
                Some(_) => true,
                None => false,
            }
        };

        if expired {
            self.evict(key);
            self.stats.write().expirations += 1;
        }
        self.stats.write().misses += 1;
        None
    }

    fn store(&self, key: &str, tags: &[Tag], ttl: Option<Duration>, value: Value) {
        let entry = CacheEntry {
            value,
            tags: tags.to_vec(),
            inserted_at: Instant::now(),
            ttl: ttl.unwrap_or(self.default_ttl),
        };

        {
            let mut tag_index = self.tag_index.write();
            for tag in tags {
                tag_index
                    .entry(tag.clone())
                    .or_default()
                    .insert(key.to_string());
            }
        }

        self.entries.write().insert(key.to_string(), entry);
        self.stats.write().insertions += 1;
    }

    fn evict(&self, key: &str) {
        let entry = self.entries.write().remove(key);
        if let Some(entry) = entry {
            let mut tag_index = self.tag_index.write();
            for tag in &entry.tags {
                if let Some(set) = tag_index.get_mut(tag) {
                    set.remove(key);
                    if set.is_empty() {
                        tag_index.remove(tag);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache() -> QueryCache {
        QueryCache::new(Duration::from_secs(300))
    }

    #[test]
    fn test_second_read_is_memoized() {
        let cache = cache();
        let loads = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: u32 = cache
                .cached("key", &["tag".to_string()], None, || {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .unwrap();
            assert_eq!(value, 42);
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().hits, 2);
    }

    #[test]
    fn test_invalidation_forces_reload() {
        let cache = cache();
        let loads = AtomicUsize::new(0);
        let load = |v: u32| {
            let loads = &loads;
            move || {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(v)
            }
        };

        let _: u32 = cache.cached("key", &["tag".to_string()], None, load(1)).unwrap();
        assert_eq!(cache.invalidate("tag"), 1);

        let value: u32 = cache.cached("key", &["tag".to_string()], None, load(2)).unwrap();
        assert_eq!(value, 2);
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_invalidation_is_scoped_to_the_tag() {
        let cache = cache();
        let _: u32 = cache.cached("a", &["t1".to_string()], None, || Ok(1)).unwrap();
        let _: u32 = cache.cached("b", &["t2".to_string()], None, || Ok(2)).unwrap();

        assert_eq!(cache.invalidate("t1"), 1);
        assert_eq!(cache.len(), 1);

        // "b" is still served from cache
        let value: u32 = cache
            .cached("b", &["t2".to_string()], None, || {
                Err(CatalogError::Store("should not reload".to_string()))
            })
            .unwrap();
        assert_eq!(value, 2);
    }

    #[test]
    fn test_errors_are_not_memoized() {
        let cache = cache();
        let loads = AtomicUsize::new(0);

        let first: CatalogResult<u32> = cache.cached("key", &[], None, || {
            loads.fetch_add(1, Ordering::SeqCst);
            Err(CatalogError::Store("boom".to_string()))
        });
        assert!(first.is_err());

        let second: u32 = cache
            .cached("key", &[], None, || {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            })
            .unwrap();
        assert_eq!(second, 7);
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_ttl_expiry_forces_reload() {
        let cache = QueryCache::new(Duration::from_millis(5));
        let loads = AtomicUsize::new(0);

        let _: u32 = cache
            .cached("key", &[], None, || {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(1)
            })
            .unwrap();

        std::thread::sleep(Duration::from_millis(20));

        let _: u32 = cache
            .cached("key", &[], None, || {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(2)
            })
            .unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn test_concurrent_misses_collapse_into_one_load() {
        let cache = Arc::new(QueryCache::new(Duration::from_secs(300)));
        let loads = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let loads = loads.clone();
                std::thread::spawn(move || {
                    let value: u32 = cache
                        .cached("key", &["tag".to_string()], None, || {
                            loads.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(Duration::from_millis(10));
                            Ok(99)
                        })
                        .unwrap();
                    value
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 99);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }
}
