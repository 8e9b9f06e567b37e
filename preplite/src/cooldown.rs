// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Cooldown gate
//!
//! A persisted, timestamp-based rate limiter guarding expensive external
//! calls. The gate has two states, Available and Cooling; the deadline is
//! persisted through a key-value port so it survives restarts, and a stale
//! deadline left over from a previous run is corrected lazily on the first
//! query rather than waiting for a tick.

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::clock::Clock;
use crate::error::{CatalogError, CatalogResult};

/// Key under which the deadline is persisted
const DEADLINE_KEY: &str = "cooldown_deadline";

/// Generic persisted key-value port
///
/// Backed by whatever local persistence the embedding platform has:
/// a file, an embedded database, an OS keychain.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> CatalogResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> CatalogResult<()>;
    fn remove(&self, key: &str) -> CatalogResult<()>;
}

/// In-memory key-value store for testing
pub struct MemoryKeyValueStore {
    data: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> CatalogResult<Option<String>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CatalogResult<()> {
        self.data.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CatalogResult<()> {
        self.data.write().remove(key);
        Ok(())
    }
}

/// JSON-file-backed key-value store
///
/// The whole map is rewritten on every mutation; the data is a handful of
/// small values, not a dataset.
pub struct FileKeyValueStore {
    path: PathBuf,
    data: RwLock<HashMap<String, String>>,
}

impl FileKeyValueStore {
    pub fn open(path: impl Into<PathBuf>) -> CatalogResult<Self> {
        let path = path.into();
        let data = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                CatalogError::Store(format!("corrupt state file {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    fn persist(&self, data: &HashMap<String, String>) -> CatalogResult<()> {
        let bytes = serde_json::to_vec_pretty(data)?;
        std::fs::write(&self.path, bytes)?;
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> CatalogResult<Option<String>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CatalogResult<()> {
        let mut data = self.data.write();
        data.insert(key.to_string(), value.to_string());
        self.persist(&data)
    }

    fn remove(&self, key: &str) -> CatalogResult<()> {
        let mut data = self.data.write();
        data.remove(key);
        self.persist(&data)
    }
}

/// The gate's two states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownState {
    Available,
    Cooling,
}

/// Snapshot handed to countdown renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownStatus {
    pub state: CooldownState,
    pub remaining: Duration,
}

/// Persisted cooldown gate
pub struct CooldownGate {
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    duration: Duration,
}

impl CooldownGate {
    pub fn new(kv: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, duration: Duration) -> Self {
        Self {
            kv,
            clock,
            duration,
        }
    }

    /// Whether the guarded call may run now
    ///
    /// A persisted deadline already in the past is cleared here, so a stale
    /// deadline from a previous run reads as Available on the very first
    /// query after load.
    pub fn can_use(&self) -> CatalogResult<bool> {
        Ok(self.deadline()?.is_none())
    }

    /// Enter the Cooling state, recording `now + duration`
    pub fn start_cooldown(&self) -> CatalogResult<()> {
        let deadline = self.clock.now() + chrono::Duration::from_std(self.duration)
            .map_err(|e| CatalogError::Configuration(format!("cooldown duration: {}", e)))?;
        self.kv
            .set(DEADLINE_KEY, &deadline.timestamp_millis().to_string())?;
        log::debug!("cooldown started, expires at {}", deadline);
        Ok(())
    }

    /// Time left until the gate opens; zero when Available
    pub fn remaining(&self) -> CatalogResult<Duration> {
        match self.deadline()? {
            Some(deadline) => {
                let left = deadline - self.clock.now();
                Ok(left.to_std().unwrap_or(Duration::ZERO))
            }
            None => Ok(Duration::ZERO),
        }
    }

    pub fn status(&self) -> CatalogResult<CooldownStatus> {
        let remaining = self.remaining()?;
        let state = if remaining.is_zero() {
            CooldownState::Available
        } else {
            CooldownState::Cooling
        };
        Ok(CooldownStatus { state, remaining })
    }

    /// The active deadline, clearing it if it has already passed
    fn deadline(&self) -> CatalogResult<Option<DateTime<Utc>>> {
        let raw = match self.kv.get(DEADLINE_KEY)? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let deadline = raw
            .parse::<i64>()
            .ok()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single());

        match deadline {
            Some(deadline) if deadline > self.clock.now() => Ok(Some(deadline)),
            Some(_) => {
                log::debug!("clearing expired cooldown deadline");
                self.kv.remove(DEADLINE_KEY)?;
                Ok(None)
            }
            None => {
                log::warn!("clearing unreadable cooldown deadline: {}", raw);
                self.kv.remove(DEADLINE_KEY)?;
                Ok(None)
            }
        }
    }
}

/// Recurring countdown timer for one gate
///
/// Runs a single background timer invoking the callback once per tick with
/// the current status. Dropping the ticker stops the timer; no timer
/// outlives its gate's consumers.
pub struct CooldownTicker {
    stop: mpsc::Sender<()>,
    handle: Option<thread::JoinHandle<()>>,
}

impl CooldownTicker {
    pub fn spawn<F>(gate: Arc<CooldownGate>, tick: Duration, on_tick: F) -> Self
    where
        F: Fn(CooldownStatus) + Send + 'static,
    {
        let (stop, stopped) = mpsc::channel();
        let handle = thread::spawn(move || loop {
            match stopped.recv_timeout(tick) {
                Err(mpsc::RecvTimeoutError::Timeout) => match gate.status() {
                    Ok(status) => on_tick(status),
                    Err(e) => log::warn!("cooldown tick failed: {}", e),
                },
                _ => break,
            }
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }
}

impl Drop for CooldownTicker {
    fn drop(&mut self) {
        let _ = self.stop.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn gate_with_clock() -> (CooldownGate, Arc<ManualClock>, Arc<MemoryKeyValueStore>) {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let clock = Arc::new(ManualClock::fixed());
        let gate = CooldownGate::new(kv.clone(), clock.clone(), Duration::from_secs(300));
        (gate, clock, kv)
    }

    #[test]
    fn test_start_cooldown_blocks_until_deadline() {
        let (gate, clock, _) = gate_with_clock();
        assert!(gate.can_use().unwrap());

        gate.start_cooldown().unwrap();
        assert!(!gate.can_use().unwrap());

        clock.advance(Duration::from_secs(299));
        assert!(!gate.can_use().unwrap());

        clock.advance(Duration::from_secs(2));
        assert!(gate.can_use().unwrap());
    }

    #[test]
    fn test_stale_deadline_cleared_on_load() {
        let (gate, clock, kv) = gate_with_clock();

        // Deadline persisted by a previous run, already in the past
        let past = clock.now() - chrono::Duration::seconds(60);
        kv.set(DEADLINE_KEY, &past.timestamp_millis().to_string())
            .unwrap();

        assert!(gate.can_use().unwrap());
        assert!(kv.get(DEADLINE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_unreadable_deadline_cleared() {
        let (gate, _, kv) = gate_with_clock();
        kv.set(DEADLINE_KEY, "not-a-timestamp").unwrap();
        assert!(gate.can_use().unwrap());
        assert!(kv.get(DEADLINE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_remaining_counts_down() {
        let (gate, clock, _) = gate_with_clock();
        gate.start_cooldown().unwrap();

        assert_eq!(gate.remaining().unwrap(), Duration::from_secs(300));
        clock.advance(Duration::from_secs(100));
        assert_eq!(gate.remaining().unwrap(), Duration::from_secs(200));

        let status = gate.status().unwrap();
        assert_eq!(status.state, CooldownState::Cooling);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gate.json");
        let clock = Arc::new(ManualClock::fixed());

        {
            let kv = Arc::new(FileKeyValueStore::open(&path).unwrap());
            let gate = CooldownGate::new(kv, clock.clone(), Duration::from_secs(300));
            gate.start_cooldown().unwrap();
        }

        let kv = Arc::new(FileKeyValueStore::open(&path).unwrap());
        let gate = CooldownGate::new(kv, clock, Duration::from_secs(300));
        assert!(!gate.can_use().unwrap());
    }

    #[test]
    fn test_ticker_fires_and_stops_on_drop() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let (gate, _, _) = gate_with_clock();
        let gate = Arc::new(gate);
        let ticks = Arc::new(AtomicUsize::new(0));

        let counter = ticks.clone();
        let ticker = CooldownTicker::spawn(gate, Duration::from_millis(10), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        std::thread::sleep(Duration::from_millis(100));
        drop(ticker);
        let after_drop = ticks.load(Ordering::SeqCst);
        assert!(after_drop >= 1, "ticker never fired");

        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(ticks.load(Ordering::SeqCst), after_drop);
    }
}
