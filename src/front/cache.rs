//! Time-bound cache of read responses.
//!
//! Entries are checked lazily: a read older than the TTL is a miss, but the
//! entry stays resident until it is overwritten, invalidated, or the process
//! restarts. The key space (topics and item ids) is small and finite.

use crate::common::utils::recover;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    stored_at: Instant,
}

#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.get_at(key, Instant::now())
    }

    /// Lookup as of `now`. Valid iff `now - stored_at < ttl`.
    pub fn get_at(&self, key: &str, now: Instant) -> Option<Value> {
        recover(self.entries.lock())
            .get(key)
            .filter(|entry| now.saturating_duration_since(entry.stored_at) < self.ttl)
            .map(|entry| entry.value.clone())
    }

    pub fn put(&self, key: impl Into<String>, value: Value) {
        self.put_at(key, value, Instant::now());
    }

    pub fn put_at(&self, key: impl Into<String>, value: Value, now: Instant) {
        recover(self.entries.lock()).insert(
            key.into(),
            CacheEntry {
                value,
                stored_at: now,
            },
        );
    }

    /// Remove `key`. Returns whether an entry was resident.
    pub fn invalidate(&self, key: &str) -> bool {
        recover(self.entries.lock()).remove(key).is_some()
    }

    /// Resident entries, expired ones included
    pub fn len(&self) -> usize {
        recover(self.entries.lock()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
