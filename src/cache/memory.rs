//! In-process cache backings.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, SystemTime};

use super::{CacheKey, CacheStats, CacheStore, Clock, SystemClock};
use crate::explanation::Explanation;

struct CacheEntry {
    /// Serialised explanation
    snapshot: String,
    created_at: SystemTime,
}

impl CacheEntry {
    fn is_valid(&self, now: SystemTime, ttl: Duration) -> bool {
        // A clock that moved backwards yields an age of zero
        let age = now.duration_since(self.created_at).unwrap_or_default();
        age < ttl
    }
}

/// TTL-gated in-memory cache.
///
/// Expiry is lazy: stale entries stay in the map until overwritten, cleared,
/// evicted for capacity, or removed by [`CacheStore::purge_expired`].
pub struct MemoryCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
    max_entries: Option<usize>,
    clock: Arc<dyn Clock>,
}

impl MemoryCache {
    /// Unbounded cache with the given TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_entries: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Bound the number of stored entries (at least one)
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries.max(1));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    fn evict_if_needed(&self, entries: &mut HashMap<CacheKey, CacheEntry>, now: SystemTime) {
        let Some(max_entries) = self.max_entries else {
            return;
        };
        if entries.len() < max_entries {
            return;
        }

        entries.retain(|_, e| e.is_valid(now, self.ttl));
        while entries.len() >= max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.created_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(key) => {
                    tracing::debug!(key = %key, "evicting oldest cache entry");
                    entries.remove(&key);
                }
                None => break,
            }
        }
    }

    #[cfg(test)]
    fn insert_raw(&self, key: &CacheKey, snapshot: &str) {
        self.write().insert(
            key.clone(),
            CacheEntry {
                snapshot: snapshot.to_string(),
                created_at: self.clock.now(),
            },
        );
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<Explanation> {
        let entries = self.read();
        let entry = entries.get(key)?;

        if !entry.is_valid(self.clock.now(), self.ttl) {
            tracing::debug!(key = %key, "cache entry expired");
            return None;
        }

        match serde_json::from_str(&entry.snapshot) {
            Ok(explanation) => Some(explanation),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "discarding unreadable cache entry");
                None
            }
        }
    }

    fn set(&self, key: &CacheKey, explanation: &Explanation) {
        let snapshot = match serde_json::to_string(explanation) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "could not serialise explanation for cache");
                return;
            }
        };

        let now = self.clock.now();
        let mut entries = self.write();
        if !entries.contains_key(key) {
            self.evict_if_needed(&mut entries, now);
        }
        entries.insert(
            key.clone(),
            CacheEntry {
                snapshot,
                created_at: now,
            },
        );
    }

    fn clear(&self) {
        self.write().clear();
    }

    fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let entries = self.read();
        CacheStats {
            enabled: true,
            size: entries.len(),
            ttl_secs: self.ttl.as_secs(),
            valid_entries: entries
                .values()
                .filter(|e| e.is_valid(now, self.ttl))
                .count(),
        }
    }

    fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, e| e.is_valid(now, self.ttl));
        before - entries.len()
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Cache that stores nothing
#[derive(Debug, Default)]
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        Self
    }
}

impl CacheStore for NullCache {
    fn get(&self, _: &CacheKey) -> Option<Explanation> {
        None
    }

    fn set(&self, _: &CacheKey, _: &Explanation) {}

    fn clear(&self) {}

    fn stats(&self) -> CacheStats {
        CacheStats {
            enabled: false,
            size: 0,
            ttl_secs: 0,
            valid_entries: 0,
        }
    }

    fn name(&self) -> &'static str {
        "null"
    }
}
