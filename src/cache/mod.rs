//! Explanation caching.
//!
//! The service talks to a [`CacheStore`] so the backing can be swapped (the
//! bounded in-memory store, the no-op store, or something external) without
//! touching the pipeline.

pub mod key;
pub mod memory;

use serde::Serialize;
use std::time::SystemTime;

use crate::explanation::Explanation;

pub use key::CacheKey;
pub use memory::{MemoryCache, NullCache};

/// Default time-to-live for cached explanations, in seconds
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Snapshot of cache occupancy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub enabled: bool,
    /// Stored entries, including expired ones not yet overwritten
    pub size: usize,
    pub ttl_secs: u64,
    /// Entries still within their TTL
    pub valid_entries: usize,
}

/// Storage for explanations keyed by failure
pub trait CacheStore: Send + Sync {
    /// Cached explanation, unless absent, expired, or unreadable
    fn get(&self, key: &CacheKey) -> Option<Explanation>;

    /// Store an explanation, replacing any previous entry for the key
    fn set(&self, key: &CacheKey, explanation: &Explanation);

    fn clear(&self);

    fn stats(&self) -> CacheStats;

    /// Drop expired entries, returning how many were removed
    fn purge_expired(&self) -> usize {
        0
    }

    /// Backing name for logs
    fn name(&self) -> &'static str;
}

/// Wall-clock source for entry ages
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// The system wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}
