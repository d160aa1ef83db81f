//! Explanation service: cache lookup, client call, cache store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;

use crate::cache::{CacheKey, CacheStats, CacheStore, MemoryCache, NullCache};
use crate::client::ExplainerClient;
use crate::config::Config;
use crate::explanation::Explanation;
use crate::failure::FailureRecord;
use crate::parser;
use crate::providers::ProviderError;

type FlightTable = Mutex<HashMap<CacheKey, Arc<AsyncMutex<()>>>>;

/// Membership in the set of callers working on one key. The table entry is
/// removed when the last member leaves.
struct Flight<'a> {
    table: &'a FlightTable,
    key: CacheKey,
    gate: Arc<AsyncMutex<()>>,
}

impl<'a> Flight<'a> {
    fn join(table: &'a FlightTable, key: &CacheKey) -> Self {
        let mut flights = table.lock().unwrap_or_else(|e| e.into_inner());
        let gate = flights
            .entry(key.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();
        Self {
            table,
            key: key.clone(),
            gate,
        }
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        let mut flights = self.table.lock().unwrap_or_else(|e| e.into_inner());
        // Only the table and this member hold the gate
        if Arc::strong_count(&self.gate) == 2 {
            flights.remove(&self.key);
        }
    }
}

/// Produces explanations for failures, reusing cached ones.
///
/// Concurrent calls for the same failure share one upstream request: the
/// first caller asks the provider, later callers wait and read its result
/// from the cache.
pub struct ExplanationService {
    client: ExplainerClient,
    cache: Arc<dyn CacheStore>,
    cache_enabled: bool,
    cache_fallbacks: bool,
    in_flight: FlightTable,
}

impl ExplanationService {
    /// Service with caching enabled, fallbacks included
    pub fn new(client: ExplainerClient, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            client,
            cache,
            cache_enabled: true,
            cache_fallbacks: true,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Build the client and cache described by the configuration
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let client = ExplainerClient::from_config(config)?;

        let cache: Arc<dyn CacheStore> = if config.cache.enabled {
            let mut memory = MemoryCache::new(config.cache_ttl());
            if let Some(max_entries) = config.cache.max_entries {
                memory = memory.with_max_entries(max_entries);
            }
            Arc::new(memory)
        } else {
            Arc::new(NullCache::new())
        };

        Ok(Self::new(client, cache)
            .with_cache_enabled(config.cache.enabled)
            .with_cache_fallbacks(config.cache.cache_fallbacks))
    }

    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Whether fallback explanations are written to the cache
    pub fn with_cache_fallbacks(mut self, cache_fallbacks: bool) -> Self {
        self.cache_fallbacks = cache_fallbacks;
        self
    }

    /// Explain one failure. Always returns an explanation.
    pub async fn explain(&self, record: &FailureRecord) -> Explanation {
        if !self.cache_enabled {
            return self.client.explain(record).await;
        }

        let key = CacheKey::for_failure(record);
        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!(key = %key, "cache hit");
            return cached;
        }

        let flight = Flight::join(&self.in_flight, &key);
        let _turn = flight.gate.lock().await;

        // Another caller may have finished while we waited
        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!(key = %key, "cache filled by concurrent request");
            return cached;
        }

        tracing::debug!(key = %key, backend = self.cache.name(), "cache miss");
        let explanation = self.client.explain(record).await;
        self.store(&key, &explanation);
        explanation
    }

    /// Explain failures one at a time, preserving order
    pub async fn explain_all(&self, records: &[FailureRecord]) -> Vec<Explanation> {
        let mut explanations = Vec::with_capacity(records.len());
        for record in records {
            explanations.push(self.explain(record).await);
        }
        explanations
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            enabled: self.cache_enabled,
            ..self.cache.stats()
        }
    }

    fn store(&self, key: &CacheKey, explanation: &Explanation) {
        if !self.cache_fallbacks && parser::is_fallback(explanation) {
            tracing::debug!(key = %key, "not caching fallback explanation");
            return;
        }
        self.cache.set(key, explanation);
    }
}
