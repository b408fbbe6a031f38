//! Cache Statistics Module
//!
//! Read and expiry counters, plus how often the durable mirror let us down.

use serde::Serialize;

// == Cache Stats ==
/// Counters kept by a [`TtlCache`](crate::cache::TtlCache) over its lifetime.
///
/// Hydration does not count as a hit or a miss; only `get` does.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Expired entries dropped on access or by a purge
    pub expirations: u64,
    /// Durable-medium errors swallowed by the cache
    pub persist_failures: u64,
    /// In-memory entries, expired ones not yet touched included
    pub total_entries: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share of `get` calls answered from the cache, 0.0 before any call.
    pub fn hit_rate(&self) -> f64 {
        match self.hits + self.misses {
            0 => 0.0,
            reads => self.hits as f64 / reads as f64,
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    pub fn record_persist_failure(&mut self) {
        self.persist_failures += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
