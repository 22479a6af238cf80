//! Cache Statistics Module
//!
//! Point-in-time snapshot of the cache contents plus lifetime counters.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot returned by `TtlCache::stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Entries that would be served right now
    pub valid: usize,
    /// Entries past their expiry that no read has evicted yet
    pub expired: usize,
    /// All stored entries (`valid + expired`)
    pub total: usize,
    /// Number of `get` calls that returned a value
    pub hits: u64,
    /// Number of `get` calls that returned nothing
    pub misses: u64,
    /// Number of entries dropped by the capacity bound
    pub evictions: u64,
}

impl CacheStats {
    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Counters ==
/// Mutable counters kept by the store between snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Counters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl Counters {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }
}
