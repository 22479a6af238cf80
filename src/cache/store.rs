//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with TTL expiration and an
//! optional LRU capacity bound.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::cache::stats::Counters;
use crate::cache::{CacheEntry, CacheStats, Clock, LruTracker, SystemClock, DEFAULT_TTL};

/// A cache instance shared between the fetcher and whoever inspects it.
pub type SharedCache<V> = Arc<RwLock<TtlCache<V>>>;

// == TTL Cache ==
/// Key-value store whose entries disappear lazily once their TTL elapses.
///
/// Expired entries are never swept in the background; a `get` on an expired
/// key removes it and reports a miss. `stats` only reads.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// Access order, maintained only when a capacity bound is set
    lru: LruTracker,
    counters: Counters,
    max_entries: Option<usize>,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<V> TtlCache<V> {
    // == Constructor ==
    /// Creates an unbounded cache on the system clock.
    ///
    /// # Arguments
    /// * `default_ttl` - Lifetime used by `set_default`
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            counters: Counters::default(),
            max_entries: None,
            default_ttl,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Bounds the number of entries, evicting the least recently used key
    /// when a new key would exceed the bound.
    pub fn with_capacity(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries.max(1));
        self
    }

    /// Wraps the cache for sharing across components.
    pub fn into_shared(self) -> SharedCache<V> {
        Arc::new(RwLock::new(self))
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl`, replacing any previous entry.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();

        if let Some(max_entries) = self.max_entries {
            if !self.entries.contains_key(&key) && self.entries.len() >= max_entries {
                if let Some(evicted) = self.lru.evict_oldest() {
                    self.entries.remove(&evicted);
                    self.counters.record_eviction();
                    debug!(key = %evicted, "cache capacity reached, evicted least recently used entry");
                }
            }
            self.lru.touch(&key);
        }

        let entry = CacheEntry::new(value, self.clock.now_ms(), ttl);
        trace!(key = %key, expires_at = entry.expires_at, "cache set");
        self.entries.insert(key, entry);
    }

    /// Stores `value` under `key` with the default TTL.
    pub fn set_default(&mut self, key: impl Into<String>, value: V) {
        let ttl = self.default_ttl;
        self.set(key, value, ttl);
    }

    // == Remove ==
    /// Drops `key`, returning whether an entry (expired or not) was present.
    pub fn remove(&mut self, key: &str) -> bool {
        if self.max_entries.is_some() {
            self.lru.remove(key);
        }
        self.entries.remove(key).is_some()
    }

    // == Clear ==
    /// Drops every entry. Lifetime counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
    }

    // == Stats ==
    /// Counts valid and expired-but-not-yet-evicted entries without
    /// touching them.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now_ms();
        let expired = self
            .entries
            .values()
            .filter(|entry| entry.is_expired_at(now))
            .count();
        let total = self.entries.len();

        CacheStats {
            valid: total - expired,
            expired,
            total,
            hits: self.counters.hits,
            misses: self.counters.misses,
            evictions: self.counters.evictions,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> TtlCache<V> {
    // == Get ==
    /// Returns a clone of the value if the entry is still valid.
    ///
    /// An expired entry is removed as a side effect and counted as a miss.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();

        let expired = match self.entries.get(key) {
            None => {
                self.counters.record_miss();
                return None;
            }
            Some(entry) => entry.is_expired_at(now),
        };

        if expired {
            self.remove(key);
            self.counters.record_miss();
            debug!(key = %key, "cache entry expired, evicted on read");
            return None;
        }

        if self.max_entries.is_some() {
            self.lru.touch(key);
        }
        self.counters.record_hit();
        self.entries.get(key).map(|entry| entry.value.clone())
    }
}

// == Get Or Fetch ==
/// Returns the cached value for `key`, or runs `fetch`, caches its success
/// for `ttl` and returns it. Failures are passed through and not cached.
///
/// The lock is not held while `fetch` runs.
pub async fn get_or_fetch<V, F, Fut, E>(
    cache: &SharedCache<V>,
    key: &str,
    ttl: Duration,
    fetch: F,
) -> Result<V, E>
where
    V: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>>,
{
    if let Some(hit) = cache.write().await.get(key) {
        debug!(key = %key, "cache hit");
        return Ok(hit);
    }

    debug!(key = %key, "cache miss");
    let value = fetch().await?;
    cache.write().await.set(key, value.clone(), ttl);
    Ok(value)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    fn cache_at_zero() -> (TtlCache<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let cache = TtlCache::new(DEFAULT_TTL).with_clock(clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_set_and_get() {
        let (mut cache, _clock) = cache_at_zero();

        cache.set("top-rated:168:100", "batch".to_string(), Duration::from_secs(1));

        assert_eq!(cache.get("top-rated:168:100"), Some("batch".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_missing_key() {
        let (mut cache, _clock) = cache_at_zero();
        assert_eq!(cache.get("missing"), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_lazy_expiry_scenario() {
        let (mut cache, clock) = cache_at_zero();

        cache.set("x", "{a:1}".to_string(), Duration::from_millis(1000));

        clock.set_ms(500);
        assert_eq!(cache.get("x"), Some("{a:1}".to_string()));

        clock.set_ms(1500);
        assert_eq!(cache.get("x"), None);

        let stats = cache.stats();
        assert_eq!((stats.valid, stats.expired, stats.total), (0, 0, 0));
    }

    #[test]
    fn test_stats_does_not_evict() {
        let (mut cache, clock) = cache_at_zero();

        cache.set("short", "a".to_string(), Duration::from_millis(10));
        cache.set("long", "b".to_string(), Duration::from_secs(60));
        clock.advance(Duration::from_millis(20));

        let first = cache.stats();
        let second = cache.stats();

        assert_eq!(first, second);
        assert_eq!((first.valid, first.expired, first.total), (1, 1, 2));
        assert_eq!(cache.len(), 2, "stats must not remove expired entries");
    }

    #[test]
    fn test_overwrite_resets_ttl() {
        let (mut cache, clock) = cache_at_zero();

        cache.set("k", "old".to_string(), Duration::from_millis(100));
        clock.set_ms(90);
        cache.set("k", "new".to_string(), Duration::from_millis(100));
        clock.set_ms(150);

        assert_eq!(cache.get("k"), Some("new".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_set_default_uses_five_minutes() {
        let (mut cache, clock) = cache_at_zero();

        cache.set_default("k", "v".to_string());

        clock.set_ms(300_000);
        assert!(cache.get("k").is_some());
        clock.set_ms(300_001);
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn test_clear_drops_everything() {
        let (mut cache, _clock) = cache_at_zero();

        cache.set_default("a", "1".to_string());
        cache.set_default("b", "2".to_string());
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.stats().total, 0);
    }

    #[test]
    fn test_remove() {
        let (mut cache, _clock) = cache_at_zero();

        cache.set_default("a", "1".to_string());
        assert!(cache.remove("a"));
        assert!(!cache.remove("a"));
    }

    #[test]
    fn test_unbounded_by_default() {
        let (mut cache, _clock) = cache_at_zero();

        for i in 0..500 {
            cache.set_default(format!("k{i}"), i.to_string());
        }

        assert_eq!(cache.len(), 500);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let (cache, _clock) = cache_at_zero();
        let mut cache = cache.with_capacity(3);

        cache.set_default("k1", "1".to_string());
        cache.set_default("k2", "2".to_string());
        cache.set_default("k3", "3".to_string());

        // k1 becomes most recently used, so k2 is the next victim
        cache.get("k1");
        cache.set_default("k4", "4".to_string());

        assert_eq!(cache.len(), 3);
        assert!(cache.get("k2").is_none());
        assert!(cache.get("k1").is_some());
        assert!(cache.get("k4").is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_capacity_overwrite_does_not_evict() {
        let (cache, _clock) = cache_at_zero();
        let mut cache = cache.with_capacity(2);

        cache.set_default("k1", "1".to_string());
        cache.set_default("k2", "2".to_string());
        cache.set_default("k1", "1b".to_string());

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[tokio::test]
    async fn test_get_or_fetch_caches_success() {
        let shared = TtlCache::<u32>::new(DEFAULT_TTL).into_shared();
        let mut calls = 0;

        let first: Result<u32, ()> = get_or_fetch(&shared, "k", DEFAULT_TTL, || {
            calls += 1;
            async { Ok(7) }
        })
        .await;
        assert_eq!(first, Ok(7));

        let second: Result<u32, ()> =
            get_or_fetch(&shared, "k", DEFAULT_TTL, || async { Ok(99) }).await;

        assert_eq!(second, Ok(7));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_get_or_fetch_does_not_cache_failure() {
        let shared = TtlCache::<u32>::new(DEFAULT_TTL).into_shared();

        let failed: Result<u32, &str> =
            get_or_fetch(&shared, "k", DEFAULT_TTL, || async { Err("boom") }).await;
        assert_eq!(failed, Err("boom"));
        assert!(shared.read().await.is_empty());
    }
}
