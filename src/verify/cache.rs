//! TTL cache for PoH verification results.
//!
//! Stores the latest successful verification outcome per normalized address,
//! so repeated lookups for the same wallet within the TTL skip the upstream
//! API. Expiry is checked lazily when an entry is read.

use crate::address::normalize_address;
use crate::verify::PohStatus;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default cache capacity (100,000 entries).
pub const DEFAULT_CACHE_CAPACITY: usize = 100_000;

/// Default time-to-live for a cached result (5 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    status: PohStatus,
    created_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created_at) < ttl
    }
}

/// Cache of verification results keyed by lowercase address.
///
/// Only [`PohStatus`] values can be stored; upstream failures are never
/// cached. The capacity bound evicts least-recently-used entries and is only
/// reached under unusual address churn.
#[derive(Clone)]
pub struct ResultCache {
    inner: Arc<Mutex<LruCache<String, CacheEntry>>>,
    stats: Arc<Mutex<CacheStats>>,
    ttl: Duration,
}

/// Cache statistics for monitoring.
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses (including expired entries).
    pub misses: u64,
    /// Number of entries dropped because their TTL elapsed.
    pub expirations: u64,
    /// Number of entries added or refreshed.
    pub insertions: u64,
}

impl CacheStats {
    /// Calculate hit rate as a percentage.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

impl ResultCache {
    /// Create a cache with the given TTL and default capacity.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_CACHE_CAPACITY)
    }

    /// Create a cache with the given TTL and capacity.
    #[must_use]
    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Mutex::new(LruCache::new(cap))),
            stats: Arc::new(Mutex::new(CacheStats::default())),
            ttl,
        }
    }

    /// Look up the cached result for `address`.
    pub fn get(&self, address: &str) -> Option<PohStatus> {
        self.get_at(address, Instant::now())
    }

    /// Look up the cached result for `address` as of `now`.
    ///
    /// An entry older than the TTL is removed and reported as a miss.
    pub fn get_at(&self, address: &str, now: Instant) -> Option<PohStatus> {
        let key = normalize_address(address);
        let mut cache = self.inner.lock();

        let lookup = cache
            .get(&key)
            .map(|entry| (entry.status, entry.is_fresh(now, self.ttl)));

        let found = match lookup {
            Some((status, true)) => Some(status),
            Some((_, false)) => {
                cache.pop(&key);
                self.stats.lock().expirations += 1;
                None
            }
            None => None,
        };

        let mut stats = self.stats.lock();
        if found.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }

        found
    }

    /// Store `status` for `address`, replacing any previous entry.
    pub fn put(&self, address: &str, status: PohStatus) {
        self.put_at(address, status, Instant::now());
    }

    /// Store `status` for `address` stamped at `now`.
    pub fn put_at(&self, address: &str, status: PohStatus, now: Instant) {
        let key = normalize_address(address);
        self.inner.lock().put(
            key,
            CacheEntry {
                status,
                created_at: now,
            },
        );
        self.stats.lock().insertions += 1;
    }

    /// Remove every entry whose TTL has elapsed. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    /// Remove every entry whose TTL has elapsed as of `now`.
    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let mut cache = self.inner.lock();
        let expired: Vec<String> = cache
            .iter()
            .filter(|(_, entry)| !entry.is_fresh(now, self.ttl))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            cache.pop(key);
        }
        drop(cache);

        if !expired.is_empty() {
            self.stats.lock().expirations += expired.len() as u64;
        }
        expired.len()
    }

    /// Get current cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats.lock().clone()
    }

    /// Get the current number of entries in the cache.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}
