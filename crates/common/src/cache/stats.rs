//! Cache statistics and metrics tracking
//!
//! Counters are monotonic and updated with relaxed atomics; a
//! [`CacheStats`] snapshot is a consistent-enough view for diagnostics, not a
//! transactionally exact one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Statistics for cache performance monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Current number of entries (valid or not yet swept)
    pub size: usize,

    /// Maximum allowed entries
    pub max_size: usize,

    /// Reads that returned a valid entry
    pub hits: u64,

    /// Reads that found nothing or an expired entry
    pub misses: u64,

    /// Total number of put operations
    pub inserts: u64,

    /// Entries removed to make room for a new key
    pub evictions: u64,

    /// Expired entries removed by a sweep
    pub expirations: u64,
}

impl CacheStats {
    /// Hits over total lookups, `0.0` when there were none
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Fraction of capacity in use
    pub fn fill_percentage(&self) -> f64 {
        if self.max_size == 0 {
            0.0
        } else {
            self.size as f64 / self.max_size as f64
        }
    }

    /// Total number of lookups (hits + misses)
    pub fn total_accesses(&self) -> u64 {
        self.hits + self.misses
    }
}

/// Thread-safe counter set for one cache
///
/// Clones share the same counters. A disabled collector ignores every
/// `record_*` call and always reports zeros.
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    enabled: bool,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    inserts: Arc<AtomicU64>,
    evictions: Arc<AtomicU64>,
    expirations: Arc<AtomicU64>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new(true)
    }
}

impl MetricsCollector {
    /// Create a collector; `enabled = false` turns every update into a no-op
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
            inserts: Arc::new(AtomicU64::new(0)),
            evictions: Arc::new(AtomicU64::new(0)),
            expirations: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Whether counters are being updated
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record_hit(&self) {
        self.bump(&self.hits, 1);
    }

    pub fn record_miss(&self) {
        self.bump(&self.misses, 1);
    }

    pub fn record_insert(&self) {
        self.bump(&self.inserts, 1);
    }

    pub fn record_eviction(&self) {
        self.bump(&self.evictions, 1);
    }

    pub fn record_expirations(&self, count: u64) {
        self.bump(&self.expirations, count);
    }

    fn bump(&self, counter: &AtomicU64, by: u64) {
        if self.enabled && by > 0 {
            counter.fetch_add(by, Ordering::Relaxed);
        }
    }

    /// Current statistics snapshot
    pub fn snapshot(&self, size: usize, max_size: usize) -> CacheStats {
        CacheStats {
            size,
            max_size,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
        }
    }

}
