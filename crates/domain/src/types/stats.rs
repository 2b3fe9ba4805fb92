//! Statistics types exposed by the cache pool
//!
//! These are the serializable shapes of `CachePool::stats()`: one block per
//! cache, each with its counters and derived hit rate.

use std::fmt;

use serde::{Deserialize, Serialize};

/* -------------------------------------------------------------------------- */
/* Per-cache statistics */
/* -------------------------------------------------------------------------- */

/// Counters for a single cache
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)`, `0.0` when there were no lookups
    pub hit_rate: f64,
    pub evictions: u64,
    pub expirations: u64,
    pub inserts: u64,
    /// Entries currently stored, including expired ones not yet swept
    pub size: usize,
    pub max_size: usize,
    /// Upstream fetches started by the coordinator
    pub upstream_fetches: u64,
    /// Upstream fetches that ended in an error or timeout
    pub fetch_failures: u64,
    /// Callers that joined a fetch already in flight
    pub coalesced_waiters: u64,
}

/* -------------------------------------------------------------------------- */
/* Pool statistics */
/* -------------------------------------------------------------------------- */

/// Statistics for both caches of the pool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolStats {
    pub weather_cache: CacheStatsSnapshot,
    pub city_cache: CacheStatsSnapshot,
}

/// Result of one expired-entry sweep over the pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub weather_removed: usize,
    pub city_removed: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.weather_removed + self.city_removed
    }
}

impl fmt::Display for CacheStatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} entries, hits {}, misses {}, hit rate {:.1}%, evictions {}",
            self.size,
            self.max_size,
            self.hits,
            self.misses,
            self.hit_rate * 100.0,
            self.evictions
        )
    }
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cache statistics:")?;
        writeln!(f, "  weather: {}", self.weather_cache)?;
        write!(f, "  city: {}", self.city_cache)
    }
}
