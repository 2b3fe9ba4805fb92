//! Pool statistics
//!
//! Cache-level counters (hits, misses, evictions) live in each
//! [`BoundedTtlCache`](nimbus_common::cache::BoundedTtlCache); fetch-level
//! counters live here, one set per coordinator. [`StatsCollector`] merges
//! both into the serializable [`PoolStats`] shape.

use std::sync::atomic::{AtomicU64, Ordering};

use nimbus_common::cache::CacheStats;
use nimbus_domain::{CacheStatsSnapshot, PoolStats};

/// Fetch counters maintained by a refresh coordinator
#[derive(Debug, Default)]
pub struct FetchCounters {
    started: AtomicU64,
    failed: AtomicU64,
    coalesced: AtomicU64,
}

/// Point-in-time copy of [`FetchCounters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub started: u64,
    pub failed: u64,
    pub coalesced: u64,
}

impl FetchCounters {
    pub(crate) fn record_started(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> FetchStats {
        FetchStats {
            started: self.started.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
        }
    }
}

/// Builds pool-level statistics snapshots
#[derive(Debug, Clone, Copy)]
pub struct StatsCollector {
    enabled: bool,
}

impl StatsCollector {
    /// A disabled collector reports sizes only; every counter reads zero
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Merge cache and fetch counters for one cache
    pub fn snapshot(&self, cache: &CacheStats, fetches: FetchStats) -> CacheStatsSnapshot {
        if !self.enabled {
            return CacheStatsSnapshot {
                size: cache.size,
                max_size: cache.max_size,
                ..CacheStatsSnapshot::default()
            };
        }

        CacheStatsSnapshot {
            hits: cache.hits,
            misses: cache.misses,
            hit_rate: cache.hit_rate(),
            evictions: cache.evictions,
            expirations: cache.expirations,
            inserts: cache.inserts,
            size: cache.size,
            max_size: cache.max_size,
            upstream_fetches: fetches.started,
            fetch_failures: fetches.failed,
            coalesced_waiters: fetches.coalesced,
        }
    }

    pub fn collect(
        &self,
        weather: (&CacheStats, FetchStats),
        city: (&CacheStats, FetchStats),
    ) -> PoolStats {
        PoolStats {
            weather_cache: self.snapshot(weather.0, weather.1),
            city_cache: self.snapshot(city.0, city.1),
        }
    }
}
