//! Cache health classification and human-readable reporting

use std::fmt;

use serde::Serialize;
#[cfg(feature = "observability")]
use tracing::{info, warn};

use super::CacheStats;

/// Hit rate below this is flagged once enough traffic was seen
const LOW_HIT_RATE: f64 = 0.5;
/// Minimum lookups before the hit rate is judged
const MIN_ACCESSES: u64 = 20;
/// Fill level above this is flagged
const NEAR_CAPACITY: f64 = 0.85;

/// Cache health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheHealth {
    Healthy,
    LowHitRate,
    NearCapacity,
    /// Both low hit rate and near capacity
    Critical,
}

impl fmt::Display for CacheHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "Healthy"),
            Self::LowHitRate => write!(f, "Low Hit Rate"),
            Self::NearCapacity => write!(f, "Near Capacity"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}

/// Health classification of one named cache
#[derive(Debug, Clone, Serialize)]
pub struct CacheHealthReport {
    pub name: String,
    pub health: CacheHealth,
    pub stats: CacheStats,
    pub recommendations: Vec<String>,
}

impl CacheHealthReport {
    /// Classify a statistics snapshot
    ///
    /// # Thresholds
    /// - Low hit rate: < 50% after at least 20 lookups
    /// - Near capacity: > 85% full
    pub fn from_stats(name: impl Into<String>, stats: CacheStats) -> Self {
        let mut recommendations = Vec::new();

        let low_hit_rate = stats.total_accesses() >= MIN_ACCESSES && stats.hit_rate() < LOW_HIT_RATE;
        if low_hit_rate {
            recommendations.push(format!(
                "Hit rate is {:.2}%. Consider a longer TTL.",
                stats.hit_rate() * 100.0
            ));
        }

        let near_capacity = stats.fill_percentage() > NEAR_CAPACITY;
        if near_capacity {
            recommendations.push(format!(
                "Cache is {:.1}% full. Consider increasing max_cache_size.",
                stats.fill_percentage() * 100.0
            ));
        }

        let health = match (low_hit_rate, near_capacity) {
            (true, true) => CacheHealth::Critical,
            (true, false) => CacheHealth::LowHitRate,
            (false, true) => CacheHealth::NearCapacity,
            (false, false) => CacheHealth::Healthy,
        };

        Self { name: name.into(), health, stats, recommendations }
    }

    /// Log the report using tracing (requires `observability` feature)
    #[cfg(feature = "observability")]
    pub fn log(&self) {
        if self.health == CacheHealth::Healthy {
            info!(
                cache = %self.name,
                hit_rate = self.stats.hit_rate(),
                size = self.stats.size,
                "Cache health check: Healthy"
            );
            return;
        }
        warn!(
            cache = %self.name,
            health = %self.health,
            hit_rate = self.stats.hit_rate(),
            size = self.stats.size,
            max_size = self.stats.max_size,
            "Cache health check: Issues detected"
        );
        for rec in &self.recommendations {
            warn!(cache = %self.name, recommendation = %rec, "Cache optimization recommendation");
        }
    }
}

impl fmt::Display for CacheHealthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} [{}]", self.name, self.health)?;
        writeln!(f, "  Size: {}/{}", self.stats.size, self.stats.max_size)?;
        writeln!(f, "  Hits: {}", self.stats.hits)?;
        writeln!(f, "  Misses: {}", self.stats.misses)?;
        writeln!(f, "  Hit Rate: {:.2}%", self.stats.hit_rate() * 100.0)?;
        writeln!(f, "  Evictions: {}", self.stats.evictions)?;
        write!(f, "  Expirations: {}", self.stats.expirations)?;
        for rec in &self.recommendations {
            write!(f, "\n  - {rec}")?;
        }
        Ok(())
    }
}
