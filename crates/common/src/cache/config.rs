//! Cache configuration types and builder patterns
//!
//! Every [`BoundedTtlCache`](super::BoundedTtlCache) is bounded both in time
//! (a default TTL applied by [`put`](super::BoundedTtlCache::put)) and in
//! size (`max_size` entries).

use std::time::Duration;

use crate::error::{CommonError, CommonResult};

/// Default entry lifetime when none is configured
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Default maximum number of entries
pub const DEFAULT_MAX_SIZE: usize = 50;

/// Which entry to evict when a new key arrives at capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Evict the oldest-inserted entry. Replacing a key counts as a new
    /// insertion.
    #[default]
    Fifo,
    /// Evict the least recently read or written entry
    Lru,
}

/// Configuration for a bounded TTL cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries held at once
    pub max_size: usize,

    /// Lifetime applied by `put`
    pub ttl: Duration,

    /// Eviction policy when `max_size` is reached
    pub eviction_policy: EvictionPolicy,

    /// Whether to collect hit/miss/eviction counters
    pub track_metrics: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            ttl: DEFAULT_TTL,
            eviction_policy: EvictionPolicy::Fifo,
            track_metrics: true,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration builder
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Quick preset: insertion-ordered cache with metrics enabled
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    ///
    /// use nimbus_common::cache::CacheConfig;
    ///
    /// let config = CacheConfig::bounded(Duration::from_secs(3600), 50);
    /// assert_eq!(config.max_size, 50);
    /// ```
    pub fn bounded(ttl: Duration, max_size: usize) -> Self {
        Self { max_size, ttl, ..Self::default() }
    }

    /// Reject configurations the cache cannot honor
    ///
    /// # Errors
    ///
    /// Returns [`CommonError::Config`] when `max_size` or `ttl` is zero.
    pub fn validate(&self) -> CommonResult<()> {
        if self.max_size == 0 {
            return Err(CommonError::config_field("max_size", "must be greater than zero"));
        }
        if self.ttl.is_zero() {
            return Err(CommonError::config_field("ttl", "must be greater than zero"));
        }
        Ok(())
    }
}

/// Builder for CacheConfig with fluent API
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum number of entries
    pub fn max_size(mut self, size: usize) -> Self {
        self.config.max_size = size;
        self
    }

    /// Set the default time-to-live
    pub fn ttl(mut self, duration: Duration) -> Self {
        self.config.ttl = duration;
        self
    }

    /// Set eviction policy
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.config.eviction_policy = policy;
        self
    }

    /// Enable or disable metrics tracking
    pub fn track_metrics(mut self, enabled: bool) -> Self {
        self.config.track_metrics = enabled;
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    ///
    /// See [`CacheConfig::validate`].
    pub fn build(self) -> CommonResult<CacheConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
