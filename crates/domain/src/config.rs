//! Configuration management
//!
//! Every section deserializes with defaults so a config file only needs the
//! values it overrides. [`Config::validate`] is the single gate: an invalid
//! configuration is a startup error, never a runtime one.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_HOST, DEFAULT_CITY_CACHE_TTL_SECS, DEFAULT_CLEANUP_INTERVAL_SECS,
    DEFAULT_ENABLE_ASYNC_REFRESH, DEFAULT_ENABLE_STATS, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_LANG,
    DEFAULT_LOCATION, DEFAULT_MAX_CACHE_SIZE, DEFAULT_PROVIDER_MAX_ATTEMPTS,
    DEFAULT_PROVIDER_TIMEOUT_SECS, DEFAULT_REFRESH_SCAN_INTERVAL_SECS, DEFAULT_REFRESH_THRESHOLD,
    DEFAULT_WEATHER_CACHE_TTL_SECS,
};
use crate::errors::{NimbusError, Result};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CachePoolConfig,
    pub provider: ProviderConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Validate every section
    ///
    /// # Errors
    /// Returns `NimbusError::Config` naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.cache.validate()?;
        self.provider.validate()
    }
}

/// Weather cache pool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CachePoolConfig {
    /// Lifetime of weather reports (seconds)
    pub weather_cache_ttl: u64,
    /// Lifetime of city lookups (seconds)
    pub city_cache_ttl: u64,
    /// Entry bound, applied to each cache independently
    pub max_cache_size: usize,
    /// Refresh entries ahead of expiry in the background
    pub enable_async_refresh: bool,
    /// Period of the expired-entry sweep (seconds)
    pub cleanup_interval: u64,
    /// Collect hit/miss/eviction counters
    pub enable_stats: bool,
    /// Fraction of the TTL after which an entry is refreshed ahead
    pub refresh_threshold: f64,
    /// Period of the refresh-ahead scan (seconds)
    pub refresh_scan_interval: u64,
    /// Upper bound on a single upstream fetch (seconds)
    pub fetch_timeout: u64,
}

impl Default for CachePoolConfig {
    fn default() -> Self {
        Self {
            weather_cache_ttl: DEFAULT_WEATHER_CACHE_TTL_SECS,
            city_cache_ttl: DEFAULT_CITY_CACHE_TTL_SECS,
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            enable_async_refresh: DEFAULT_ENABLE_ASYNC_REFRESH,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL_SECS,
            enable_stats: DEFAULT_ENABLE_STATS,
            refresh_threshold: DEFAULT_REFRESH_THRESHOLD,
            refresh_scan_interval: DEFAULT_REFRESH_SCAN_INTERVAL_SECS,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

impl CachePoolConfig {
    /// # Errors
    /// Returns `NimbusError::Config` for a zero TTL, size or interval, or a
    /// refresh threshold outside `(0, 1)`.
    pub fn validate(&self) -> Result<()> {
        positive("cache.weather_cache_ttl", self.weather_cache_ttl)?;
        positive("cache.city_cache_ttl", self.city_cache_ttl)?;
        positive("cache.max_cache_size", self.max_cache_size as u64)?;
        positive("cache.cleanup_interval", self.cleanup_interval)?;
        positive("cache.refresh_scan_interval", self.refresh_scan_interval)?;
        positive("cache.fetch_timeout", self.fetch_timeout)?;

        if !(self.refresh_threshold > 0.0 && self.refresh_threshold < 1.0) {
            return Err(NimbusError::Config(format!(
                "cache.refresh_threshold must be between 0 and 1 (exclusive), got {}",
                self.refresh_threshold
            )));
        }
        Ok(())
    }

    pub fn weather_ttl(&self) -> Duration {
        Duration::from_secs(self.weather_cache_ttl)
    }

    pub fn city_ttl(&self) -> Duration {
        Duration::from_secs(self.city_cache_ttl)
    }

    pub fn cleanup_period(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval)
    }

    pub fn refresh_scan_period(&self) -> Duration {
        Duration::from_secs(self.refresh_scan_interval)
    }

    pub fn fetch_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout)
    }

    /// Remaining lifetime below which an entry with `ttl` is refreshed ahead
    ///
    /// With the default threshold of 0.8 this is the last 20% of the TTL.
    pub fn refresh_lead(&self, ttl: Duration) -> Duration {
        let fraction = 1.0 - self.refresh_threshold;
        if fraction.is_finite() {
            ttl.mul_f64(fraction.clamp(0.0, 1.0))
        } else {
            Duration::ZERO
        }
    }
}

/// Weather provider (QWeather) configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Host serving both `/geo/v2/city/lookup` and `/v7/weather/*`
    pub api_host: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    /// Location used when a caller does not name one
    pub default_location: String,
    pub lang: String,
    /// Per-request HTTP timeout (seconds)
    pub timeout_secs: u64,
    /// Transport attempts per request, including the first
    pub max_attempts: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_host: DEFAULT_API_HOST.to_string(),
            api_key: String::new(),
            default_location: DEFAULT_LOCATION.to_string(),
            lang: DEFAULT_LANG.to_string(),
            timeout_secs: DEFAULT_PROVIDER_TIMEOUT_SECS,
            max_attempts: DEFAULT_PROVIDER_MAX_ATTEMPTS,
        }
    }
}

impl ProviderConfig {
    /// # Errors
    /// Returns `NimbusError::Config` for a missing key or host, or a zero
    /// timeout or attempt count.
    pub fn validate(&self) -> Result<()> {
        non_empty("provider.api_key", &self.api_key)?;
        non_empty("provider.api_host", &self.api_host)?;
        positive("provider.timeout_secs", self.timeout_secs)?;
        positive("provider.max_attempts", u64::from(self.max_attempts))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

fn positive(field: &str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(NimbusError::Config(format!("{field} must be greater than zero")));
    }
    Ok(())
}

fn non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(NimbusError::Config(format!("{field} must not be empty")));
    }
    Ok(())
}
