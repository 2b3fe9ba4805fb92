//! Weather query service - entry point for callers

use std::sync::Arc;

use nimbus_common::time::{Clock, SystemClock};
use nimbus_domain::{NimbusError, PoolStats, Result, WeatherLookup};
use tracing::{info, warn};

use crate::pool::CachePool;

/// Answers weather queries through a shared [`CachePool`]
pub struct WeatherService<C = SystemClock>
where
    C: Clock + Clone + 'static,
{
    pool: Arc<CachePool<C>>,
    default_location: String,
}

impl<C> WeatherService<C>
where
    C: Clock + Clone + 'static,
{
    /// Create a service; `default_location` answers queries without one
    pub fn new(pool: Arc<CachePool<C>>, default_location: impl Into<String>) -> Self {
        Self { pool, default_location: default_location.into() }
    }

    /// Weather for `location`, tagged with whether it came from cache
    ///
    /// A missing or blank location falls back to the configured default.
    ///
    /// # Errors
    /// Propagates pool errors unchanged; an upstream failure is never
    /// replaced by a stale report.
    pub async fn get_weather(
        &self,
        location: Option<&str>,
        force_refresh: bool,
    ) -> Result<WeatherLookup> {
        let location = match location.map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => self.default_location.as_str(),
        };

        match self.pool.lookup_weather(location, force_refresh).await {
            Ok(fetched) => {
                info!(location, source = %fetched.source, "Weather query answered");
                Ok(WeatherLookup { report: fetched.value, source: fetched.source })
            }
            Err(err) => {
                warn!(location, error = %err, kind = err.label(), "Weather query failed");
                Err(err)
            }
        }
    }

    /// Weather for several locations in order, one result per location
    pub async fn get_many(
        &self,
        locations: &[String],
        force_refresh: bool,
    ) -> Vec<(String, Result<WeatherLookup>)> {
        let queries = locations.iter().map(|location| async move {
            (location.clone(), self.get_weather(Some(location), force_refresh).await)
        });
        futures::future::join_all(queries).await
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn pool(&self) -> &Arc<CachePool<C>> {
        &self.pool
    }

    pub fn default_location(&self) -> &str {
        &self.default_location
    }

    /// # Errors
    /// `NimbusError::InvalidInput` when the default location is blank.
    pub fn validate(&self) -> Result<()> {
        if self.default_location.trim().is_empty() {
            return Err(NimbusError::InvalidInput("default location must not be blank".into()));
        }
        Ok(())
    }
}
