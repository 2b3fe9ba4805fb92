//! Two-tier weather cache pool
//!
//! `CachePool` owns a weather cache (location -> report) and a city cache
//! (name -> resolved city), each behind its own [`RefreshCoordinator`].
//! Resolving weather for an uncached location goes through the city tier
//! first, so a location's city lookup is shared with every other caller
//! asking for the same name.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use nimbus_common::cache::{BoundedTtlCache, CacheConfig, CacheHealthReport};
use nimbus_common::time::{Clock, SystemClock};
use nimbus_domain::constants::{CITY_CACHE_NAME, WEATHER_CACHE_NAME};
use nimbus_domain::{CachePoolConfig, CityInfo, PoolStats, Result, SweepReport, WeatherReport};
use tracing::{debug, info, instrument};

use super::coordinator::{Fetched, RefreshCoordinator};
use super::stats::StatsCollector;
use crate::weather::key::CacheKey;
use crate::weather::ports::{CityLookup, WeatherFetcher};

/// Cached, coordinated city resolution
///
/// Cloned into weather fetches so they can resolve their city without
/// borrowing the pool.
struct CityResolver<C: Clock + Clone> {
    coordinator: Arc<RefreshCoordinator<CacheKey, CityInfo, C>>,
    lookup: Arc<dyn CityLookup>,
}

impl<C: Clock + Clone> Clone for CityResolver<C> {
    fn clone(&self) -> Self {
        Self { coordinator: Arc::clone(&self.coordinator), lookup: Arc::clone(&self.lookup) }
    }
}

impl<C> CityResolver<C>
where
    C: Clock + Clone + 'static,
{
    async fn resolve(&self, key: CacheKey, name: String, force: bool) -> Result<Fetched<CityInfo>> {
        let fetch = self.fetch(name);
        if force {
            self.coordinator.force_refresh(key, fetch).await.map(Fetched::live)
        } else {
            self.coordinator.get_or_fetch(key, fetch).await
        }
    }

    fn fetch(&self, name: String) -> impl FnOnce() -> BoxFuture<'static, Result<CityInfo>> + Send {
        let lookup = Arc::clone(&self.lookup);
        move || async move { lookup.lookup_city(&name).await }.boxed()
    }
}

/// Weather and city caches with single-flight fetching
pub struct CachePool<C = SystemClock>
where
    C: Clock + Clone + 'static,
{
    weather: RefreshCoordinator<CacheKey, WeatherReport, C>,
    cities: CityResolver<C>,
    fetcher: Arc<dyn WeatherFetcher>,
    stats: StatsCollector,
    config: CachePoolConfig,
}

impl CachePool<SystemClock> {
    /// # Errors
    /// Returns `NimbusError::Config` when `config` fails validation.
    pub fn new(
        config: CachePoolConfig,
        fetcher: Arc<dyn WeatherFetcher>,
        lookup: Arc<dyn CityLookup>,
    ) -> Result<Self> {
        Self::with_clock(config, fetcher, lookup, SystemClock)
    }
}

impl<C> CachePool<C>
where
    C: Clock + Clone + 'static,
{
    /// Build a pool whose entries age according to `clock`
    ///
    /// # Errors
    /// Returns `NimbusError::Config` when `config` fails validation.
    pub fn with_clock(
        config: CachePoolConfig,
        fetcher: Arc<dyn WeatherFetcher>,
        lookup: Arc<dyn CityLookup>,
        clock: C,
    ) -> Result<Self> {
        config.validate()?;

        let fetch_timeout = Some(config.fetch_timeout_duration());
        let weather_cache = BoundedTtlCache::with_clock(
            cache_config(config.weather_ttl(), &config),
            clock.clone(),
        );
        let city_cache =
            BoundedTtlCache::with_clock(cache_config(config.city_ttl(), &config), clock);

        info!(
            weather_ttl_secs = config.weather_cache_ttl,
            city_ttl_secs = config.city_cache_ttl,
            max_size = config.max_cache_size,
            "Cache pool initialised"
        );

        Ok(Self {
            weather: RefreshCoordinator::new(WEATHER_CACHE_NAME, weather_cache, fetch_timeout),
            cities: CityResolver {
                coordinator: Arc::new(RefreshCoordinator::new(
                    CITY_CACHE_NAME,
                    city_cache,
                    fetch_timeout,
                )),
                lookup,
            },
            fetcher,
            stats: StatsCollector::new(config.enable_stats),
            config,
        })
    }

    /// Weather for `location`, from cache when valid
    ///
    /// With `force_refresh` the cached entry is bypassed and replaced on
    /// success. The city is still taken from the city cache.
    ///
    /// # Errors
    /// - `NimbusError::InvalidInput` for a blank location
    /// - any error from city resolution or the weather fetch; nothing is
    ///   cached for the location in that case
    #[instrument(skip(self), fields(cache = WEATHER_CACHE_NAME))]
    pub async fn lookup_weather(
        &self,
        location: &str,
        force_refresh: bool,
    ) -> Result<Fetched<WeatherReport>> {
        let key = CacheKey::parse(location)?;
        let fetch = self.weather_fetch(key.clone(), location.trim().to_string());

        let fetched = if force_refresh {
            self.weather.force_refresh(key, fetch).await.map(Fetched::live)?
        } else {
            self.weather.get_or_fetch(key, fetch).await?
        };
        debug!(source = %fetched.source, city = %fetched.value.city.name, "Weather lookup served");
        Ok(fetched)
    }

    /// Resolved city for `name`, from cache when valid
    ///
    /// # Errors
    /// - `NimbusError::InvalidInput` for a blank name
    /// - `NimbusError::NotFound` when the provider has no match
    /// - any fetch failure from the lookup port
    #[instrument(skip(self), fields(cache = CITY_CACHE_NAME))]
    pub async fn lookup_city(&self, name: &str, force_refresh: bool) -> Result<Fetched<CityInfo>> {
        let key = CacheKey::parse(name)?;
        self.cities.resolve(key, name.trim().to_string(), force_refresh).await
    }

    /// Drop the cached weather for `location`; returns whether an entry existed
    ///
    /// # Errors
    /// `NimbusError::InvalidInput` for a blank location.
    pub fn invalidate_weather(&self, location: &str) -> Result<bool> {
        let key = CacheKey::parse(location)?;
        Ok(self.weather.cache().remove(&key).is_some())
    }

    /// Remove expired entries from both caches
    pub fn clean_expired(&self) -> SweepReport {
        let report = SweepReport {
            weather_removed: self.weather.cache().sweep_expired(),
            city_removed: self.cities.coordinator.cache().sweep_expired(),
        };
        if report.total() > 0 {
            info!(
                weather_removed = report.weather_removed,
                city_removed = report.city_removed,
                "Removed expired cache entries"
            );
        } else {
            debug!("No expired cache entries");
        }
        report
    }

    /// Refresh entries in the last stretch of their TTL
    ///
    /// Returns the number of entries refreshed; always zero when async
    /// refresh is disabled.
    pub async fn refresh_ahead(&self) -> usize {
        if !self.config.enable_async_refresh {
            return 0;
        }

        let cities = self
            .cities
            .coordinator
            .refresh_ahead(self.config.refresh_lead(self.config.city_ttl()), |key| {
                (self.cities.fetch(key.as_str().to_string()))()
            })
            .await;
        let weather = self
            .weather
            .refresh_ahead(self.config.refresh_lead(self.config.weather_ttl()), |key| {
                (self.weather_fetch(key.clone(), key.as_str().to_string()))()
            })
            .await;
        cities + weather
    }

    /// Empty both caches; counters are kept
    pub fn clear(&self) -> usize {
        let removed = self.weather.cache().clear() + self.cities.coordinator.cache().clear();
        info!(removed, "Cache pool cleared");
        removed
    }

    pub fn stats(&self) -> PoolStats {
        self.stats.collect(
            (&self.weather.cache_stats(), self.weather.fetch_stats()),
            (&self.cities.coordinator.cache_stats(), self.cities.coordinator.fetch_stats()),
        )
    }

    /// Health classification for both caches
    pub fn health(&self) -> Vec<CacheHealthReport> {
        vec![
            CacheHealthReport::from_stats(WEATHER_CACHE_NAME, self.weather.cache_stats()),
            CacheHealthReport::from_stats(CITY_CACHE_NAME, self.cities.coordinator.cache_stats()),
        ]
    }

    pub fn config(&self) -> &CachePoolConfig {
        &self.config
    }

    pub fn weather_coordinator(&self) -> &RefreshCoordinator<CacheKey, WeatherReport, C> {
        &self.weather
    }

    pub fn city_coordinator(&self) -> &RefreshCoordinator<CacheKey, CityInfo, C> {
        &self.cities.coordinator
    }

    fn weather_fetch(
        &self,
        key: CacheKey,
        location: String,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<WeatherReport>> + Send {
        let cities = self.cities.clone();
        let fetcher = Arc::clone(&self.fetcher);
        move || {
            async move {
                let city = cities.resolve(key, location, false).await?.value;
                fetcher.fetch_weather(&city).await
            }
            .boxed()
        }
    }
}

fn cache_config(ttl: std::time::Duration, pool: &CachePoolConfig) -> CacheConfig {
    CacheConfig { track_metrics: pool.enable_stats, ..CacheConfig::bounded(ttl, pool.max_cache_size) }
}
