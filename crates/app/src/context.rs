//! Application context - dependency injection container

use std::sync::Arc;
use std::time::Duration;

use nimbus_core::{CachePool, CityLookup, WeatherFetcher, WeatherService};
use nimbus_domain::{Config, NimbusError, Result};
use nimbus_infra::{ExpirySweeper, QWeatherClient, RefreshAheadWorker};
use tracing::{info, instrument, warn};

const START_TIMEOUT: Duration = Duration::from_secs(10);

/// Application context - holds the pool, the service, and background workers
pub struct AppContext {
    pub config: Config,
    pub pool: Arc<CachePool>,
    pub weather: Arc<WeatherService>,
    sweeper: ExpirySweeper,
    refresh_worker: Option<RefreshAheadWorker>,
}

impl AppContext {
    /// Build the context against the QWeather API
    ///
    /// # Errors
    /// Returns `NimbusError::Config` for invalid configuration, or any error
    /// from building the HTTP client or starting the workers.
    #[instrument(skip(config))]
    pub async fn new_with_config(config: Config) -> Result<Self> {
        config.validate()?;
        let client = Arc::new(QWeatherClient::new(&config.provider)?);
        Self::with_providers(config, client.clone(), client).await
    }

    /// Build the context over arbitrary provider ports
    ///
    /// Only the cache section and the default location are validated.
    ///
    /// # Errors
    /// Returns `NimbusError::Config` for an invalid cache section, or an
    /// error if a background worker fails to start.
    pub async fn with_providers(
        config: Config,
        fetcher: Arc<dyn WeatherFetcher>,
        lookup: Arc<dyn CityLookup>,
    ) -> Result<Self> {
        let pool = Arc::new(CachePool::new(config.cache.clone(), fetcher, lookup)?);
        let default_location = config.provider.default_location.clone();
        let weather = Arc::new(WeatherService::new(Arc::clone(&pool), default_location));
        weather.validate()?;

        let mut sweeper = ExpirySweeper::from_pool(Arc::clone(&pool));
        start_worker("ExpirySweeper", sweeper.start()).await?;

        let refresh_worker = if config.cache.enable_async_refresh {
            let mut worker = RefreshAheadWorker::from_pool(Arc::clone(&pool));
            start_worker("RefreshAheadWorker", worker.start()).await?;
            Some(worker)
        } else {
            None
        };

        info!(
            default_location = %config.provider.default_location,
            async_refresh = refresh_worker.is_some(),
            "Nimbus initialized"
        );

        Ok(Self { config, pool, weather, sweeper, refresh_worker })
    }

    /// Whether every background worker this context started is still running
    pub fn workers_running(&self) -> bool {
        self.sweeper.is_running()
            && self.refresh_worker.as_ref().map_or(true, RefreshAheadWorker::is_running)
    }

    pub fn has_refresh_worker(&self) -> bool {
        self.refresh_worker.is_some()
    }

    /// Stop background workers and log final cache statistics
    ///
    /// # Errors
    /// Returns the first worker stop error; every worker is asked to stop
    /// regardless.
    #[instrument(skip(self))]
    pub async fn shutdown(mut self) -> Result<()> {
        let mut first_error: Option<NimbusError> = None;

        if let Some(worker) = self.refresh_worker.as_mut() {
            if let Err(err) = worker.stop().await {
                warn!(error = %err, "Failed to stop refresh-ahead worker");
                first_error.get_or_insert(err.into());
            }
        }
        if let Err(err) = self.sweeper.stop().await {
            warn!(error = %err, "Failed to stop expiry sweeper");
            first_error.get_or_insert(err.into());
        }

        for report in self.pool.health() {
            report.log();
        }
        info!("Nimbus shut down");

        first_error.map_or(Ok(()), Err)
    }
}

async fn start_worker<F>(name: &'static str, start: F) -> Result<()>
where
    F: std::future::Future<Output = nimbus_infra::SchedulerResult<()>>,
{
    let timeout_secs = START_TIMEOUT.as_secs();
    tokio::time::timeout(START_TIMEOUT, start)
        .await
        .map_err(|_| {
            tracing::error!(worker = name, timeout_secs, "Worker start timed out");
            NimbusError::Internal(format!("{name} start timed out after {timeout_secs}s"))
        })?
        .map_err(|err| {
            tracing::error!(worker = name, error = %err, "Failed to start worker");
            NimbusError::Internal(format!("failed to start {name}: {err}"))
        })
}
