//! Periodic removal of expired cache entries
//!
//! Expired entries are invisible to readers but keep occupying memory until
//! swept. The sweeper runs [`CachePool::clean_expired`] on a fixed period,
//! independent of request traffic.
//!
//! # Features
//!
//! - Explicit start/stop lifecycle with join handle tracking
//! - Cancellation via `CancellationToken`; restartable after stop
//! - Manual `sweep_once` for tests and diagnostics

use std::sync::Arc;
use std::time::Duration;

use nimbus_common::time::{Clock, SystemClock};
use nimbus_core::CachePool;
use nimbus_domain::SweepReport;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use super::error::{SchedulerError, SchedulerResult};

/// Type alias for task handle to avoid complexity warnings
type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Background sweeper for a [`CachePool`]
pub struct ExpirySweeper<C = SystemClock>
where
    C: Clock + Clone + 'static,
{
    pool: Arc<CachePool<C>>,
    interval: Duration,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl<C> ExpirySweeper<C>
where
    C: Clock + Clone + 'static,
{
    /// Sweeper running every `interval`
    pub fn new(pool: Arc<CachePool<C>>, interval: Duration) -> Self {
        Self {
            pool,
            interval,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Sweeper using the pool's configured cleanup interval
    pub fn from_pool(pool: Arc<CachePool<C>>) -> Self {
        let interval = pool.config().cleanup_period();
        Self::new(pool, interval)
    }

    /// Start the sweeper
    ///
    /// The first sweep happens one interval after start.
    ///
    /// # Errors
    ///
    /// Returns error if the sweeper is already running
    #[instrument(skip(self), fields(interval_secs = self.interval.as_secs()))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!("Starting expiry sweeper");

        // Create a new cancellation token (supports restart after stop)
        self.cancellation_token = CancellationToken::new();

        let pool = Arc::clone(&self.pool);
        let interval = self.interval;
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::sweep_loop(pool, interval, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);

        Ok(())
    }

    /// Stop the sweeper gracefully
    ///
    /// Cancels the background task and awaits completion.
    ///
    /// # Errors
    ///
    /// Returns error if the sweeper is not running or does not stop in time
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        info!("Stopping expiry sweeper");

        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            tokio::time::timeout(JOIN_TIMEOUT, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: JOIN_TIMEOUT, source })??;
        }

        info!("Expiry sweeper stopped");

        Ok(())
    }

    /// Check if the sweeper is running
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Sweep both caches immediately
    pub fn sweep_once(&self) -> SweepReport {
        self.pool.clean_expired()
    }

    async fn sweep_loop(pool: Arc<CachePool<C>>, interval: Duration, cancel: CancellationToken) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("Expiry sweep loop cancelled");
                    break;
                }
                () = tokio::time::sleep(interval) => {
                    let report = pool.clean_expired();
                    debug!(removed = report.total(), "Periodic expiry sweep completed");
                }
            }
        }
    }
}

impl<C> Drop for ExpirySweeper<C>
where
    C: Clock + Clone + 'static,
{
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}
