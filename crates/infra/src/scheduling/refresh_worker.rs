//! Refresh-ahead worker
//!
//! Periodically asks the pool to refresh entries that are in the last
//! stretch of their TTL, so popular locations rarely expire under a caller.
//! Refresh failures are logged by the pool and never surface here; the
//! existing entry simply stays until it expires.

use std::sync::Arc;
use std::time::Duration;

use nimbus_common::time::{Clock, SystemClock};
use nimbus_core::CachePool;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use super::error::{SchedulerError, SchedulerResult};

type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Background refresh-ahead scanner for a [`CachePool`]
pub struct RefreshAheadWorker<C = SystemClock>
where
    C: Clock + Clone + 'static,
{
    pool: Arc<CachePool<C>>,
    scan_interval: Duration,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl<C> RefreshAheadWorker<C>
where
    C: Clock + Clone + 'static,
{
    pub fn new(pool: Arc<CachePool<C>>, scan_interval: Duration) -> Self {
        Self {
            pool,
            scan_interval,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Worker using the pool's configured scan interval
    pub fn from_pool(pool: Arc<CachePool<C>>) -> Self {
        let scan_interval = pool.config().refresh_scan_period();
        Self::new(pool, scan_interval)
    }

    /// Start scanning
    ///
    /// # Errors
    ///
    /// Returns error if the worker is already running
    #[instrument(skip(self), fields(scan_interval_secs = self.scan_interval.as_secs()))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!("Starting refresh-ahead worker");

        self.cancellation_token = CancellationToken::new();

        let pool = Arc::clone(&self.pool);
        let scan_interval = self.scan_interval;
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::scan_loop(pool, scan_interval, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);

        Ok(())
    }

    /// Stop scanning and wait for an in-progress scan to finish
    ///
    /// # Errors
    ///
    /// Returns error if the worker is not running or does not stop in time
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        info!("Stopping refresh-ahead worker");

        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            tokio::time::timeout(JOIN_TIMEOUT, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: JOIN_TIMEOUT, source })??;
        }

        info!("Refresh-ahead worker stopped");

        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Run one scan immediately; returns the number of refreshed entries
    pub async fn scan_once(&self) -> usize {
        self.pool.refresh_ahead().await
    }

    async fn scan_loop(pool: Arc<CachePool<C>>, scan_interval: Duration, cancel: CancellationToken) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("Refresh-ahead loop cancelled");
                    break;
                }
                () = tokio::time::sleep(scan_interval) => {
                    // A scan in progress finishes before cancellation is observed.
                    let refreshed = pool.refresh_ahead().await;
                    if refreshed > 0 {
                        debug!(refreshed, "Refresh-ahead scan completed");
                    }
                }
            }
        }
    }
}

impl<C> Drop for RefreshAheadWorker<C>
where
    C: Clock + Clone + 'static,
{
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}
