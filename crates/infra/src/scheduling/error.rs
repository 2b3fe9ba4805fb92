//! Scheduler error types

use std::time::Duration;

use nimbus_domain::NimbusError;
use thiserror::Error;

use crate::errors::InfraError;

/// Scheduler-specific errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Scheduler is already running
    #[error("Scheduler already running")]
    AlreadyRunning,

    /// Scheduler is not running
    #[error("Scheduler not running")]
    NotRunning,

    /// Background task did not finish within the join timeout
    #[error("Scheduler task did not stop within {duration:?}")]
    Timeout {
        duration: Duration,
        #[source]
        source: tokio::time::error::Elapsed,
    },

    /// Task join failed
    #[error("Task join failed: {0}")]
    TaskJoinFailed(#[from] tokio::task::JoinError),
}

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        let nimbus_err = match err {
            SchedulerError::AlreadyRunning | SchedulerError::NotRunning => {
                NimbusError::InvalidInput(err.to_string())
            }
            SchedulerError::Timeout { .. } => NimbusError::Timeout(err.to_string()),
            SchedulerError::TaskJoinFailed(_) => NimbusError::Internal(err.to_string()),
        };
        InfraError(nimbus_err)
    }
}

impl From<SchedulerError> for NimbusError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
