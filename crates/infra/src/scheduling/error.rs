//! Scheduler error types

use std::time::Duration;

use arkive_domain::ArkiveError;
use thiserror::Error;

use crate::errors::InfraError;

/// Trigger engine errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Scheduler already running")]
    AlreadyRunning,

    #[error("Scheduler not running")]
    NotRunning,

    /// Operation timed out
    #[error("Operation timed out after {duration:?}")]
    Timeout {
        duration: Duration,
        #[source]
        source: tokio::time::error::Elapsed,
    },

    #[error("Task join failed: {0}")]
    TaskJoinFailed(#[from] tokio::task::JoinError),

    /// Trigger store access failed
    #[error(transparent)]
    Store(#[from] ArkiveError),
}

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        let arkive_err = match err {
            SchedulerError::AlreadyRunning => ArkiveError::AlreadyRunning(err.to_string()),
            SchedulerError::NotRunning => ArkiveError::InvalidInput(err.to_string()),
            SchedulerError::Store(inner) => inner,
            SchedulerError::Timeout { .. } | SchedulerError::TaskJoinFailed(_) => {
                ArkiveError::Internal(err.to_string())
            }
        };
        InfraError(arkive_err)
    }
}

impl From<SchedulerError> for ArkiveError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
