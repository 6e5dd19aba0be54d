//! Run-fatal sync errors
//!
//! Per-file failures never surface here; they are counted and logged in the
//! result of the pass.

use std::io;

use arkive_domain::ArkiveError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Source path not found: {0}")]
    SourceMissing(String),

    #[error("Destination path unavailable: {path}: {source}")]
    DestinationUnavailable {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Sync was cancelled")]
    Cancelled,
}

impl From<SyncError> for ArkiveError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::SourceMissing(_) => ArkiveError::NotFound(err.to_string()),
            SyncError::DestinationUnavailable { .. } => ArkiveError::Io(err.to_string()),
            SyncError::Cancelled => ArkiveError::Cancelled(err.to_string()),
        }
    }
}
