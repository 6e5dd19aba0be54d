//! Port interface for the synchronization engine

use arkive_domain::{Job, Result};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::result::SyncResult;

/// Converges a job's destination tree towards its source tree.
///
/// Per-file failures are reported through the result. An `Err` is returned
/// only for a missing source path or file, or `ArkiveError::Cancelled` when
/// `cancel` fired between files.
#[async_trait]
pub trait SyncEngine: Send + Sync {
    async fn execute(&self, job: &Job, cancel: CancellationToken) -> Result<SyncResult>;
}
