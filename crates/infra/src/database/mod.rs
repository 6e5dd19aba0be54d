//! Database implementations

pub mod application_log_repository;
mod columns;
pub mod execution_repository;
pub mod job_repository;
pub mod manager;
pub mod settings_repository;
pub mod trigger_repository;

use std::sync::Arc;

use arkive_common::storage::{SqliteConnection, StorageResult};
use arkive_domain::Result;
use tokio::task;

pub use application_log_repository::SqliteApplicationLogRepository;
pub use execution_repository::SqliteExecutionRepository;
pub use job_repository::SqliteJobRepository;
pub use manager::DbManager;
pub use settings_repository::SqliteSettingsRepository;
pub use trigger_repository::SqliteTriggerRepository;

use crate::errors::{map_join_error, map_storage_error};

/// Run `op` against a pooled connection on the blocking thread pool.
pub(crate) async fn with_connection<T, F>(db: &Arc<DbManager>, op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&mut SqliteConnection) -> StorageResult<T> + Send + 'static,
{
    let db = Arc::clone(db);
    task::spawn_blocking(move || {
        let mut conn = db.get_connection()?;
        op(&mut conn).map_err(map_storage_error)
    })
    .await
    .map_err(map_join_error)?
}
