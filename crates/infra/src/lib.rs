//! # Arkive Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite repositories and the persistent trigger store
//! - The polling trigger engine and per-job scheduler
//! - The filesystem sync engine and dry-run previews
//! - Configuration loading and the single-instance lock
//!
//! ## Architecture
//! - Implements traits defined in `arkive-core`
//! - Depends on `arkive-common`, `arkive-domain` and `arkive-core`
//! - Contains all "impure" code (I/O, database, filesystem)

pub mod config;
pub mod database;
pub mod errors;
pub mod instance_lock;
pub mod scheduling;
pub mod sync;

// Re-export commonly used items
pub use database::{
    DbManager, SqliteApplicationLogRepository, SqliteExecutionRepository, SqliteJobRepository,
    SqliteSettingsRepository, SqliteTriggerRepository,
};
pub use errors::InfraError;
pub use instance_lock::InstanceLock;
pub use scheduling::{JobScheduler, SchedulerError, TriggerEngine, TriggerEngineConfig};
pub use sync::{preview_job, FileSystemSyncEngine, JobPreview};
