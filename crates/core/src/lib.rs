//! # Arkive Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The per-file sync decision and exclusion matching
//! - Schedule normalization, validation and previews
//! - Job editing, execution orchestration and log retention
//! - Port interfaces (traits) implemented by `arkive-infra`
//!
//! ## Architecture Principles
//! - Only depends on `arkive-common` and `arkive-domain`
//! - No database, filesystem or platform code
//! - All external dependencies via traits

pub mod jobs;
pub mod notifications;
pub mod schedule;
pub mod settings;
pub mod sync;

// Re-export specific items to avoid ambiguity
pub use jobs::ports::{
    ApplicationLogRepository, ExecutionRepository, JobRepository, JobRunner, JobSchedulerPort,
    LogPruner, SchedulerControl,
};
pub use jobs::{
    build_detail_summary, JobEditError, JobExecutionService, JobStateService, LogRetentionService,
    ScheduleControlService, StoreLockRetry,
};
pub use notifications::{should_notify, NotificationBus, NotificationRateLimiter};
pub use schedule::{ScheduleError, SchedulePreview};
pub use settings::{ApplicationSettingsService, SettingsRepository};
pub use sync::{decide, FileSnapshot, GlobMatcher, SyncAction, SyncEngine, SyncLogEntry, SyncResult};
