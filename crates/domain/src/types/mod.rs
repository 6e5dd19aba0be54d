//! Domain types and models

pub mod application_log;
pub mod execution;
pub mod job;
pub mod notification;
pub mod settings;
pub mod trigger;

pub use application_log::ApplicationLog;
pub use execution::{Execution, ExecutionLog, ExecutionStatus, LogLevel, OperationType, SyncCounters};
pub use job::{
    ComparisonMethod, ExclusionPattern, Job, JobDraft, OverwriteBehavior, SyncMode, SyncOptions,
    TriggerType,
};
pub use notification::{NotificationEvent, NotificationKind};
pub use settings::{ApplicationSettings, RetentionUnit};
pub use trigger::{trigger_key, Trigger, TriggerSchedule};
