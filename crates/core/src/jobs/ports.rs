//! Port interfaces for job persistence, scheduling and execution
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use arkive_domain::{ApplicationLog, Execution, ExecutionLog, ExclusionPattern, Job, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Persistence for jobs and their exclusion patterns.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Load a job including soft-deleted ones. Loaded jobs carry their scoped
    /// exclusion patterns followed by every global pattern.
    async fn get_job(&self, id: Uuid) -> Result<Option<Job>>;

    async fn list_active_jobs(&self) -> Result<Vec<Job>>;

    /// Insert a job with its options and pattern associations.
    async fn insert_job(&self, job: &Job) -> Result<()>;

    /// Replace the editable fields, options and scoped pattern associations.
    async fn update_job(&self, job: &Job) -> Result<()>;

    /// True when a non-deleted job other than `excluding` has this name,
    /// compared case-insensitively.
    async fn name_exists(&self, name: &str, excluding: Option<Uuid>) -> Result<bool>;

    /// Returns false when no such job exists or it is deleted.
    async fn set_enabled(&self, id: Uuid, enabled: bool, modified_at: DateTime<Utc>) -> Result<bool>;

    /// Returns false when no such job exists or it is already deleted.
    async fn soft_delete(&self, id: Uuid, deleted_at: DateTime<Utc>) -> Result<bool>;

    async fn mark_last_run(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;

    async fn list_exclusion_patterns(&self) -> Result<Vec<ExclusionPattern>>;

    async fn save_exclusion_pattern(&self, pattern: &ExclusionPattern) -> Result<()>;

    async fn delete_exclusion_pattern(&self, id: Uuid) -> Result<bool>;
}

/// Persistence for execution records and their log rows.
#[async_trait]
pub trait ExecutionRepository: Send + Sync {
    /// Insert the row, or overwrite status, end time and counters of an
    /// existing one.
    async fn insert_execution(&self, execution: &Execution) -> Result<()>;

    /// Store the terminal state together with its log rows in one
    /// transaction.
    async fn complete_execution(&self, execution: &Execution, logs: &[ExecutionLog]) -> Result<()>;

    async fn get_execution(&self, id: Uuid) -> Result<Option<Execution>>;

    /// Most recent first.
    async fn list_executions(&self, job_id: Uuid, limit: u32) -> Result<Vec<Execution>>;

    /// All rows of an execution in timestamp order.
    async fn list_logs(&self, execution_id: Uuid) -> Result<Vec<ExecutionLog>>;

    /// Error and Warning rows of an execution in timestamp order.
    async fn list_issue_logs(&self, execution_id: Uuid) -> Result<Vec<ExecutionLog>>;

    /// Delete log rows with a timestamp strictly before `cutoff`.
    async fn delete_logs_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

/// Per-job trigger management.
#[async_trait]
pub trait JobSchedulerPort: Send + Sync {
    /// Replace the job's trigger according to its current stored state.
    async fn schedule_job(&self, job_id: Uuid) -> Result<()>;

    /// Start one immediate out-of-band run.
    async fn run_now(&self, job_id: Uuid) -> Result<()>;

    /// Interrupt running executions of the job. True when one was signalled.
    async fn stop_job(&self, job_id: Uuid) -> Result<bool>;

    /// Remove the job's trigger. True when one existed.
    async fn delete_job(&self, job_id: Uuid) -> Result<bool>;
}

/// Whole-scheduler controls.
#[async_trait]
pub trait SchedulerControl: Send + Sync {
    async fn is_started(&self) -> Result<bool>;

    async fn start(&self) -> Result<()>;

    async fn pause_all(&self) -> Result<()>;

    async fn resume_all(&self) -> Result<()>;
}

/// Runs one job end to end.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run_job(&self, job_id: Uuid, cancel: CancellationToken) -> Result<Execution>;
}

/// Persistence for process-wide log events.
#[async_trait]
pub trait ApplicationLogRepository: Send + Sync {
    async fn append_application_logs(&self, logs: &[ApplicationLog]) -> Result<()>;

    /// Newest first.
    async fn list_application_logs(&self, limit: u32) -> Result<Vec<ApplicationLog>>;

    async fn delete_application_logs_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

/// Best-effort log pruning.
#[async_trait]
pub trait LogPruner: Send + Sync {
    /// Returns the number of rows removed.
    async fn prune(&self) -> Result<u64>;
}
