//! Execution records and their log rows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::impl_domain_enum_conversions;

/// Lifecycle of one job run. Everything except `Running` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Running,
    Completed,
    CompletedWithWarnings,
    Failed,
    Cancelled,
}

impl_domain_enum_conversions!(ExecutionStatus {
    Running => "running",
    Completed => "completed",
    CompletedWithWarnings => "completed_with_warnings",
    Failed => "failed",
    Cancelled => "cancelled",
});

impl ExecutionStatus {
    pub const fn is_terminal(self) -> bool {
        match self {
            Self::Running => false,
            Self::Completed | Self::CompletedWithWarnings | Self::Failed | Self::Cancelled => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl_domain_enum_conversions!(LogLevel {
    Info => "info",
    Warning => "warning",
    Error => "error",
});

/// File operation a log row refers to. Declaration order is the order used
/// when listing operations in a detail summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Copy,
    Update,
    Delete,
    Skip,
}

impl_domain_enum_conversions!(OperationType {
    Copy => "copy",
    Update => "update",
    Delete => "delete",
    Skip => "skip",
});

impl OperationType {
    /// Display label used in user-facing summaries.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Copy => "Copy",
            Self::Update => "Update",
            Self::Delete => "Delete",
            Self::Skip => "Skip",
        }
    }
}

/// The eight counters produced by a sync pass and stored on its execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCounters {
    pub files_scanned: u32,
    pub files_copied: u32,
    pub files_updated: u32,
    pub files_deleted: u32,
    pub files_skipped: u32,
    pub files_failed: u32,
    pub bytes_transferred: u64,
    pub error_count: u32,
    pub warning_count: u32,
}

impl SyncCounters {
    /// True when the run finished without any error, warning or failed file.
    pub const fn is_clean(&self) -> bool {
        self.error_count == 0 && self.warning_count == 0 && self.files_failed == 0
    }
}

/// One run of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    pub id: Uuid,
    pub job_id: Uuid,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub counters: SyncCounters,
}

impl Execution {
    /// Fresh `Running` record starting now.
    pub fn start(job_id: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            job_id,
            status: ExecutionStatus::Running,
            started_at: Utc::now(),
            ended_at: None,
            duration_ms: None,
            counters: SyncCounters::default(),
        }
    }

    /// Move to a terminal status, stamping end time and duration.
    ///
    /// The end time is clamped so it never precedes the start time.
    pub fn finish(&mut self, status: ExecutionStatus, counters: SyncCounters) {
        let ended_at = Utc::now().max(self.started_at);
        self.status = status;
        self.counters = counters;
        self.ended_at = Some(ended_at);
        self.duration_ms = Some((ended_at - self.started_at).num_milliseconds());
    }
}

/// Persisted log row attached to an execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionLog {
    pub id: Uuid,
    pub execution_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub file_path: Option<String>,
    pub operation: Option<OperationType>,
    pub exception: Option<String>,
}

impl ExecutionLog {
    pub fn new(execution_id: Uuid, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            execution_id,
            timestamp: Utc::now(),
            level,
            message: message.into(),
            file_path: None,
            operation: None,
            exception: None,
        }
    }
}
