//! Notification events published over the execution lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::execution::{ExecutionStatus, SyncCounters};
use super::job::Job;
use crate::impl_domain_enum_conversions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Started,
    Completed,
    Failed,
}

impl_domain_enum_conversions!(NotificationKind {
    Started => "started",
    Completed => "completed",
    Failed => "failed",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub job_id: Uuid,
    pub job_name: String,
    pub kind: NotificationKind,
    /// Terminal status; `None` for `Started`.
    pub status: Option<ExecutionStatus>,
    pub counters: SyncCounters,
    pub detail_summary: Option<String>,
    pub notify_on_start_override: Option<bool>,
    pub notify_on_complete_override: Option<bool>,
    pub notify_on_fail_override: Option<bool>,
    pub occurred_at: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn started(job: &Job) -> Self {
        Self::for_job(job, NotificationKind::Started, None, SyncCounters::default(), None)
    }

    /// Terminal event; `Completed` for successful statuses, `Failed`
    /// otherwise.
    pub fn finished(
        job: &Job,
        status: ExecutionStatus,
        counters: SyncCounters,
        detail_summary: Option<String>,
    ) -> Self {
        let kind = match status {
            ExecutionStatus::Completed | ExecutionStatus::CompletedWithWarnings => {
                NotificationKind::Completed
            }
            ExecutionStatus::Running | ExecutionStatus::Failed | ExecutionStatus::Cancelled => {
                NotificationKind::Failed
            }
        };
        Self::for_job(job, kind, Some(status), counters, detail_summary)
    }

    fn for_job(
        job: &Job,
        kind: NotificationKind,
        status: Option<ExecutionStatus>,
        counters: SyncCounters,
        detail_summary: Option<String>,
    ) -> Self {
        Self {
            job_id: job.id,
            job_name: job.name.clone(),
            kind,
            status,
            counters,
            detail_summary,
            notify_on_start_override: job.notify_on_start,
            notify_on_complete_override: job.notify_on_complete,
            notify_on_fail_override: job.notify_on_fail,
            occurred_at: Utc::now(),
        }
    }

    /// Per-job override that applies to this event's kind.
    pub const fn override_for_kind(&self) -> Option<bool> {
        match self.kind {
            NotificationKind::Started => self.notify_on_start_override,
            NotificationKind::Completed => self.notify_on_complete_override,
            NotificationKind::Failed => self.notify_on_fail_override,
        }
    }
}
