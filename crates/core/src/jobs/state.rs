//! Job edit boundary
//!
//! Every edit is validated synchronously before anything is written. A
//! rejected edit persists nothing, including the modified timestamp.

use std::sync::Arc;

use arkive_domain::{ArkiveError, ExclusionPattern, Job, JobDraft, Result, TriggerType};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::paths::{are_equivalent, is_nested_within};
use super::ports::JobRepository;
use crate::schedule::{parse_cron, validate_one_time, ScheduleError};

/// Why an edit was rejected.
#[derive(Debug, Error)]
pub enum JobEditError {
    #[error("Job name is required")]
    BlankName,

    #[error("Source and destination paths are required")]
    BlankPath,

    #[error("Job {0} not found")]
    NotFound(Uuid),

    #[error("Source and destination must be different locations")]
    SamePath,

    #[error("Destination cannot be inside the source folder")]
    DestinationNested,

    #[error("A job named '{0}' already exists")]
    DuplicateName(String),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Store(#[from] ArkiveError),
}

impl From<JobEditError> for ArkiveError {
    fn from(err: JobEditError) -> Self {
        match err {
            JobEditError::NotFound(id) => Self::NotFound(format!("job {id}")),
            JobEditError::Store(inner) => inner,
            other => Self::InvalidInput(other.to_string()),
        }
    }
}

/// Normalized schedule fields: only the one matching the trigger type is set.
type ScheduleFields = (Option<String>, Option<DateTime<Utc>>);

pub struct JobStateService {
    jobs: Arc<dyn JobRepository>,
}

impl JobStateService {
    pub fn new(jobs: Arc<dyn JobRepository>) -> Self {
        Self { jobs }
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create(&self, draft: JobDraft) -> std::result::Result<Job, JobEditError> {
        let now = Utc::now();
        let (cron_expression, one_time_at) = validate_draft(&draft, now)?;
        let name = draft.name.trim().to_string();

        if self.jobs.name_exists(&name, None).await? {
            return Err(JobEditError::DuplicateName(name));
        }

        let job = Job {
            id: Uuid::now_v7(),
            name,
            description: draft.description,
            source_path: draft.source_path.trim().to_string(),
            destination_path: draft.destination_path.trim().to_string(),
            enabled: draft.enabled,
            sync_mode: draft.sync_mode,
            comparison_method: draft.comparison_method,
            overwrite_behavior: draft.overwrite_behavior,
            trigger_type: draft.trigger_type,
            cron_expression,
            one_time_at,
            notify_on_start: draft.notify_on_start,
            notify_on_complete: draft.notify_on_complete,
            notify_on_fail: draft.notify_on_fail,
            sync_options: Some(draft.sync_options),
            exclusion_patterns: self.resolve_patterns(&draft.exclusion_pattern_ids).await?,
            created_at: now,
            modified_at: now,
            deleted_at: None,
            last_run_at: None,
        };

        self.jobs.insert_job(&job).await?;
        info!(job_id = %job.id, "job.created");
        self.reload(job.id).await
    }

    /// Validate and apply `draft` to an existing, non-deleted job.
    #[instrument(skip(self, draft), fields(job_id = %id))]
    pub async fn update(&self, id: Uuid, draft: JobDraft) -> std::result::Result<Job, JobEditError> {
        let now = Utc::now();
        let (cron_expression, one_time_at) = validate_draft(&draft, now)?;
        let name = draft.name.trim().to_string();

        let Some(mut job) = self.jobs.get_job(id).await?.filter(|job| !job.is_deleted()) else {
            warn!("job.update_rejected_missing");
            return Err(JobEditError::NotFound(id));
        };

        if self.jobs.name_exists(&name, Some(id)).await? {
            return Err(JobEditError::DuplicateName(name));
        }

        job.name = name;
        job.description = draft.description;
        job.source_path = draft.source_path.trim().to_string();
        job.destination_path = draft.destination_path.trim().to_string();
        job.enabled = draft.enabled;
        job.sync_mode = draft.sync_mode;
        job.comparison_method = draft.comparison_method;
        job.overwrite_behavior = draft.overwrite_behavior;
        job.trigger_type = draft.trigger_type;
        job.cron_expression = cron_expression;
        job.one_time_at = one_time_at;
        job.notify_on_start = draft.notify_on_start;
        job.notify_on_complete = draft.notify_on_complete;
        job.notify_on_fail = draft.notify_on_fail;
        job.sync_options = Some(draft.sync_options);
        job.exclusion_patterns = self.resolve_patterns(&draft.exclusion_pattern_ids).await?;
        job.modified_at = now.max(job.modified_at);

        self.jobs.update_job(&job).await?;
        info!("job.updated");
        self.reload(id).await
    }

    /// Returns whether the job existed.
    #[instrument(skip(self), fields(job_id = %id))]
    pub async fn set_enabled(&self, id: Uuid, enabled: bool) -> Result<bool> {
        let found = self.jobs.set_enabled(id, enabled, Utc::now()).await?;
        if found {
            info!(enabled, "job.enabled_changed");
        }
        Ok(found)
    }

    /// Sets the deleted timestamp. Execution history is kept.
    #[instrument(skip(self), fields(job_id = %id))]
    pub async fn soft_delete(&self, id: Uuid) -> Result<bool> {
        let found = self.jobs.soft_delete(id, Utc::now()).await?;
        if found {
            info!("job.soft_deleted");
        }
        Ok(found)
    }

    /// Job-scoped patterns for `ids`. Unknown and global ids are ignored.
    async fn resolve_patterns(&self, ids: &[Uuid]) -> Result<Vec<ExclusionPattern>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let patterns = self.jobs.list_exclusion_patterns().await?;
        Ok(patterns.into_iter().filter(|p| !p.is_global && ids.contains(&p.id)).collect())
    }

    async fn reload(&self, id: Uuid) -> std::result::Result<Job, JobEditError> {
        self.jobs.get_job(id).await?.ok_or(JobEditError::NotFound(id))
    }
}

/// Field checks that need no store access.
pub fn validate_draft(
    draft: &JobDraft,
    now: DateTime<Utc>,
) -> std::result::Result<ScheduleFields, JobEditError> {
    if draft.name.trim().is_empty() {
        return Err(JobEditError::BlankName);
    }

    if draft.source_path.trim().is_empty() || draft.destination_path.trim().is_empty() {
        return Err(JobEditError::BlankPath);
    }

    if are_equivalent(&draft.source_path, &draft.destination_path) {
        return Err(JobEditError::SamePath);
    }

    if is_nested_within(&draft.source_path, &draft.destination_path) {
        return Err(JobEditError::DestinationNested);
    }

    normalize_schedule(draft, now)
}

fn normalize_schedule(
    draft: &JobDraft,
    now: DateTime<Utc>,
) -> std::result::Result<ScheduleFields, JobEditError> {
    match draft.trigger_type {
        TriggerType::Manual => Ok((None, None)),
        TriggerType::Recurring => {
            let expression = draft.cron_expression.as_deref().unwrap_or_default();
            parse_cron(expression)?;
            Ok((Some(expression.trim().to_string()), None))
        }
        TriggerType::OneTime => Ok((None, Some(validate_one_time(draft.one_time_at, now)?))),
    }
}
