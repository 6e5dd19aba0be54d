//! Dry-run preview of a saved job

use arkive_domain::{ArkiveError, Result as DomainResult};
use arkive_infra::{preview_job, JobPreview};
use uuid::Uuid;

use crate::utils::command_helpers::execute_command;
use crate::AppContext;

/// What running the job right now would add, update and delete.
pub async fn get_job_preview(ctx: &AppContext, job_id: Uuid) -> Result<JobPreview, String> {
    execute_command("previews::get_job_preview", || preview_saved_job(ctx, job_id)).await
}

async fn preview_saved_job(ctx: &AppContext, job_id: Uuid) -> DomainResult<JobPreview> {
    let job = match ctx.jobs.get_job(job_id).await? {
        Some(job) if !job.is_deleted() => job,
        _ => return Err(ArkiveError::NotFound(format!("job {job_id}"))),
    };
    preview_job(&job).await
}
