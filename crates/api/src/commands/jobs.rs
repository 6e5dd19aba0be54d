//! Job editing and on-demand run commands
//!
//! Every edit that could change when a job fires is followed by a
//! reschedule, so the trigger store always mirrors the persisted jobs.

use arkive_core::JobSchedulerPort;
use arkive_domain::{ArkiveError, ExclusionPattern, Job, JobDraft, Result as DomainResult};
use tracing::info;
use uuid::Uuid;

use crate::utils::command_helpers::execute_command;
use crate::AppContext;

pub async fn list_jobs(ctx: &AppContext) -> Result<Vec<Job>, String> {
    execute_command("jobs::list_jobs", || ctx.jobs.list_active_jobs()).await
}

pub async fn get_job(ctx: &AppContext, job_id: Uuid) -> Result<Job, String> {
    execute_command("jobs::get_job", || load_active_job(ctx, job_id)).await
}

pub async fn create_job(ctx: &AppContext, draft: JobDraft) -> Result<Job, String> {
    execute_command("jobs::create_job", || create_and_schedule(ctx, draft)).await
}

pub async fn update_job(ctx: &AppContext, job_id: Uuid, draft: JobDraft) -> Result<Job, String> {
    execute_command("jobs::update_job", || update_and_reschedule(ctx, job_id, draft)).await
}

/// Returns whether the job existed.
pub async fn set_job_enabled(ctx: &AppContext, job_id: Uuid, enabled: bool) -> Result<bool, String> {
    execute_command("jobs::set_job_enabled", || toggle_and_reschedule(ctx, job_id, enabled)).await
}

/// Soft-delete the job and drop its trigger. Execution history is kept.
pub async fn delete_job(ctx: &AppContext, job_id: Uuid) -> Result<bool, String> {
    execute_command("jobs::delete_job", || delete_and_unschedule(ctx, job_id)).await
}

/// Start the job immediately, independent of its schedule.
pub async fn run_job_now(ctx: &AppContext, job_id: Uuid) -> Result<(), String> {
    execute_command("jobs::run_job_now", || fire_existing(ctx, job_id)).await
}

/// Request cancellation of every running execution of the job. Returns
/// whether anything was running.
pub async fn stop_job(ctx: &AppContext, job_id: Uuid) -> Result<bool, String> {
    execute_command("jobs::stop_job", || ctx.scheduler.stop_job(job_id)).await
}

pub async fn list_exclusion_patterns(ctx: &AppContext) -> Result<Vec<ExclusionPattern>, String> {
    execute_command("jobs::list_exclusion_patterns", || ctx.jobs.list_exclusion_patterns()).await
}

pub async fn save_exclusion_pattern(
    ctx: &AppContext,
    pattern: ExclusionPattern,
) -> Result<ExclusionPattern, String> {
    execute_command("jobs::save_exclusion_pattern", || validate_and_save_pattern(ctx, pattern)).await
}

pub async fn delete_exclusion_pattern(ctx: &AppContext, pattern_id: Uuid) -> Result<bool, String> {
    execute_command("jobs::delete_exclusion_pattern", || ctx.jobs.delete_exclusion_pattern(pattern_id))
        .await
}

async fn load_active_job(ctx: &AppContext, job_id: Uuid) -> DomainResult<Job> {
    match ctx.jobs.get_job(job_id).await? {
        Some(job) if !job.is_deleted() => Ok(job),
        _ => Err(ArkiveError::NotFound(format!("job {job_id}"))),
    }
}

async fn create_and_schedule(ctx: &AppContext, draft: JobDraft) -> DomainResult<Job> {
    let job = ctx.job_state.create(draft).await?;
    ctx.scheduler.schedule_job(job.id).await?;
    info!(job_id = %job.id, "jobs.created");
    Ok(job)
}

async fn update_and_reschedule(ctx: &AppContext, job_id: Uuid, draft: JobDraft) -> DomainResult<Job> {
    let job = ctx.job_state.update(job_id, draft).await?;
    ctx.scheduler.schedule_job(job.id).await?;
    Ok(job)
}

async fn toggle_and_reschedule(ctx: &AppContext, job_id: Uuid, enabled: bool) -> DomainResult<bool> {
    let existed = ctx.job_state.set_enabled(job_id, enabled).await?;
    if existed {
        ctx.scheduler.schedule_job(job_id).await?;
    }
    Ok(existed)
}

async fn delete_and_unschedule(ctx: &AppContext, job_id: Uuid) -> DomainResult<bool> {
    let existed = ctx.job_state.soft_delete(job_id).await?;
    ctx.scheduler.delete_job(job_id).await?;
    Ok(existed)
}

async fn validate_and_save_pattern(
    ctx: &AppContext,
    pattern: ExclusionPattern,
) -> DomainResult<ExclusionPattern> {
    if pattern.pattern.trim().is_empty() {
        return Err(ArkiveError::InvalidInput("Exclusion pattern is required".into()));
    }
    ctx.jobs.save_exclusion_pattern(&pattern).await?;
    Ok(pattern)
}

async fn fire_existing(ctx: &AppContext, job_id: Uuid) -> DomainResult<()> {
    load_active_job(ctx, job_id).await?;
    ctx.scheduler.run_now(job_id).await
}
