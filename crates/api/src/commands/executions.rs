//! Execution history commands

use arkive_core::build_detail_summary;
use arkive_domain::{ApplicationLog, ArkiveError, Execution, ExecutionLog, Result as DomainResult};
use uuid::Uuid;

use crate::utils::command_helpers::execute_command;
use crate::AppContext;

/// Default number of executions returned per job.
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

/// Default number of application log rows returned.
pub const DEFAULT_APPLICATION_LOG_LIMIT: u32 = 500;

/// Most recent executions of a job, newest first.
pub async fn list_executions(
    ctx: &AppContext,
    job_id: Uuid,
    limit: Option<u32>,
) -> Result<Vec<Execution>, String> {
    let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT).max(1);
    execute_command("executions::list_executions", || ctx.executions.list_executions(job_id, limit))
        .await
}

pub async fn get_execution(ctx: &AppContext, execution_id: Uuid) -> Result<Execution, String> {
    execute_command("executions::get_execution", || load_execution(ctx, execution_id)).await
}

/// Log rows of one execution in write order; `issues_only` keeps warnings
/// and errors.
pub async fn get_execution_logs(
    ctx: &AppContext,
    execution_id: Uuid,
    issues_only: bool,
) -> Result<Vec<ExecutionLog>, String> {
    execute_command("executions::get_execution_logs", || async move {
        if issues_only {
            ctx.executions.list_issue_logs(execution_id).await
        } else {
            ctx.executions.list_logs(execution_id).await
        }
    })
    .await
}

/// One-line summary of what went wrong, or `None` for a clean run.
pub async fn get_execution_summary(
    ctx: &AppContext,
    execution_id: Uuid,
) -> Result<Option<String>, String> {
    execute_command("executions::get_execution_summary", || summarize(ctx, execution_id)).await
}

/// Persisted application log events, newest first.
pub async fn list_application_logs(
    ctx: &AppContext,
    limit: Option<u32>,
) -> Result<Vec<ApplicationLog>, String> {
    let limit = limit.unwrap_or(DEFAULT_APPLICATION_LOG_LIMIT).max(1);
    execute_command("executions::list_application_logs", || {
        ctx.application_logs.list_application_logs(limit)
    })
    .await
}

async fn load_execution(ctx: &AppContext, execution_id: Uuid) -> DomainResult<Execution> {
    ctx.executions
        .get_execution(execution_id)
        .await?
        .ok_or_else(|| ArkiveError::NotFound(format!("execution {execution_id}")))
}

async fn summarize(ctx: &AppContext, execution_id: Uuid) -> DomainResult<Option<String>> {
    let logs = ctx.executions.list_issue_logs(execution_id).await?;
    Ok(build_detail_summary(&logs))
}
