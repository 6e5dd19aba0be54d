//! Command execution helpers
//!
//! Every command goes through [`execute_command`] so timing, logging and
//! error-to-string conversion look the same everywhere.

use std::future::Future;
use std::time::Instant;

use arkive_domain::Result as DomainResult;

use crate::utils::logging::log_command_execution;

/// Run a command body, log its outcome and convert errors to the display
/// string the front end shows.
///
/// # Example
///
/// ```rust,ignore
/// pub async fn list_jobs(ctx: &AppContext) -> Result<Vec<Job>, String> {
///     execute_command("jobs::list_jobs", || async { ctx.jobs.list_active_jobs().await }).await
/// }
/// ```
pub async fn execute_command<F, Fut, T>(command_name: &str, command_fn: F) -> Result<T, String>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DomainResult<T>>,
{
    let start = Instant::now();
    let result = command_fn().await;
    log_command_execution(command_name, start.elapsed(), result.as_ref().err());
    result.map_err(|e| e.to_string())
}
