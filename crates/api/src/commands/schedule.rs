//! Global schedule toggle and schedule editor helpers

use arkive_core::schedule::{self, RecurringScheduleMode, SchedulePreview, SimpleRecurring};
use arkive_domain::{ArkiveError, TriggerType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::command_helpers::execute_command;
use crate::AppContext;

/// Schedule preview as shown under the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulePreviewResponse {
    pub message: String,
    /// Upcoming fire instants; empty when the schedule cannot fire.
    pub next_runs: Vec<DateTime<Utc>>,
}

impl From<SchedulePreview> for SchedulePreviewResponse {
    fn from(preview: SchedulePreview) -> Self {
        let message = preview.to_string();
        let next_runs = match preview {
            SchedulePreview::NextRuns(runs) => runs,
            SchedulePreview::OneTime(at) => vec![at],
            SchedulePreview::Manual
            | SchedulePreview::InvalidCron
            | SchedulePreview::NoUpcomingRuns
            | SchedulePreview::OneTimeMissing
            | SchedulePreview::OneTimeInPast => Vec::new(),
        };
        Self { message, next_runs }
    }
}

pub async fn get_schedule_enabled(ctx: &AppContext) -> Result<bool, String> {
    execute_command("schedule::get_schedule_enabled", || ctx.schedule_control.get_schedule_enabled())
        .await
}

/// Persist the flag and pause or resume every trigger accordingly.
pub async fn set_schedule_enabled(ctx: &AppContext, enabled: bool) -> Result<(), String> {
    execute_command("schedule::set_schedule_enabled", || {
        ctx.schedule_control.set_schedule_enabled(enabled)
    })
    .await
}

/// Preview what a trigger configuration would do from now on.
pub fn preview_job_schedule(
    trigger_type: TriggerType,
    cron_expression: Option<&str>,
    one_time_at: Option<DateTime<Utc>>,
) -> SchedulePreviewResponse {
    schedule::preview_schedule(trigger_type, cron_expression, one_time_at, Utc::now()).into()
}

/// Cron expression for a schedule built in the simple editor.
pub fn simple_schedule_to_cron(simple: SimpleRecurring) -> Result<String, String> {
    simple.to_cron().map_err(|e| ArkiveError::from(e).to_string())
}

/// The simple-editor form of a stored expression, or `None` when it needs
/// the advanced editor.
pub fn simple_schedule_from_cron(expression: &str) -> Option<SimpleRecurring> {
    match RecurringScheduleMode::classify(expression) {
        RecurringScheduleMode::Simple(simple) => Some(simple),
        RecurringScheduleMode::Advanced => None,
    }
}
