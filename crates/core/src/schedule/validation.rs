//! Cron and one-time validation plus next-fire computation

use std::str::FromStr;

use arkive_domain::{Job, TriggerSchedule, TriggerType};
use chrono::{DateTime, Local, Utc};
use cron::Schedule;

use super::error::ScheduleError;

/// Parse a trimmed cron expression with the `cron` grammar.
pub fn parse_cron(expression: &str) -> Result<Schedule, ScheduleError> {
    let trimmed = expression.trim();
    if trimmed.is_empty() {
        return Err(ScheduleError::BlankCron);
    }

    Schedule::from_str(trimmed).map_err(|err| ScheduleError::InvalidCron {
        expression: trimmed.to_string(),
        reason: err.to_string(),
    })
}

pub fn is_valid_cron(expression: &str) -> bool {
    parse_cron(expression).is_ok()
}

/// First fire instant strictly after `after`, evaluated in local time.
pub fn next_fire_after(schedule: &Schedule, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    schedule.after(&after.with_timezone(&Local)).next().map(|next| next.with_timezone(&Utc))
}

/// Up to `count` fire instants strictly after `after`.
pub fn next_fires(schedule: &Schedule, after: DateTime<Utc>, count: usize) -> Vec<DateTime<Utc>> {
    schedule
        .after(&after.with_timezone(&Local))
        .take(count)
        .map(|next| next.with_timezone(&Utc))
        .collect()
}

/// A one-time instant must be present and strictly after `now`.
pub fn validate_one_time(
    at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, ScheduleError> {
    let at = at.ok_or(ScheduleError::MissingOneTime)?;
    if at <= now {
        return Err(ScheduleError::OneTimeNotInFuture);
    }
    Ok(at)
}

/// Trigger a job should have at `now`, if any.
///
/// Disabled, deleted and manual jobs get none. A recurring job with a blank or
/// invalid cron, or one that never fires again, gets none. A one-time job
/// whose instant is not strictly in the future gets none.
pub fn plan_trigger(job: &Job, now: DateTime<Utc>) -> Option<(TriggerSchedule, DateTime<Utc>)> {
    if !job.enabled || job.is_deleted() {
        return None;
    }

    match job.trigger_type {
        TriggerType::Manual => None,
        TriggerType::Recurring => {
            let expression = job.cron_expression.as_deref()?.trim();
            let schedule = parse_cron(expression).ok()?;
            let next = next_fire_after(&schedule, now)?;
            Some((TriggerSchedule::Cron { expression: expression.to_string() }, next))
        }
        TriggerType::OneTime => {
            let fire_at = validate_one_time(job.one_time_at, now).ok()?;
            Some((TriggerSchedule::Once { fire_at }, fire_at))
        }
    }
}
