//! Human-readable schedule preview for the job editor

use std::fmt;

use arkive_domain::constants::SCHEDULE_PREVIEW_RUNS;
use arkive_domain::TriggerType;
use chrono::{DateTime, Local, Utc};

use super::validation::{next_fires, parse_cron};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulePreview {
    Manual,
    InvalidCron,
    NoUpcomingRuns,
    NextRuns(Vec<DateTime<Utc>>),
    OneTimeMissing,
    OneTimeInPast,
    OneTime(DateTime<Utc>),
}

pub fn preview_schedule(
    trigger_type: TriggerType,
    cron_expression: Option<&str>,
    one_time_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> SchedulePreview {
    match trigger_type {
        TriggerType::Manual => SchedulePreview::Manual,
        TriggerType::Recurring => {
            let Some(schedule) = cron_expression.and_then(|cron| parse_cron(cron).ok()) else {
                return SchedulePreview::InvalidCron;
            };
            let runs = next_fires(&schedule, now, SCHEDULE_PREVIEW_RUNS);
            if runs.is_empty() {
                SchedulePreview::NoUpcomingRuns
            } else {
                SchedulePreview::NextRuns(runs)
            }
        }
        TriggerType::OneTime => match one_time_at {
            None => SchedulePreview::OneTimeMissing,
            Some(at) if at <= now => SchedulePreview::OneTimeInPast,
            Some(at) => SchedulePreview::OneTime(at),
        },
    }
}

fn local(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

impl fmt::Display for SchedulePreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => f.write_str("No automatic schedule (manual only)."),
            Self::InvalidCron => f.write_str("Enter a valid cron expression to preview next runs."),
            Self::NoUpcomingRuns => {
                f.write_str("No upcoming runs were found for this cron expression.")
            }
            Self::NextRuns(runs) => {
                write!(f, "Next {} runs:", runs.len())?;
                for run in runs {
                    write!(f, "\n- {}", local(run))?;
                }
                Ok(())
            }
            Self::OneTimeMissing => f.write_str("Select a one-time date and time to preview."),
            Self::OneTimeInPast => f.write_str("One-time run must be in the future."),
            Self::OneTime(at) => write!(f, "Next run: {}", local(at)),
        }
    }
}
