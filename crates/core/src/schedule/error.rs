use arkive_domain::ArkiveError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("Time must be in HH:mm format: {0}")]
    InvalidTimeOfDay(String),

    #[error("Day of month must be between 1 and 31, got {0}")]
    InvalidDayOfMonth(u32),

    #[error("Weekly schedules require a day of week")]
    MissingWeekday,

    #[error("Cron expression is required for recurring schedules")]
    BlankCron,

    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidCron { expression: String, reason: String },

    #[error("One-time schedules require a date and time")]
    MissingOneTime,

    #[error("One-time run must be in the future")]
    OneTimeNotInFuture,
}

impl From<ScheduleError> for ArkiveError {
    fn from(err: ScheduleError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
