//! Schedule normalization, validation and preview
//!
//! Cron expressions are seconds-first (Quartz style) and are evaluated in the
//! local time zone of the machine running the scheduler.

pub mod cron_mode;
pub mod error;
pub mod preview;
pub mod validation;

pub use cron_mode::{
    daily_cron, monthly_cron, try_parse_simple, weekly_cron, RecurringScheduleMode,
    SimpleFrequency, SimpleRecurring, TimeOfDay,
};
pub use error::ScheduleError;
pub use preview::{preview_schedule, SchedulePreview};
pub use validation::{
    is_valid_cron, next_fire_after, next_fires, parse_cron, plan_trigger, validate_one_time,
};
