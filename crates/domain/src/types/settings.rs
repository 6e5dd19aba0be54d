//! Application-wide settings stored in the key/value settings table

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_LOG_RETENTION_VALUE;
use crate::impl_domain_enum_conversions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionUnit {
    Days,
    Months,
}

impl_domain_enum_conversions!(RetentionUnit {
    Days => "days",
    Months => "months",
});

impl RetentionUnit {
    /// Instant `value` units before `now`, or `None` when the subtraction
    /// leaves the representable range.
    pub fn cutoff_before(self, now: DateTime<Utc>, value: u32) -> Option<DateTime<Utc>> {
        match self {
            Self::Days => now.checked_sub_signed(Duration::days(i64::from(value))),
            Self::Months => now.checked_sub_months(Months::new(value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSettings {
    pub run_on_startup: bool,
    pub enable_notifications: bool,
    pub notify_on_start: bool,
    pub notify_on_complete: bool,
    pub notify_on_fail: bool,
    pub play_notification_sound: bool,
    /// Zero disables log pruning.
    pub log_retention_value: u32,
    pub log_retention_unit: RetentionUnit,
    /// Persist per-file Info entries in addition to warnings and errors.
    pub enable_verbose_logging: bool,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            run_on_startup: false,
            enable_notifications: true,
            notify_on_start: false,
            notify_on_complete: true,
            notify_on_fail: true,
            play_notification_sound: true,
            log_retention_value: DEFAULT_LOG_RETENTION_VALUE,
            log_retention_unit: RetentionUnit::Days,
            enable_verbose_logging: false,
        }
    }
}
