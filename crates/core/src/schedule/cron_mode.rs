//! Simple recurring schedules and their cron shapes
//!
//! Three shapes are generated and recognized:
//! - Daily: `0 {m} {h} * * ?`
//! - Weekly: `0 {m} {h} ? * {DOW}`
//! - Monthly: `0 {m} {h} {dom} * ?`
//!
//! Any other expression is "advanced" and only editable as raw cron.

use std::fmt;

use chrono::Weekday;
use once_cell::sync::Lazy;
use regex::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::error::ScheduleError;

static DAILY_PATTERN: Lazy<Regex> =
    Lazy::new(|| shape(r"^0\s+(?P<m>\d{1,2})\s+(?P<h>\d{1,2})\s+\*\s+\*\s+\?$"));
static WEEKLY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    shape(r"^0\s+(?P<m>\d{1,2})\s+(?P<h>\d{1,2})\s+\?\s+\*\s+(?P<dow>SUN|MON|TUE|WED|THU|FRI|SAT)$")
});
static MONTHLY_PATTERN: Lazy<Regex> =
    Lazy::new(|| shape(r"^0\s+(?P<m>\d{1,2})\s+(?P<h>\d{1,2})\s+(?P<dom>\d{1,2})\s+\*\s+\?$"));
static TIME_PATTERN: Lazy<Regex> = Lazy::new(|| shape(r"^(?P<h>\d{1,2}):(?P<m>\d{2})$"));

fn shape(pattern: &str) -> Regex {
    RegexBuilder::new(pattern).case_insensitive(true).build().expect("cron shape regex should compile - this is a bug")
}

/// Wall-clock time of day, 00:00 through 23:59.
///
/// Deserialization goes through [`TimeOfDay::new`], so an out-of-range value
/// never reaches cron generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeOfDay")]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

#[derive(Deserialize)]
struct RawTimeOfDay {
    hour: u32,
    minute: u32,
}

impl TryFrom<RawTimeOfDay> for TimeOfDay {
    type Error = ScheduleError;

    fn try_from(raw: RawTimeOfDay) -> Result<Self, Self::Error> {
        Self::new(raw.hour, raw.minute)
    }
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Result<Self, ScheduleError> {
        if hour > 23 || minute > 59 {
            return Err(ScheduleError::InvalidTimeOfDay(format!("{hour:02}:{minute:02}")));
        }
        Ok(Self { hour, minute })
    }

    /// Parse `HH:mm` (single-digit hours accepted).
    pub fn parse(text: &str) -> Result<Self, ScheduleError> {
        let trimmed = text.trim();
        let caps = TIME_PATTERN
            .captures(trimmed)
            .ok_or_else(|| ScheduleError::InvalidTimeOfDay(trimmed.to_string()))?;
        let hour = number(&caps, "h");
        let minute = number(&caps, "m");
        Self::new(hour, minute).map_err(|_| ScheduleError::InvalidTimeOfDay(trimmed.to_string()))
    }

    pub const fn hour(&self) -> u32 {
        self.hour
    }

    pub const fn minute(&self) -> u32 {
        self.minute
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "frequency", rename_all = "snake_case")]
pub enum SimpleFrequency {
    Daily,
    Weekly { weekday: Weekday },
    Monthly { day_of_month: u32 },
}

/// A recurring schedule expressible without raw cron.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleRecurring {
    #[serde(flatten)]
    pub frequency: SimpleFrequency,
    pub time: TimeOfDay,
}

impl SimpleRecurring {
    pub fn to_cron(&self) -> Result<String, ScheduleError> {
        let TimeOfDay { hour, minute } = self.time;
        match self.frequency {
            SimpleFrequency::Daily => Ok(format!("0 {minute} {hour} * * ?")),
            SimpleFrequency::Weekly { weekday } => {
                Ok(format!("0 {minute} {hour} ? * {}", weekday_token(weekday)))
            }
            SimpleFrequency::Monthly { day_of_month } => {
                check_day_of_month(day_of_month)?;
                Ok(format!("0 {minute} {hour} {day_of_month} * ?"))
            }
        }
    }
}

/// How the editor should present a stored cron expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurringScheduleMode {
    Simple(SimpleRecurring),
    Advanced,
}

impl RecurringScheduleMode {
    pub fn classify(expression: &str) -> Self {
        try_parse_simple(expression).map_or(Self::Advanced, Self::Simple)
    }
}

pub fn daily_cron(time_of_day: &str) -> Result<String, ScheduleError> {
    SimpleRecurring { frequency: SimpleFrequency::Daily, time: TimeOfDay::parse(time_of_day)? }
        .to_cron()
}

pub fn weekly_cron(weekday: Option<Weekday>, time_of_day: &str) -> Result<String, ScheduleError> {
    let weekday = weekday.ok_or(ScheduleError::MissingWeekday)?;
    SimpleRecurring {
        frequency: SimpleFrequency::Weekly { weekday },
        time: TimeOfDay::parse(time_of_day)?,
    }
    .to_cron()
}

pub fn monthly_cron(day_of_month: u32, time_of_day: &str) -> Result<String, ScheduleError> {
    check_day_of_month(day_of_month)?;
    SimpleRecurring {
        frequency: SimpleFrequency::Monthly { day_of_month },
        time: TimeOfDay::parse(time_of_day)?,
    }
    .to_cron()
}

/// Recognize one of the three generated shapes. Out-of-range fields make the
/// expression advanced.
pub fn try_parse_simple(expression: &str) -> Option<SimpleRecurring> {
    let cron = expression.trim();
    if cron.is_empty() {
        return None;
    }

    if let Some(caps) = DAILY_PATTERN.captures(cron) {
        let time = time_from(&caps)?;
        return Some(SimpleRecurring { frequency: SimpleFrequency::Daily, time });
    }

    if let Some(caps) = WEEKLY_PATTERN.captures(cron) {
        let time = time_from(&caps)?;
        let weekday = parse_weekday_token(caps.name("dow")?.as_str())?;
        return Some(SimpleRecurring { frequency: SimpleFrequency::Weekly { weekday }, time });
    }

    if let Some(caps) = MONTHLY_PATTERN.captures(cron) {
        let time = time_from(&caps)?;
        let day_of_month = number(&caps, "dom");
        check_day_of_month(day_of_month).ok()?;
        return Some(SimpleRecurring { frequency: SimpleFrequency::Monthly { day_of_month }, time });
    }

    None
}

fn time_from(caps: &Captures<'_>) -> Option<TimeOfDay> {
    TimeOfDay::new(number(caps, "h"), number(caps, "m")).ok()
}

// Groups are at most two ASCII digits, so parsing cannot overflow.
fn number(caps: &Captures<'_>, name: &str) -> u32 {
    caps.name(name).and_then(|m| m.as_str().parse().ok()).unwrap_or(u32::MAX)
}

fn check_day_of_month(day_of_month: u32) -> Result<(), ScheduleError> {
    if (1..=31).contains(&day_of_month) {
        Ok(())
    } else {
        Err(ScheduleError::InvalidDayOfMonth(day_of_month))
    }
}

const fn weekday_token(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sun => "SUN",
        Weekday::Mon => "MON",
        Weekday::Tue => "TUE",
        Weekday::Wed => "WED",
        Weekday::Thu => "THU",
        Weekday::Fri => "FRI",
        Weekday::Sat => "SAT",
    }
}

fn parse_weekday_token(token: &str) -> Option<Weekday> {
    match token.to_ascii_uppercase().as_str() {
        "SUN" => Some(Weekday::Sun),
        "MON" => Some(Weekday::Mon),
        "TUE" => Some(Weekday::Tue),
        "WED" => Some(Weekday::Wed),
        "THU" => Some(Weekday::Thu),
        "FRI" => Some(Weekday::Fri),
        "SAT" => Some(Weekday::Sat),
        _ => None,
    }
}
