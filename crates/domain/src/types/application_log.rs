//! Process-wide log events kept in the database

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::execution::LogLevel;

/// One persisted log event. `id` is assigned by the store and is zero until
/// the row is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationLog {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub exception: Option<String>,
    /// Module path of the code that emitted the event.
    pub source_context: Option<String>,
}

impl ApplicationLog {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            id: 0,
            timestamp: Utc::now(),
            level,
            message: message.into(),
            exception: None,
            source_context: None,
        }
    }
}
