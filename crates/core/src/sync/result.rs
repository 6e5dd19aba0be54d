//! Aggregate result of one sync pass

use arkive_domain::{LogLevel, OperationType, SyncCounters};

/// Per-file log entry produced by the engine, persisted by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncLogEntry {
    pub level: LogLevel,
    pub message: String,
    pub file_path: Option<String>,
    pub operation: Option<OperationType>,
    pub exception: Option<String>,
}

impl SyncLogEntry {
    pub fn info(message: impl Into<String>, file_path: impl Into<String>, operation: OperationType) -> Self {
        Self {
            level: LogLevel::Info,
            message: message.into(),
            file_path: Some(file_path.into()),
            operation: Some(operation),
            exception: None,
        }
    }

    pub fn error(
        message: impl Into<String>,
        file_path: impl Into<String>,
        operation: OperationType,
        exception: impl Into<String>,
    ) -> Self {
        Self {
            level: LogLevel::Error,
            message: message.into(),
            file_path: Some(file_path.into()),
            operation: Some(operation),
            exception: Some(exception.into()),
        }
    }

    pub fn warning(message: impl Into<String>, file_path: impl Into<String>, operation: OperationType) -> Self {
        Self {
            level: LogLevel::Warning,
            message: message.into(),
            file_path: Some(file_path.into()),
            operation: Some(operation),
            exception: None,
        }
    }
}

/// Counters plus the per-file entries of a finished pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncResult {
    pub counters: SyncCounters,
    pub entries: Vec<SyncLogEntry>,
}

impl SyncResult {
    pub fn from_counters(counters: SyncCounters) -> Self {
        Self { counters, entries: Vec::new() }
    }

    /// Entries worth persisting: warnings and errors always, info only when
    /// `verbose`.
    pub fn persistable_entries(&self, verbose: bool) -> impl Iterator<Item = &SyncLogEntry> {
        self.entries.iter().filter(move |entry| match entry.level {
            LogLevel::Info => verbose,
            LogLevel::Warning | LogLevel::Error => true,
        })
    }
}
