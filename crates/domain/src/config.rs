//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_DATABASE_FILE, DEFAULT_MAX_CONCURRENCY,
    DEFAULT_MISFIRE_THRESHOLD_SECS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_POOL_SIZE,
};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub scheduler: SchedulerConfig,
    pub archive: ArchiveConfig,
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_DATABASE_FILE.to_string(),
            pool_size: DEFAULT_POOL_SIZE,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

/// Trigger engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// How often the trigger store is polled for due triggers.
    pub poll_interval_ms: u64,
    /// Upper bound on concurrently executing triggers.
    pub max_concurrency: usize,
    /// A trigger later than this is skipped instead of fired.
    pub misfire_threshold_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            misfire_threshold_secs: DEFAULT_MISFIRE_THRESHOLD_SECS,
        }
    }
}

/// Archive behaviour configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Value of the global schedule flag when none has been persisted yet.
    pub schedule_enabled_default: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self { schedule_enabled_default: true }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    pub json: bool,
    /// When set, logs are also written to a daily rolling file here.
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false, directory: None }
    }
}
