//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Storage
pub const DEFAULT_DATABASE_FILE: &str = "arkive.db";
pub const DEFAULT_POOL_SIZE: u32 = 8;
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

// Scheduler
pub const TRIGGER_KEY_PREFIX: &str = "arkive-trigger-";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;
pub const DEFAULT_MISFIRE_THRESHOLD_SECS: u64 = 60;
pub const SCHEDULE_PREVIEW_RUNS: usize = 5;

// Global schedule flag
pub const SCHEDULE_ENABLED_KEY: &str = "ArchiveScheduleEnabled";
pub const STORE_LOCK_MAX_ATTEMPTS: u32 = 5;
pub const STORE_LOCK_RETRY_STEP_MS: u64 = 250;

// Application settings keys
pub const SETTING_RUN_ON_STARTUP: &str = "RunOnStartup";
pub const SETTING_ENABLE_NOTIFICATIONS: &str = "EnableNotifications";
pub const SETTING_NOTIFY_ON_START: &str = "NotifyOnStart";
pub const SETTING_NOTIFY_ON_COMPLETE: &str = "NotifyOnComplete";
pub const SETTING_NOTIFY_ON_FAIL: &str = "NotifyOnFail";
pub const SETTING_PLAY_SOUND: &str = "PlayNotificationSound";
pub const SETTING_LOG_RETENTION_VALUE: &str = "LogRetentionValue";
pub const SETTING_LOG_RETENTION_UNIT: &str = "LogRetentionUnit";
pub const SETTING_VERBOSE_LOGGING: &str = "EnableVerboseLogging";
pub const DEFAULT_LOG_RETENTION_VALUE: u32 = 7;

// Sync engine
pub const KEEP_BOTH_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";
pub const COPY_BUFFER_SIZE: usize = 64 * 1024;

// Notifications
pub const NOTIFICATION_MIN_INTERVAL_MS: u64 = 2_000;
pub const NOTIFICATION_DEDUPE_WINDOW_MS: u64 = 20_000;
pub const NOTIFICATION_CHANNEL_CAPACITY: usize = 256;
pub const DETAIL_SUMMARY_MAX_LEN: usize = 240;
pub const DETAIL_SUMMARY_TRUNCATE_SUFFIX: &str = "...";
