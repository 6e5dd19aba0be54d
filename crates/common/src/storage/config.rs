//! Connection pool configuration

use std::time::Duration;

use super::error::{StorageError, StorageResult};

/// SQLite pool configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlitePoolConfig {
    /// Maximum number of connections in the pool
    pub max_size: u32,

    /// How long to wait for a free connection
    pub connection_timeout: Duration,

    /// Busy timeout applied to every connection
    pub busy_timeout: Duration,

    /// Enable WAL journal mode
    pub enable_wal: bool,

    /// Enable foreign key constraints
    pub enable_foreign_keys: bool,
}

impl Default for SqlitePoolConfig {
    fn default() -> Self {
        Self {
            max_size: 10,
            connection_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_millis(5000),
            enable_wal: true,
            enable_foreign_keys: true,
        }
    }
}

impl SqlitePoolConfig {
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    /// Ensures all configuration values are within acceptable ranges.
    pub fn validate(&self) -> StorageResult<()> {
        if self.max_size == 0 {
            return Err(StorageError::InvalidConfig(
                "max_size must be greater than 0".to_string(),
            ));
        }

        if self.connection_timeout.is_zero() {
            return Err(StorageError::InvalidConfig(
                "connection_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
