//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Arkive
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ArkiveError {
    #[error("Database error: {0}")]
    Database(String),

    /// The shared store rejected the operation because another writer holds
    /// the lock. This is the only kind retried by the schedule control path.
    #[error("Store locked: {0}")]
    StoreLocked(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Already running: {0}")]
    AlreadyRunning(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ArkiveError {
    /// True for the transient "store locked" kind.
    pub fn is_store_locked(&self) -> bool {
        matches!(self, Self::StoreLocked(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Stable label suitable for structured logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Database(_) => "database",
            Self::StoreLocked(_) => "store_locked",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::AlreadyRunning(_) => "already_running",
            Self::Cancelled(_) => "cancelled",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<std::io::Error> for ArkiveError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type alias for Arkive operations
pub type Result<T> = std::result::Result<T, ArkiveError>;
