//! Point-in-time identity of a file inside one sync pass

use chrono::{DateTime, Utc};

/// Path, size and UTC modification time of a file. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSnapshot {
    pub path: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

impl FileSnapshot {
    pub fn new(path: impl Into<String>, size: u64, modified: DateTime<Utc>) -> Self {
        Self { path: path.into(), size, modified }
    }

    /// Same size and same modification instant.
    pub fn same_content_marker(&self, other: &Self) -> bool {
        self.size == other.size && self.modified == other.modified
    }
}
