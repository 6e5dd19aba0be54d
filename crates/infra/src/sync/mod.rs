//! Filesystem synchronization
//!
//! - `engine`: the sync engine that converges a destination tree
//! - `preview`: dry-run counts using the same filters and decisions
//! - `fs_ops`: blocking copy, hash and metadata helpers shared by both

pub mod engine;
mod errors;
pub mod fs_ops;
pub mod preview;

pub use engine::FileSystemSyncEngine;
pub use errors::SyncError;
pub use preview::{preview_job, JobPreview};
