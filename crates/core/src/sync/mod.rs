//! File synchronization primitives
//!
//! Pure pieces of the sync pipeline: snapshots, exclusion matching, the
//! per-file decision and the engine port implemented by infrastructure.

pub mod decision;
pub mod glob;
pub mod ports;
pub mod result;
pub mod snapshot;

pub use decision::{decide, SyncAction};
pub use glob::GlobMatcher;
pub use ports::SyncEngine;
pub use result::{SyncLogEntry, SyncResult};
pub use snapshot::FileSnapshot;
