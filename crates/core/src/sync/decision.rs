//! Per-file sync decision

use arkive_domain::{ComparisonMethod, OverwriteBehavior, SyncMode};

use super::snapshot::FileSnapshot;

/// What the engine should do with one source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncAction {
    Copy,
    Update,
    Skip,
}

/// Decide the action for `source` given its destination counterpart.
///
/// Sync mode and overwrite behavior are accepted so callers pass the full job
/// context, but they only matter downstream: orphan deletion and KeepBoth
/// renaming happen in the engine.
pub fn decide(
    source: &FileSnapshot,
    destination: Option<&FileSnapshot>,
    _mode: SyncMode,
    method: ComparisonMethod,
    _overwrite: OverwriteBehavior,
) -> SyncAction {
    let Some(destination) = destination else {
        return SyncAction::Copy;
    };

    // Accurate does not hash here; both methods use the size + mtime marker.
    let unchanged = match method {
        ComparisonMethod::Fast | ComparisonMethod::Accurate => {
            source.same_content_marker(destination)
        }
    };

    if unchanged {
        SyncAction::Skip
    } else {
        SyncAction::Update
    }
}
