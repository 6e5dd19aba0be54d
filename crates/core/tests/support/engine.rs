//! Scripted sync engine and pruner doubles

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use arkive_core::{LogPruner, SyncEngine, SyncResult};
use arkive_domain::{ArkiveError, Job, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Returns a fixed outcome. With `hold` set, waits until released or
/// cancelled before answering.
#[derive(Clone)]
pub struct ScriptedEngine {
    outcome: Arc<Mutex<Result<SyncResult>>>,
    release: Option<Arc<Notify>>,
    calls: Arc<AtomicU32>,
}

impl ScriptedEngine {
    pub fn returning(outcome: Result<SyncResult>) -> Self {
        Self { outcome: Arc::new(Mutex::new(outcome)), release: None, calls: Arc::default() }
    }

    /// Blocks every call until `release` is notified or the token fires.
    pub fn held(outcome: Result<SyncResult>, release: Arc<Notify>) -> Self {
        Self { release: Some(release), ..Self::returning(outcome) }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SyncEngine for ScriptedEngine {
    async fn execute(&self, _job: &Job, cancel: CancellationToken) -> Result<SyncResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(release) = &self.release {
            tokio::select! {
                () = release.notified() => {}
                () = cancel.cancelled() => {
                    return Err(ArkiveError::Cancelled("sync interrupted".into()));
                }
            }
        }
        self.outcome.lock().clone()
    }
}

/// Counts prune calls; optionally fails every call.
#[derive(Default, Clone)]
pub struct CountingPruner {
    calls: Arc<AtomicU32>,
    fail: bool,
}

impl CountingPruner {
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogPruner for CountingPruner {
    async fn prune(&self) -> Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ArkiveError::StoreLocked("database is locked".into()));
        }
        Ok(0)
    }
}
