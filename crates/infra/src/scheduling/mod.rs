//! Scheduling infrastructure for job triggers
//!
//! - `trigger_engine`: polling worker pool over the persistent trigger store
//! - `job_scheduler`: per-job trigger registration plus run-now and stop
//!
//! The engine follows the runtime rules of every background loop here:
//! explicit lifecycle management, join handles for spawned tasks,
//! cancellation token support and timeouts on shutdown.

pub mod error;
pub mod job_scheduler;
pub mod trigger_engine;

pub use error::{SchedulerError, SchedulerResult};
pub use job_scheduler::JobScheduler;
pub use trigger_engine::{TriggerEngine, TriggerEngineConfig};
