//! Job lifecycle: editing, execution, scheduling control and log retention

pub mod control;
pub mod orchestrator;
pub mod paths;
pub mod ports;
pub mod retention;
pub mod state;
pub mod summary;

pub use control::{ScheduleControlService, StoreLockRetry};
pub use orchestrator::JobExecutionService;
pub use ports::{
    ApplicationLogRepository, ExecutionRepository, JobRepository, JobRunner, JobSchedulerPort,
    LogPruner, SchedulerControl,
};
pub use retention::LogRetentionService;
pub use state::{JobEditError, JobStateService};
pub use summary::build_detail_summary;
