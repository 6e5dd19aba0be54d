use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use arkive_core::{ApplicationLogRepository, LogPruner};
use arkive_domain::{ApplicationLog, ArkiveError, LoggingConfig, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use super::application_log::{write_application_logs, ApplicationLogLayer, APPLICATION_LOG_CAPACITY};

const LOG_FILE_PREFIX: &str = "arkive.log";

/// Keeps the non-blocking file writer flushing until dropped.
///
/// Hold this for the lifetime of the process; dropping it early loses
/// buffered log lines.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
    application_logs: Option<mpsc::Receiver<ApplicationLog>>,
}

impl LoggingGuard {
    /// Start persisting captured events to `store`, pruned through `pruner`.
    ///
    /// Events logged before this call wait in the queue. Returns `None` when
    /// a writer was already started.
    pub fn persist_to(
        &mut self,
        store: Arc<dyn ApplicationLogRepository>,
        pruner: Arc<dyn LogPruner>,
    ) -> Option<JoinHandle<()>> {
        let receiver = self.application_logs.take()?;
        Some(tokio::spawn(write_application_logs(receiver, store, pruner)))
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `config.level`. When `config.directory` is set, a
/// daily rolling file is written there alongside stderr. Info and above is
/// also queued for the application log table; see [`LoggingGuard::persist_to`].
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
    };

    let stderr_layer = if config.json {
        fmt::layer().json().with_writer(std::io::stderr).with_filter(filter()).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).with_filter(filter()).boxed()
    };

    let (file_layer, file_guard) = match config.directory.as_deref() {
        Some(directory) => {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(directory)?);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer).with_filter(filter());
            (Some(layer.boxed()), Some(guard))
        }
        None => (None, None),
    };

    let (sender, receiver) = mpsc::channel(APPLICATION_LOG_CAPACITY);
    let database_layer = ApplicationLogLayer::new(sender).with_filter(filter());

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .with(database_layer)
        .try_init()
        .map_err(|e| ArkiveError::Config(format!("failed to install log subscriber: {e}")))?;

    info!(level = %config.level, json = config.json, file = config.directory.is_some(), "logging.initialised");
    Ok(LoggingGuard { _file_guard: file_guard, application_logs: Some(receiver) })
}

fn file_appender(directory: &str) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(Path::new(directory))?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(directory)
        .map_err(|e| ArkiveError::Config(format!("failed to open log directory {directory}: {e}")))
}

/// Log the outcome of a command with structured fields.
///
/// `command` is a stable identifier such as `"jobs::create_job"`; callers
/// must not put user data in it.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, error: Option<&ArkiveError>) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    match error {
        None => info!(command, duration_ms, "command.succeeded"),
        Some(err) => warn!(command, duration_ms, error_kind = err.label(), error = %err, "command.failed"),
    }
}
