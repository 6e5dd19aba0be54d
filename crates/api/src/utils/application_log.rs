//! Database sink for process-wide log events
//!
//! [`ApplicationLogLayer`] turns info-and-above events into
//! [`ApplicationLog`] rows and queues them on a bounded channel. The queue is
//! drained by [`write_application_logs`] once the database is open. A full
//! queue drops events instead of blocking the emitting thread.

use std::fmt::{self, Write as _};
use std::sync::Arc;

use arkive_core::{ApplicationLogRepository, LogPruner};
use arkive_domain::{ApplicationLog, LogLevel};
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{warn, Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Events waiting for the writer before new ones are dropped.
pub const APPLICATION_LOG_CAPACITY: usize = 1024;

/// Rows written per transaction.
const WRITE_BATCH: usize = 64;

/// Rows written between retention passes.
const PRUNE_EVERY: usize = 100;

/// Targets never persisted: the sink itself and the storage it writes
/// through.
const SKIPPED_TARGETS: &[&str] = &[module_path!(), "arkive_infra::database", "arkive_common::storage", "r2d2"];

/// Captures events for the application log table.
pub struct ApplicationLogLayer {
    sender: mpsc::Sender<ApplicationLog>,
}

impl ApplicationLogLayer {
    pub fn new(sender: mpsc::Sender<ApplicationLog>) -> Self {
        Self { sender }
    }
}

impl<S: Subscriber> Layer<S> for ApplicationLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let Some(level) = persisted_level(*metadata.level()) else {
            return;
        };
        let target = metadata.target();
        if SKIPPED_TARGETS.iter().any(|skipped| target.starts_with(skipped)) {
            return;
        }

        let mut fields = EventFields::default();
        event.record(&mut fields);

        // Full or closed queue: the event is dropped
        let _ = self.sender.try_send(ApplicationLog {
            id: 0,
            timestamp: Utc::now(),
            level,
            message: fields.render(),
            exception: fields.error,
            source_context: Some(target.to_string()),
        });
    }
}

fn persisted_level(level: Level) -> Option<LogLevel> {
    if level == Level::ERROR {
        Some(LogLevel::Error)
    } else if level == Level::WARN {
        Some(LogLevel::Warning)
    } else if level == Level::INFO {
        Some(LogLevel::Info)
    } else {
        None
    }
}

/// Message, `error` field and the remaining fields as `key=value` pairs.
#[derive(Default)]
struct EventFields {
    message: String,
    error: Option<String>,
    extra: String,
}

impl EventFields {
    fn render(&self) -> String {
        match (self.message.is_empty(), self.extra.is_empty()) {
            (_, true) => self.message.clone(),
            (true, false) => self.extra.clone(),
            (false, false) => format!("{} {}", self.message, self.extra),
        }
    }

    fn push_extra(&mut self, field: &Field, value: fmt::Arguments<'_>) {
        if !self.extra.is_empty() {
            self.extra.push(' ');
        }
        let _ = write!(self.extra, "{}={}", field.name(), value);
    }
}

impl Visit for EventFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "error" => self.error = Some(value.to_string()),
            _ => self.push_extra(field, format_args!("{value}")),
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{value:?}"),
            "error" => self.error = Some(format!("{value:?}")),
            _ => self.push_extra(field, format_args!("{value:?}")),
        }
    }
}

/// Drain `receiver` into `store` until every sender is gone.
///
/// Write failures drop the batch. Retention runs through `pruner` after
/// every [`PRUNE_EVERY`] rows.
pub async fn write_application_logs(
    mut receiver: mpsc::Receiver<ApplicationLog>,
    store: Arc<dyn ApplicationLogRepository>,
    pruner: Arc<dyn LogPruner>,
) {
    let mut batch = Vec::with_capacity(WRITE_BATCH);
    let mut since_prune = 0;

    while receiver.recv_many(&mut batch, WRITE_BATCH).await > 0 {
        if let Err(err) = store.append_application_logs(&batch).await {
            warn!(error = %err, dropped = batch.len(), "application_log.write_failed");
        }
        since_prune += batch.len();
        batch.clear();

        if since_prune >= PRUNE_EVERY {
            since_prune = 0;
            if let Err(err) = pruner.prune().await {
                warn!(error = %err, "application_log.prune_failed");
            }
        }
    }
}
