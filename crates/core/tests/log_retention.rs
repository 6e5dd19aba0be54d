//! Integration tests for execution log retention

mod support;

use std::sync::Arc;

use arkive_core::{ApplicationLogRepository, ApplicationSettingsService, LogPruner, LogRetentionService};
use arkive_domain::constants::{SETTING_LOG_RETENTION_UNIT, SETTING_LOG_RETENTION_VALUE};
use arkive_domain::{ApplicationLog, ExecutionLog, LogLevel};
use chrono::{Duration, Utc};
use support::repositories::{
    InMemoryApplicationLogRepository, InMemoryExecutionRepository, InMemorySettingsRepository,
};
use uuid::Uuid;

fn aged_log(days: i64) -> ExecutionLog {
    let mut log = ExecutionLog::new(Uuid::now_v7(), LogLevel::Info, format!("{days} days old"));
    log.timestamp = Utc::now() - Duration::days(days);
    log
}

fn retention(
    settings: InMemorySettingsRepository,
    executions: &InMemoryExecutionRepository,
) -> LogRetentionService {
    LogRetentionService::new(
        ApplicationSettingsService::new(Arc::new(settings)),
        Arc::new(executions.clone()),
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn seven_day_window_removes_only_older_rows() {
    let executions = InMemoryExecutionRepository::default();
    executions.seed_log(aged_log(10));
    executions.seed_log(aged_log(1));

    let removed = retention(InMemorySettingsRepository::default(), &executions)
        .prune()
        .await
        .expect("prune should succeed");

    assert_eq!(removed, 1);
    let remaining = executions.all_logs();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].message, "1 days old");
}

#[tokio::test(flavor = "multi_thread")]
async fn zero_retention_never_removes() {
    let executions = InMemoryExecutionRepository::default();
    executions.seed_log(aged_log(4000));
    let settings = InMemorySettingsRepository::default().with(SETTING_LOG_RETENTION_VALUE, "0");

    let removed = retention(settings, &executions).prune().await.expect("prune should succeed");

    assert_eq!(removed, 0);
    assert_eq!(executions.all_logs().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn month_window_uses_calendar_months() {
    let executions = InMemoryExecutionRepository::default();
    executions.seed_log(aged_log(40));
    executions.seed_log(aged_log(20));
    let settings = InMemorySettingsRepository::default()
        .with(SETTING_LOG_RETENTION_VALUE, "1")
        .with(SETTING_LOG_RETENTION_UNIT, "months");

    let removed = retention(settings, &executions).prune().await.expect("prune should succeed");

    assert_eq!(removed, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn application_logs_share_the_retention_window() {
    let executions = InMemoryExecutionRepository::default();
    executions.seed_log(aged_log(10));
    let application_logs = InMemoryApplicationLogRepository::default();
    let mut stale = ApplicationLog::new(LogLevel::Warning, "stale");
    stale.timestamp = Utc::now() - Duration::days(30);
    application_logs
        .append_application_logs(&[stale, ApplicationLog::new(LogLevel::Info, "fresh")])
        .await
        .expect("append");

    let removed = retention(InMemorySettingsRepository::default(), &executions)
        .with_application_logs(Arc::new(application_logs.clone()))
        .prune()
        .await
        .expect("prune should succeed");

    assert_eq!(removed, 2);
    let remaining: Vec<_> = application_logs.all().into_iter().map(|log| log.message).collect();
    assert_eq!(remaining, ["fresh"]);
}
