//! Application context startup, schedule flag and shutdown.

mod support;

use std::time::Duration;

use arkive_domain::ArkiveError;
use arkive_lib::{get_app_health, get_schedule_enabled, set_schedule_enabled, AppContext};
use support::{test_config, TestApp};
use tempfile::TempDir;

#[tokio::test(flavor = "multi_thread")]
async fn context_starts_engine_and_reports_healthy() {
    let app = TestApp::new().await;

    assert!(app.ctx.scheduler.engine().is_running());
    let health = get_app_health(&app.ctx).await.expect("health");
    assert!(health.is_healthy, "unexpected health: {health:?}");
    assert_eq!(health.components.len(), 2);

    app.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn second_instance_in_same_lock_dir_is_rejected() {
    let temp_dir = TempDir::new().expect("temp dir");
    let lock_dir = temp_dir.path().join("lock");

    let first = AppContext::new_with_config_in_lock_dir(test_config(temp_dir.path()), &lock_dir)
        .await
        .expect("first instance");

    let second = AppContext::new_with_config_in_lock_dir(test_config(temp_dir.path()), &lock_dir).await;
    assert!(matches!(second, Err(ArkiveError::AlreadyRunning(_))));

    first.shutdown().await.expect("shutdown");
}

#[tokio::test(flavor = "multi_thread")]
async fn schedule_flag_defaults_on_and_toggles_pause() {
    let app = TestApp::new().await;

    assert!(get_schedule_enabled(&app.ctx).await.expect("read flag"));
    assert!(!app.ctx.scheduler.engine().is_paused().await.expect("paused state"));

    set_schedule_enabled(&app.ctx, false).await.expect("disable schedule");
    assert!(!get_schedule_enabled(&app.ctx).await.expect("read flag"));
    assert!(app.ctx.scheduler.engine().is_paused().await.expect("paused state"));

    set_schedule_enabled(&app.ctx, true).await.expect("enable schedule");
    assert!(!app.ctx.scheduler.engine().is_paused().await.expect("paused state"));

    app.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn disabled_default_pauses_a_fresh_database() {
    let temp_dir = TempDir::new().expect("temp dir");
    let mut config = test_config(temp_dir.path());
    config.archive.schedule_enabled_default = false;

    let ctx = AppContext::new_with_config_in_lock_dir(config, temp_dir.path().join("lock"))
        .await
        .expect("context");

    assert!(!get_schedule_enabled(&ctx).await.expect("read flag"));
    assert!(ctx.scheduler.engine().is_paused().await.expect("paused state"));

    ctx.shutdown().await.expect("shutdown");
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_is_prompt_and_repeatable() {
    let app = TestApp::new().await;

    tokio::time::timeout(Duration::from_secs(5), app.ctx.shutdown())
        .await
        .expect("shutdown should finish within 5 seconds")
        .expect("shutdown should succeed");
    assert!(!app.ctx.scheduler.engine().is_running());

    app.ctx.shutdown().await.expect("second shutdown is harmless");
}
