//! Trigger store, engine and per-job scheduler against a real database.

mod support;

use std::sync::Arc;
use std::time::Duration;

use arkive_core::{JobRepository, JobRunner, JobSchedulerPort, SchedulerControl};
use arkive_domain::{Execution, ExecutionStatus, Result, SyncCounters, Trigger, TriggerSchedule, TriggerType};
use arkive_infra::database::{SqliteJobRepository, SqliteTriggerRepository};
use arkive_infra::scheduling::{JobScheduler, SchedulerError, TriggerEngine, TriggerEngineConfig};
use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use support::{named_job, TestDatabase};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunEvent {
    Started(Uuid),
    Cancelled(Uuid),
}

/// Reports every run; optionally holds until its token is cancelled.
struct RecordingRunner {
    events: mpsc::UnboundedSender<RunEvent>,
    hold_until_cancelled: bool,
}

#[async_trait]
impl JobRunner for RecordingRunner {
    async fn run_job(&self, job_id: Uuid, cancel: CancellationToken) -> Result<Execution> {
        let _ = self.events.send(RunEvent::Started(job_id));
        let mut execution = Execution::start(job_id);
        if self.hold_until_cancelled {
            cancel.cancelled().await;
            let _ = self.events.send(RunEvent::Cancelled(job_id));
            execution.finish(ExecutionStatus::Cancelled, SyncCounters::default());
        } else {
            execution.finish(ExecutionStatus::Completed, SyncCounters::default());
        }
        Ok(execution)
    }
}

struct Harness {
    _db: TestDatabase,
    jobs: Arc<SqliteJobRepository>,
    store: Arc<SqliteTriggerRepository>,
    engine: Arc<TriggerEngine>,
    scheduler: JobScheduler,
    events: mpsc::UnboundedReceiver<RunEvent>,
}

impl Harness {
    fn new(hold_until_cancelled: bool) -> Self {
        let db = TestDatabase::new();
        let jobs = Arc::new(SqliteJobRepository::new(Arc::clone(&db.manager)));
        let store = Arc::new(SqliteTriggerRepository::new(Arc::clone(&db.manager)));
        let (tx, events) = mpsc::unbounded_channel();
        let runner = Arc::new(RecordingRunner { events: tx, hold_until_cancelled });
        let config = TriggerEngineConfig {
            poll_interval: Duration::from_millis(20),
            ..TriggerEngineConfig::default()
        };
        let engine = Arc::new(TriggerEngine::new(Arc::clone(&store), runner, config));
        let scheduler = JobScheduler::new(Arc::clone(&jobs) as Arc<dyn JobRepository>, Arc::clone(&engine));
        Self { _db: db, jobs, store, engine, scheduler, events }
    }

    async fn next_event(&mut self) -> RunEvent {
        tokio::time::timeout(Duration::from_secs(5), self.events.recv())
            .await
            .expect("run event should arrive")
            .expect("runner channel open")
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn recurring_job_gets_a_future_cron_trigger() {
    let harness = Harness::new(false);
    let mut job = named_job("nightly");
    job.trigger_type = TriggerType::Recurring;
    job.cron_expression = Some("0 0 3 * * *".into());
    harness.jobs.insert_job(&job).await.expect("insert job");

    harness.scheduler.schedule_job(job.id).await.expect("schedule");

    let trigger = harness.store.get(job.id).await.expect("read trigger").expect("trigger registered");
    assert_eq!(trigger.schedule, TriggerSchedule::Cron { expression: "0 0 3 * * *".into() });
    assert!(trigger.next_fire_at > Utc::now());
    assert_eq!(trigger.key, job.trigger_key());
}

#[tokio::test(flavor = "multi_thread")]
async fn jobs_that_cannot_fire_get_no_trigger() {
    let harness = Harness::new(false);

    let manual = named_job("manual");

    let mut disabled = named_job("disabled");
    disabled.trigger_type = TriggerType::Recurring;
    disabled.cron_expression = Some("0 0 3 * * *".into());
    disabled.enabled = false;

    let mut bad_cron = named_job("bad-cron");
    bad_cron.trigger_type = TriggerType::Recurring;
    bad_cron.cron_expression = Some("every night please".into());

    let mut past = named_job("past");
    past.trigger_type = TriggerType::OneTime;
    past.one_time_at = Some(Utc::now() - TimeDelta::hours(1));

    for job in [&manual, &disabled, &bad_cron, &past] {
        harness.jobs.insert_job(job).await.expect("insert job");
        harness.scheduler.schedule_job(job.id).await.expect("scheduling never errors for these");
        assert!(harness.store.get(job.id).await.expect("read trigger").is_none(), "{} got a trigger", job.name);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn rescheduling_a_disabled_job_removes_stale_trigger() {
    let harness = Harness::new(false);
    let mut job = named_job("once");
    job.trigger_type = TriggerType::OneTime;
    job.one_time_at = Some(Utc::now() + TimeDelta::hours(2));
    harness.jobs.insert_job(&job).await.expect("insert job");
    harness.scheduler.schedule_job(job.id).await.expect("schedule");
    assert!(harness.store.get(job.id).await.expect("read").is_some());

    harness.jobs.set_enabled(job.id, false, Utc::now()).await.expect("disable");
    harness.scheduler.schedule_job(job.id).await.expect("reschedule");

    assert!(harness.store.get(job.id).await.expect("read").is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_reports_whether_a_trigger_existed() {
    let harness = Harness::new(false);
    let job_id = Uuid::now_v7();
    let fire_at = Utc::now() + TimeDelta::hours(1);
    harness.store.upsert(&Trigger::new(job_id, TriggerSchedule::Once { fire_at }, fire_at)).await.expect("upsert");

    assert!(harness.scheduler.delete_job(job_id).await.expect("delete"));
    assert!(!harness.scheduler.delete_job(job_id).await.expect("second delete"));
}

#[tokio::test(flavor = "multi_thread")]
async fn due_one_shot_fires_once_and_is_removed() {
    let mut harness = Harness::new(false);
    let job_id = Uuid::now_v7();
    let fire_at = Utc::now() - TimeDelta::seconds(1);
    harness.store.upsert(&Trigger::new(job_id, TriggerSchedule::Once { fire_at }, fire_at)).await.expect("upsert");

    let fired = harness.engine.poll_once(Utc::now()).await.expect("poll");

    assert_eq!(fired, 1);
    assert_eq!(harness.next_event().await, RunEvent::Started(job_id));
    assert!(harness.store.get(job_id).await.expect("read").is_none());
    assert_eq!(harness.engine.poll_once(Utc::now()).await.expect("second poll"), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn due_cron_fires_and_moves_to_the_next_instant() {
    let mut harness = Harness::new(false);
    let job_id = Uuid::now_v7();
    let due = Utc::now() - TimeDelta::seconds(2);
    let schedule = TriggerSchedule::Cron { expression: "0 0 * * * *".into() };
    harness.store.upsert(&Trigger::new(job_id, schedule, due)).await.expect("upsert");

    let now = Utc::now();
    assert_eq!(harness.engine.poll_once(now).await.expect("poll"), 1);
    assert_eq!(harness.next_event().await, RunEvent::Started(job_id));

    let trigger = harness.store.get(job_id).await.expect("read").expect("cron trigger kept");
    assert!(trigger.next_fire_at > now);
}

#[tokio::test(flavor = "multi_thread")]
async fn misfired_cron_is_skipped_not_burst() {
    let mut harness = Harness::new(false);
    let job_id = Uuid::now_v7();
    let long_ago = Utc::now() - TimeDelta::hours(3);
    let schedule = TriggerSchedule::Cron { expression: "0 * * * * *".into() };
    harness.store.upsert(&Trigger::new(job_id, schedule, long_ago)).await.expect("upsert");

    let now = Utc::now();
    assert_eq!(harness.engine.poll_once(now).await.expect("poll"), 0);

    let trigger = harness.store.get(job_id).await.expect("read").expect("trigger kept");
    assert!(trigger.next_fire_at > now);
    assert!(harness.events.try_recv().is_err(), "misfire must not run the job");
}

#[tokio::test(flavor = "multi_thread")]
async fn paused_store_fires_nothing_until_resumed() {
    let mut harness = Harness::new(false);
    let job_id = Uuid::now_v7();
    let fire_at = Utc::now() - TimeDelta::seconds(1);
    harness.store.upsert(&Trigger::new(job_id, TriggerSchedule::Once { fire_at }, fire_at)).await.expect("upsert");

    harness.scheduler.pause_all().await.expect("pause");
    assert!(harness.engine.is_paused().await.expect("read paused"));
    assert_eq!(harness.engine.poll_once(Utc::now()).await.expect("poll"), 0);

    harness.scheduler.resume_all().await.expect("resume");
    assert_eq!(harness.engine.poll_once(Utc::now()).await.expect("poll"), 1);
    assert_eq!(harness.next_event().await, RunEvent::Started(job_id));
}

#[tokio::test(flavor = "multi_thread")]
async fn still_running_trigger_is_not_fired_again() {
    let mut harness = Harness::new(true);
    let job_id = Uuid::now_v7();
    let due = Utc::now() - TimeDelta::seconds(1);
    let schedule = TriggerSchedule::Cron { expression: "* * * * * *".into() };
    harness.store.upsert(&Trigger::new(job_id, schedule, due)).await.expect("upsert");

    assert_eq!(harness.engine.poll_once(Utc::now()).await.expect("poll"), 1);
    assert_eq!(harness.next_event().await, RunEvent::Started(job_id));

    // The every-second trigger is due again, but its run is still going
    let later = Utc::now() + TimeDelta::seconds(3);
    assert_eq!(harness.engine.poll_once(later).await.expect("poll"), 0);

    assert!(harness.scheduler.stop_job(job_id).await.expect("stop"));
    assert_eq!(harness.next_event().await, RunEvent::Cancelled(job_id));
}

#[tokio::test(flavor = "multi_thread")]
async fn run_now_starts_immediately_and_stop_interrupts_it() {
    let mut harness = Harness::new(true);
    let job_id = Uuid::now_v7();

    assert!(!harness.scheduler.stop_job(job_id).await.expect("stop idle job"));

    harness.scheduler.run_now(job_id).await.expect("run now");
    assert_eq!(harness.next_event().await, RunEvent::Started(job_id));
    assert!(harness.engine.has_active_run(job_id));

    assert!(harness.scheduler.stop_job(job_id).await.expect("stop"));
    assert_eq!(harness.next_event().await, RunEvent::Cancelled(job_id));
}

#[tokio::test(flavor = "multi_thread")]
async fn engine_lifecycle_starts_polls_and_shuts_down() {
    let mut harness = Harness::new(false);
    assert!(!harness.scheduler.is_started().await.expect("is_started"));

    harness.scheduler.start().await.expect("start");
    harness.scheduler.start().await.expect("second start is harmless");
    assert!(harness.scheduler.is_started().await.expect("is_started"));

    let job_id = Uuid::now_v7();
    let fire_at = Utc::now() - TimeDelta::seconds(1);
    harness.store.upsert(&Trigger::new(job_id, TriggerSchedule::Once { fire_at }, fire_at)).await.expect("upsert");
    assert_eq!(harness.next_event().await, RunEvent::Started(job_id));

    harness.scheduler.shutdown().await.expect("shutdown");
    assert!(!harness.scheduler.is_started().await.expect("is_started"));
    harness.scheduler.shutdown().await.expect("second shutdown is harmless");
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_starts_spawn_one_loop() {
    let harness = Harness::new(false);
    let engine = &harness.engine;

    let (first, second) = tokio::join!(engine.start(), engine.start());
    assert_eq!(usize::from(first.is_ok()) + usize::from(second.is_ok()), 1);
    assert!(matches!(first.err().or(second.err()), Some(SchedulerError::AlreadyRunning)));
    assert!(engine.is_running());

    engine.shutdown().await.expect("shutdown");
    assert!(!engine.is_running());
    assert!(matches!(engine.shutdown().await, Err(SchedulerError::NotRunning)));

    engine.start().await.expect("restart after shutdown");
    assert!(engine.is_running());
    engine.shutdown().await.expect("second shutdown");
}
