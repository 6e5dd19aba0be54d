//! Application context - dependency injection container

use std::fs;
use std::path::Path;
use std::sync::Arc;

use arkive_core::{
    ApplicationLogRepository, ApplicationSettingsService, ExecutionRepository, JobExecutionService, JobRepository, JobRunner,
    JobStateService, LogPruner, LogRetentionService, NotificationBus, ScheduleControlService,
    SchedulerControl, SettingsRepository, SyncEngine,
};
use arkive_domain::{ArkiveError, Config, Result};
use arkive_infra::{
    DbManager, FileSystemSyncEngine, InstanceLock, JobScheduler, SqliteApplicationLogRepository,
    SqliteExecutionRepository, SqliteJobRepository, SqliteSettingsRepository, SqliteTriggerRepository,
    TriggerEngine, TriggerEngineConfig,
};
use tracing::{info, instrument, warn};

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub jobs: Arc<dyn JobRepository>,
    pub executions: Arc<dyn ExecutionRepository>,
    pub application_logs: Arc<dyn ApplicationLogRepository>,
    pub settings: ApplicationSettingsService,
    pub job_state: JobStateService,
    pub executor: Arc<JobExecutionService>,
    pub retention: Arc<LogRetentionService>,
    pub scheduler: Arc<JobScheduler>,
    pub schedule_control: ScheduleControlService,
    pub notifications: NotificationBus,

    // Keep instance lock alive for the lifetime of the app
    _instance_lock: InstanceLock,
}

impl AppContext {
    /// Create a new application context with default configuration
    pub async fn new() -> Result<Self> {
        Self::new_with_config(Config::default()).await
    }

    /// Create a new application context with custom configuration, locking
    /// the system temp directory.
    pub async fn new_with_config(config: Config) -> Result<Self> {
        Self::new_with_config_in_lock_dir(config, std::env::temp_dir()).await
    }

    /// Create a new application context with a custom lock directory
    ///
    /// Tests can use this to provide per-test directories and avoid PID file
    /// conflicts.
    #[instrument(skip_all, fields(db_path = %config.database.path))]
    pub async fn new_with_config_in_lock_dir<P>(config: Config, lock_dir: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let lock_dir_path = lock_dir.as_ref().to_path_buf();

        fs::create_dir_all(&lock_dir_path).map_err(|err| {
            ArkiveError::Io(format!(
                "failed to create instance lock directory {}: {}",
                lock_dir_path.display(),
                err
            ))
        })?;

        // One process per database
        let instance_lock = InstanceLock::acquire(&lock_dir_path)?;

        let db = Arc::new(DbManager::from_config(&config.database)?);
        db.run_migrations()?;

        let jobs: Arc<dyn JobRepository> = Arc::new(SqliteJobRepository::new(Arc::clone(&db)));
        let executions: Arc<dyn ExecutionRepository> =
            Arc::new(SqliteExecutionRepository::new(Arc::clone(&db)));
        let application_logs: Arc<dyn ApplicationLogRepository> =
            Arc::new(SqliteApplicationLogRepository::new(Arc::clone(&db)));
        let settings_repository: Arc<dyn SettingsRepository> =
            Arc::new(SqliteSettingsRepository::new(Arc::clone(&db)));

        let settings = ApplicationSettingsService::new(Arc::clone(&settings_repository));
        let job_state = JobStateService::new(Arc::clone(&jobs));
        let retention = Arc::new(
            LogRetentionService::new(settings.clone(), Arc::clone(&executions))
                .with_application_logs(Arc::clone(&application_logs)),
        );
        let notifications = NotificationBus::default();

        let engine: Arc<dyn SyncEngine> = Arc::new(FileSystemSyncEngine::new());
        let executor = Arc::new(JobExecutionService::new(
            Arc::clone(&jobs),
            Arc::clone(&executions),
            settings.clone(),
            engine,
            notifications.clone(),
            Arc::clone(&retention) as Arc<dyn LogPruner>,
        ));

        let triggers = Arc::new(SqliteTriggerRepository::new(Arc::clone(&db)));
        let trigger_engine = Arc::new(TriggerEngine::new(
            triggers,
            Arc::clone(&executor) as Arc<dyn JobRunner>,
            TriggerEngineConfig::from(&config.scheduler),
        ));
        let scheduler = Arc::new(JobScheduler::new(Arc::clone(&jobs), trigger_engine));

        let schedule_control = ScheduleControlService::new(
            settings_repository,
            Arc::clone(&scheduler) as Arc<dyn SchedulerControl>,
            config.archive.schedule_enabled_default,
        );

        // Starts the engine, then pauses or resumes it per the stored flag
        let schedule_enabled = schedule_control.initialize().await?;
        let scheduled = scheduler.schedule_all().await?;

        match retention.prune().await {
            Ok(removed) => info!(removed, "app_context.startup_prune"),
            Err(err) => warn!(error = %err, "app_context.startup_prune_failed"),
        }

        info!(schedule_enabled, scheduled, "app_context.initialized");

        Ok(Self {
            config,
            db,
            jobs,
            executions,
            application_logs,
            settings,
            job_state,
            executor,
            retention,
            scheduler,
            schedule_control,
            notifications,
            _instance_lock: instance_lock,
        })
    }

    /// Check health of all application components
    ///
    /// The application counts as healthy when at least 80% of components
    /// report healthy.
    pub async fn health_check(&self) -> crate::utils::health::HealthStatus {
        use crate::utils::health::{ComponentHealth, HealthStatus};

        let mut status = HealthStatus::new();

        status = status.add_component(self.check_database_health().await);

        let engine = if self.scheduler.engine().is_running() {
            ComponentHealth::healthy("trigger_engine")
        } else {
            ComponentHealth::unhealthy("trigger_engine", "not running")
        };
        status = status.add_component(engine);

        status.calculate_score();
        status
    }

    /// Check database health on a blocking thread
    async fn check_database_health(&self) -> crate::utils::health::ComponentHealth {
        use crate::utils::health::ComponentHealth;

        let db = Arc::clone(&self.db);
        match tokio::task::spawn_blocking(move || db.health_check()).await {
            Ok(Ok(_)) => ComponentHealth::healthy("database"),
            Ok(Err(e)) => {
                warn!(error = %e, "database health check failed");
                ComponentHealth::unhealthy("database", format!("query failed: {e}"))
            }
            Err(e) => {
                tracing::error!(error = %e, "database health check task panicked");
                ComponentHealth::unhealthy("database", format!("task panic: {e}"))
            }
        }
    }

    /// Stop the trigger engine and wait for in-flight runs to wind down.
    ///
    /// Running jobs are cancelled cooperatively; safe to call more than once.
    pub async fn shutdown(&self) -> Result<()> {
        info!("app_context.shutdown");
        self.scheduler.shutdown().await
    }
}
