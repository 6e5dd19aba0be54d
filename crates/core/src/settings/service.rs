//! Typed access to application settings

use std::collections::HashMap;
use std::sync::Arc;

use arkive_domain::constants::{
    SETTING_ENABLE_NOTIFICATIONS, SETTING_LOG_RETENTION_UNIT, SETTING_LOG_RETENTION_VALUE,
    SETTING_NOTIFY_ON_COMPLETE, SETTING_NOTIFY_ON_FAIL, SETTING_NOTIFY_ON_START,
    SETTING_PLAY_SOUND, SETTING_RUN_ON_STARTUP, SETTING_VERBOSE_LOGGING,
};
use arkive_domain::{ApplicationSettings, Result, RetentionUnit};
use tracing::{debug, instrument};

use super::ports::SettingsRepository;

/// Reads and writes [`ApplicationSettings`]. Missing or unparseable values
/// fall back to the defaults.
#[derive(Clone)]
pub struct ApplicationSettingsService {
    repository: Arc<dyn SettingsRepository>,
}

impl ApplicationSettingsService {
    pub fn new(repository: Arc<dyn SettingsRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<ApplicationSettings> {
        let stored: HashMap<String, String> =
            self.repository.list_settings().await?.into_iter().collect();
        Ok(from_map(&stored))
    }

    #[instrument(skip(self, settings))]
    pub async fn save(&self, settings: &ApplicationSettings) -> Result<()> {
        self.repository.set_settings(to_pairs(settings)).await?;
        debug!(
            retention_value = settings.log_retention_value,
            retention_unit = %settings.log_retention_unit,
            "settings.saved"
        );
        Ok(())
    }
}

fn from_map(stored: &HashMap<String, String>) -> ApplicationSettings {
    let defaults = ApplicationSettings::default();
    let flag = |key: &str, default: bool| stored.get(key).and_then(|v| parse_bool(v)).unwrap_or(default);

    ApplicationSettings {
        run_on_startup: flag(SETTING_RUN_ON_STARTUP, defaults.run_on_startup),
        enable_notifications: flag(SETTING_ENABLE_NOTIFICATIONS, defaults.enable_notifications),
        notify_on_start: flag(SETTING_NOTIFY_ON_START, defaults.notify_on_start),
        notify_on_complete: flag(SETTING_NOTIFY_ON_COMPLETE, defaults.notify_on_complete),
        notify_on_fail: flag(SETTING_NOTIFY_ON_FAIL, defaults.notify_on_fail),
        play_notification_sound: flag(SETTING_PLAY_SOUND, defaults.play_notification_sound),
        log_retention_value: stored
            .get(SETTING_LOG_RETENTION_VALUE)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(defaults.log_retention_value),
        log_retention_unit: stored
            .get(SETTING_LOG_RETENTION_UNIT)
            .and_then(|v| v.parse::<RetentionUnit>().ok())
            .unwrap_or(defaults.log_retention_unit),
        enable_verbose_logging: flag(SETTING_VERBOSE_LOGGING, defaults.enable_verbose_logging),
    }
}

fn to_pairs(settings: &ApplicationSettings) -> Vec<(String, String)> {
    vec![
        (SETTING_RUN_ON_STARTUP.into(), settings.run_on_startup.to_string()),
        (SETTING_ENABLE_NOTIFICATIONS.into(), settings.enable_notifications.to_string()),
        (SETTING_NOTIFY_ON_START.into(), settings.notify_on_start.to_string()),
        (SETTING_NOTIFY_ON_COMPLETE.into(), settings.notify_on_complete.to_string()),
        (SETTING_NOTIFY_ON_FAIL.into(), settings.notify_on_fail.to_string()),
        (SETTING_PLAY_SOUND.into(), settings.play_notification_sound.to_string()),
        (SETTING_LOG_RETENTION_VALUE.into(), settings.log_retention_value.to_string()),
        (SETTING_LOG_RETENTION_UNIT.into(), settings.log_retention_unit.to_string()),
        (SETTING_VERBOSE_LOGGING.into(), settings.enable_verbose_logging.to_string()),
    ]
}

/// Case-insensitive `true`/`false`.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
