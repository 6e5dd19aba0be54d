//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Environment variables, when `ARKIVE_DB_PATH` is set
//! 2. Otherwise the first config file found by [`probe_config_paths`]
//! 3. Otherwise built-in defaults
//!
//! ## Environment Variables
//! - `ARKIVE_DB_PATH`: Database file path (required for env loading)
//! - `ARKIVE_DB_POOL_SIZE`: Connection pool size
//! - `ARKIVE_DB_BUSY_TIMEOUT_MS`: SQLite busy timeout
//! - `ARKIVE_POLL_INTERVAL_MS`: Trigger store poll interval
//! - `ARKIVE_MAX_CONCURRENCY`: Concurrent trigger-fired runs
//! - `ARKIVE_MISFIRE_THRESHOLD_SECS`: Lateness after which a recurring fire is skipped
//! - `ARKIVE_SCHEDULE_ENABLED_DEFAULT`: Initial global schedule flag (true/false)
//! - `ARKIVE_LOG_LEVEL`: Default log filter
//! - `ARKIVE_LOG_JSON`: JSON log output (true/false)
//! - `ARKIVE_LOG_DIR`: Directory for daily rolling log files
//!
//! ## File Locations
//! `arkive.toml`, `arkive.json`, `config.toml` and `config.json` are probed
//! in the working directory, its two parents and next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use arkive_domain::{
    ArchiveConfig, ArkiveError, Config, DatabaseConfig, LoggingConfig, Result, SchedulerConfig,
};

const CONFIG_FILE_NAMES: [&str; 4] = ["arkive.toml", "arkive.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `ArkiveError::Config` when a variable or a probed file is present
/// but invalid.
pub fn load() -> Result<Config> {
    if std::env::var_os("ARKIVE_DB_PATH").is_some() {
        let config = load_from_env()?;
        tracing::info!("config.loaded_from_env");
        return Ok(config);
    }

    match probe_config_paths() {
        Some(path) => load_from_file(Some(path)),
        None => {
            tracing::info!("config.defaults");
            Ok(Config::default())
        }
    }
}

/// Load configuration from environment variables
///
/// `ARKIVE_DB_PATH` is required; every other variable falls back to its
/// default.
///
/// # Errors
/// Returns `ArkiveError::Config` when the path is missing or a value does
/// not parse.
pub fn load_from_env() -> Result<Config> {
    let defaults = Config::default();

    let database = DatabaseConfig {
        path: env_var("ARKIVE_DB_PATH")?,
        pool_size: env_parse("ARKIVE_DB_POOL_SIZE", defaults.database.pool_size)?,
        busy_timeout_ms: env_parse("ARKIVE_DB_BUSY_TIMEOUT_MS", defaults.database.busy_timeout_ms)?,
    };

    let scheduler = SchedulerConfig {
        poll_interval_ms: env_parse("ARKIVE_POLL_INTERVAL_MS", defaults.scheduler.poll_interval_ms)?,
        max_concurrency: env_parse("ARKIVE_MAX_CONCURRENCY", defaults.scheduler.max_concurrency)?,
        misfire_threshold_secs: env_parse(
            "ARKIVE_MISFIRE_THRESHOLD_SECS",
            defaults.scheduler.misfire_threshold_secs,
        )?,
    };

    let archive = ArchiveConfig {
        schedule_enabled_default: env_bool(
            "ARKIVE_SCHEDULE_ENABLED_DEFAULT",
            defaults.archive.schedule_enabled_default,
        ),
    };

    let logging = LoggingConfig {
        level: std::env::var("ARKIVE_LOG_LEVEL").unwrap_or(defaults.logging.level),
        json: env_bool("ARKIVE_LOG_JSON", defaults.logging.json),
        directory: std::env::var("ARKIVE_LOG_DIR").ok().filter(|dir| !dir.trim().is_empty()),
    };

    Ok(Config { database, scheduler, archive, logging })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `ArkiveError::Config` if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ArkiveError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ArkiveError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "config.loaded_from_file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ArkiveError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration, detecting the format by extension.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => {
            toml::from_str(contents).map_err(|e| ArkiveError::Config(format!("Invalid TOML format: {e}")))
        }
        "json" => serde_json::from_str(contents)
            .map_err(|e| ArkiveError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(ArkiveError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file in the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.extend(cwd.ancestors().take(3).map(Path::to_path_buf));
    }

    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf)) {
        dirs.push(exe_dir);
    }

    candidates_in(&dirs).into_iter().find(|path| path.is_file())
}

fn candidates_in(dirs: &[PathBuf]) -> Vec<PathBuf> {
    dirs.iter().flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name))).collect()
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| ArkiveError::Config(format!("Missing required environment variable: {key}")))
}

/// Parse an optional variable, using `default` when unset.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ArkiveError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
