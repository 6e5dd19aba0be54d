//! Port interface for the settings store

use arkive_domain::Result;
use async_trait::async_trait;

/// Flat key/value settings storage.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get_setting(&self, key: &str) -> Result<Option<String>>;

    /// Insert or replace a single value.
    async fn set_setting(&self, key: &str, value: &str) -> Result<()>;

    /// Insert or replace several values atomically.
    async fn set_settings(&self, values: Vec<(String, String)>) -> Result<()>;

    async fn list_settings(&self) -> Result<Vec<(String, String)>>;
}
