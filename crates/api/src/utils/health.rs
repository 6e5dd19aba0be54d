//! Health report for the application context
//!
//! Each wired component reports healthy or not; the overall score is the
//! healthy fraction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum healthy fraction for the application to count as healthy.
const HEALTHY_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub is_healthy: bool,

    /// Healthy components divided by total components, 0.0 to 1.0.
    pub score: f64,

    pub message: Option<String>,
    pub components: Vec<ComponentHealth>,
    pub checked_at: DateTime<Utc>,
}

impl HealthStatus {
    /// Healthy with score 1.0 and no components.
    pub fn new() -> Self {
        Self {
            is_healthy: true,
            score: 1.0,
            message: None,
            components: Vec::new(),
            checked_at: Utc::now(),
        }
    }

    pub fn add_component(mut self, component: ComponentHealth) -> Self {
        self.components.push(component);
        self
    }

    /// Recompute the score once every component has been added.
    pub fn calculate_score(&mut self) {
        if self.components.is_empty() {
            return;
        }

        let healthy = self.components.iter().filter(|c| c.is_healthy).count();
        self.score = healthy as f64 / self.components.len() as f64;
        self.is_healthy = self.score >= HEALTHY_THRESHOLD;
        self.message = (!self.is_healthy).then(|| {
            let failing: Vec<&str> = self
                .components
                .iter()
                .filter(|c| !c.is_healthy)
                .map(|c| c.name.as_str())
                .collect();
            format!("unhealthy: {}", failing.join(", "))
        });
    }
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component identifier, e.g. `database` or `trigger_engine`.
    pub name: String,
    pub is_healthy: bool,
    pub message: Option<String>,
}

impl ComponentHealth {
    pub fn healthy(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: true, message: None }
    }

    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: false, message: Some(message.into()) }
    }
}
