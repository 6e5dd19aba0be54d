//! Health check command for front-end monitoring

use crate::context::AppContext;
use crate::utils::health::HealthStatus;

/// Database reachability and trigger engine state.
///
/// # Example Response
/// ```json
/// {
///   "is_healthy": true,
///   "score": 1.0,
///   "message": null,
///   "components": [
///     { "name": "database", "is_healthy": true, "message": null },
///     { "name": "trigger_engine", "is_healthy": true, "message": null }
///   ],
///   "checked_at": "2025-01-01T00:00:00Z"
/// }
/// ```
pub async fn get_app_health(context: &AppContext) -> Result<HealthStatus, String> {
    Ok(context.health_check().await)
}
