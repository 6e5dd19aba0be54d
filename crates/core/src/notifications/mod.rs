//! Execution notifications
//!
//! The orchestrator publishes [`NotificationEvent`]s on a [`NotificationBus`].
//! Presenters are expected to filter them through [`should_notify`] and a
//! [`NotificationRateLimiter`] before showing anything.
//!
//! [`NotificationEvent`]: arkive_domain::NotificationEvent

pub mod bus;
pub mod preferences;
pub mod rate_limiter;

pub use bus::NotificationBus;
pub use preferences::should_notify;
pub use rate_limiter::NotificationRateLimiter;
