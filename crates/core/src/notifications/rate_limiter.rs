//! Notification rate limiting
//!
//! Two rules: a minimum interval between any two shown notifications, and a
//! dedupe window for identical (job, kind, status, summary) notifications.

use std::collections::HashMap;
use std::time::Duration;

use arkive_domain::constants::{NOTIFICATION_DEDUPE_WINDOW_MS, NOTIFICATION_MIN_INTERVAL_MS};
use arkive_domain::NotificationEvent;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct LimiterState {
    last_shown_at: Option<DateTime<Utc>>,
    last_shown_by_key: HashMap<String, DateTime<Utc>>,
}

#[derive(Debug)]
pub struct NotificationRateLimiter {
    min_interval: chrono::Duration,
    dedupe_window: chrono::Duration,
    state: Mutex<LimiterState>,
}

impl NotificationRateLimiter {
    pub fn new(min_interval: Duration, dedupe_window: Duration) -> Self {
        Self {
            min_interval: to_chrono(min_interval),
            dedupe_window: to_chrono(dedupe_window),
            state: Mutex::new(LimiterState::default()),
        }
    }

    pub fn should_show(&self, event: &NotificationEvent) -> bool {
        self.should_show_at(event, Utc::now())
    }

    /// Records the event as shown when it passes both rules.
    pub fn should_show_at(&self, event: &NotificationEvent, now: DateTime<Utc>) -> bool {
        let mut state = self.state.lock();

        let window = self.dedupe_window;
        state.last_shown_by_key.retain(|_, shown_at| now - *shown_at < window);

        if state.last_shown_at.is_some_and(|last| now - last < self.min_interval) {
            return false;
        }

        let key = dedupe_key(event);
        if state.last_shown_by_key.get(&key).is_some_and(|shown_at| now - *shown_at < window) {
            return false;
        }

        state.last_shown_by_key.insert(key, now);
        state.last_shown_at = Some(now);
        true
    }
}

impl Default for NotificationRateLimiter {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(NOTIFICATION_MIN_INTERVAL_MS),
            Duration::from_millis(NOTIFICATION_DEDUPE_WINDOW_MS),
        )
    }
}

fn dedupe_key(event: &NotificationEvent) -> String {
    let status = event.status.map(|s| s.as_str()).unwrap_or_default();
    let summary = event.detail_summary.as_deref().unwrap_or_default();
    format!("{}|{}|{}|{}", event.job_id.simple(), event.kind, status, summary.to_lowercase())
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}
