//! Notification subscription for the front end
//!
//! The bus carries every lifecycle event; the feed applies the user's
//! preferences and the rate limiter before handing one out for display.

use std::time::Duration;

use arkive_core::{should_notify, ApplicationSettingsService, NotificationRateLimiter};
use arkive_domain::constants::{NOTIFICATION_DEDUPE_WINDOW_MS, NOTIFICATION_MIN_INTERVAL_MS};
use arkive_domain::{ApplicationSettings, NotificationEvent};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::AppContext;

pub struct NotificationFeed {
    receiver: broadcast::Receiver<NotificationEvent>,
    settings: ApplicationSettingsService,
    limiter: NotificationRateLimiter,
}

impl NotificationFeed {
    pub fn new(
        receiver: broadcast::Receiver<NotificationEvent>,
        settings: ApplicationSettingsService,
        limiter: NotificationRateLimiter,
    ) -> Self {
        Self { receiver, settings, limiter }
    }

    /// Next event the user should see. `None` once the bus is closed.
    pub async fn next_visible(&mut self) -> Option<NotificationEvent> {
        loop {
            let event = match self.receiver.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "notifications.feed_lagged");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            };

            if self.is_visible(&event).await {
                return Some(event);
            }
            debug!(job_id = %event.job_id, kind = %event.kind, "notifications.suppressed");
        }
    }

    async fn is_visible(&self, event: &NotificationEvent) -> bool {
        // Re-read so preference changes apply to the next event
        let settings = self.settings.load().await.unwrap_or_else(|err| {
            warn!(error = %err, "notifications.settings_unavailable");
            ApplicationSettings::default()
        });
        should_notify(&settings, event) && self.limiter.should_show(event)
    }
}

/// Subscribe to notifications with the default rate limits.
pub fn subscribe_notifications(ctx: &AppContext) -> NotificationFeed {
    let limiter = NotificationRateLimiter::new(
        Duration::from_millis(NOTIFICATION_MIN_INTERVAL_MS),
        Duration::from_millis(NOTIFICATION_DEDUPE_WINDOW_MS),
    );
    NotificationFeed::new(ctx.notifications.subscribe(), ctx.settings.clone(), limiter)
}
