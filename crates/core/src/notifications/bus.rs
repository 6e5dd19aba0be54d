//! Broadcast bus for execution notifications

use arkive_domain::constants::NOTIFICATION_CHANNEL_CAPACITY;
use arkive_domain::NotificationEvent;
use tokio::sync::broadcast;
use tracing::debug;

/// Cloneable handle to a single broadcast channel. Every clone publishes to
/// the same subscribers.
#[derive(Debug, Clone)]
pub struct NotificationBus {
    sender: broadcast::Sender<NotificationEvent>,
}

impl NotificationBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.sender.subscribe()
    }

    /// Publish to current subscribers. Returns how many received it; having
    /// none is not an error.
    pub fn publish(&self, event: NotificationEvent) -> usize {
        let job_id = event.job_id;
        let kind = event.kind;
        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(%job_id, %kind, receivers, "notification.published");
                receivers
            }
            Err(_) => {
                debug!(%job_id, %kind, "notification.no_subscribers");
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(NOTIFICATION_CHANNEL_CAPACITY)
    }
}
