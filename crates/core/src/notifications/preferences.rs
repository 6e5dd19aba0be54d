//! Whether an event should be shown, given global and per-job preferences

use arkive_domain::{ApplicationSettings, NotificationEvent, NotificationKind};

/// Global switch first, then the per-job override for the event's kind, then
/// the global per-kind setting.
pub fn should_notify(settings: &ApplicationSettings, event: &NotificationEvent) -> bool {
    if !settings.enable_notifications {
        return false;
    }

    let global = match event.kind {
        NotificationKind::Started => settings.notify_on_start,
        NotificationKind::Completed => settings.notify_on_complete,
        NotificationKind::Failed => settings.notify_on_fail,
    };

    event.override_for_kind().unwrap_or(global)
}

#[cfg(test)]
mod tests {
    use arkive_domain::SyncCounters;
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn event(kind: NotificationKind) -> NotificationEvent {
        NotificationEvent {
            job_id: Uuid::now_v7(),
            job_name: "Job".into(),
            kind,
            status: None,
            counters: SyncCounters::default(),
            detail_summary: None,
            notify_on_start_override: None,
            notify_on_complete_override: None,
            notify_on_fail_override: None,
            occurred_at: Utc::now(),
        }
    }

    fn settings(start: bool, complete: bool, fail: bool) -> ApplicationSettings {
        ApplicationSettings {
            enable_notifications: true,
            notify_on_start: start,
            notify_on_complete: complete,
            notify_on_fail: fail,
            ..ApplicationSettings::default()
        }
    }

    #[test]
    fn global_switch_wins() {
        let settings = ApplicationSettings {
            enable_notifications: false,
            ..settings(true, true, true)
        };
        let mut started = event(NotificationKind::Started);
        started.notify_on_start_override = Some(true);
        assert!(!should_notify(&settings, &started));
    }

    #[test]
    fn uses_global_setting_without_override() {
        assert!(!should_notify(&settings(false, true, true), &event(NotificationKind::Started)));
        assert!(should_notify(&settings(false, true, true), &event(NotificationKind::Completed)));
    }

    #[test]
    fn override_replaces_global_setting() {
        let mut started = event(NotificationKind::Started);
        started.notify_on_start_override = Some(true);
        assert!(should_notify(&settings(false, true, true), &started));

        let mut failed = event(NotificationKind::Failed);
        failed.notify_on_fail_override = Some(true);
        assert!(should_notify(&settings(false, false, false), &failed));

        let mut completed = event(NotificationKind::Completed);
        completed.notify_on_complete_override = Some(false);
        assert!(!should_notify(&settings(true, true, true), &completed));
    }
}
