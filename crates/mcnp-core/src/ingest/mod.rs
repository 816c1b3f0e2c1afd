//! Notification ingestion.
//!
//! Turns notifications arriving through any delivery channel into at most
//! one history record per logical id, marks records read when tapped, and
//! schedules deep-link navigation for taps.

mod payload;
pub mod startup;

pub use payload::{DeliveryChannel, InboundNotification};
pub use startup::{Delivery, LiveListener, StartupInputs, StartupReport};

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use crate::constants::NAVIGATION_DELAY_MS;
use crate::events::{CoreEvent, EventBus};
use crate::models::DeepLink;
use crate::platform::NavigationSink;
use crate::store::{NotificationHistoryStore, SessionValidityStore};

/// What ingesting one notification did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// A new record was added to history
    Created {
        id: String,
        navigation: Option<DeepLink>,
    },
    /// An existing unread record was tapped and is now read
    MarkedRead {
        id: String,
        navigation: Option<DeepLink>,
    },
    /// Already known and nothing changed
    Duplicate {
        id: String,
        navigation: Option<DeepLink>,
    },
    /// The history could not be persisted
    Failed { id: String },
}

impl IngestOutcome {
    pub fn id(&self) -> &str {
        match self {
            IngestOutcome::Created { id, .. }
            | IngestOutcome::MarkedRead { id, .. }
            | IngestOutcome::Duplicate { id, .. }
            | IngestOutcome::Failed { id } => id,
        }
    }

    pub fn navigation(&self) -> Option<&DeepLink> {
        match self {
            IngestOutcome::Created { navigation, .. }
            | IngestOutcome::MarkedRead { navigation, .. }
            | IngestOutcome::Duplicate { navigation, .. } => navigation.as_ref(),
            IngestOutcome::Failed { .. } => None,
        }
    }
}

pub struct IngestionPipeline {
    history: Arc<NotificationHistoryStore>,
    session: SessionValidityStore,
    bus: Arc<EventBus>,
    navigator: Arc<dyn NavigationSink>,
    navigation_delay: Duration,
}

impl IngestionPipeline {
    pub fn new(
        history: Arc<NotificationHistoryStore>,
        session: SessionValidityStore,
        bus: Arc<EventBus>,
        navigator: Arc<dyn NavigationSink>,
    ) -> Self {
        Self {
            history,
            session,
            bus,
            navigator,
            navigation_delay: Duration::from_millis(NAVIGATION_DELAY_MS),
        }
    }

    pub fn with_navigation_delay(mut self, delay: Duration) -> Self {
        self.navigation_delay = delay;
        self
    }

    pub fn history(&self) -> &Arc<NotificationHistoryStore> {
        &self.history
    }

    /// Process one notification from `channel`
    pub fn ingest(&self, notification: &InboundNotification, channel: DeliveryChannel) -> IngestOutcome {
        let now = Utc::now();
        let id = notification.logical_id(now);

        let navigation = channel.is_interaction().then(|| notification.deep_link());

        let outcome = match self.history.get_by_id(&id) {
            Some(existing) => {
                if channel.is_interaction() && !existing.read && self.history.mark_read(&id) {
                    tracing::debug!(id = %id, "tapped notification marked read");
                    IngestOutcome::MarkedRead {
                        id,
                        navigation,
                    }
                } else {
                    tracing::debug!(id = %id, ?channel, "notification already in history");
                    IngestOutcome::Duplicate {
                        id,
                        navigation,
                    }
                }
            }
            None => {
                // Only the first sighting of a force logout invalidates
                if notification.is_force_logout() {
                    self.apply_force_logout(notification);
                }
                let record = notification.to_record(id.clone(), channel, now);
                if self.history.add(record) {
                    tracing::info!(id = %id, ?channel, "notification added to history");
                    IngestOutcome::Created {
                        id,
                        navigation,
                    }
                } else {
                    IngestOutcome::Failed { id }
                }
            }
        };

        if matches!(outcome, IngestOutcome::Created { .. } | IngestOutcome::MarkedRead { .. }) {
            self.history.update_badge(None);
        }

        if let Some(target) = outcome.navigation().cloned() {
            self.schedule_navigation(target);
        }

        outcome
    }

    fn apply_force_logout(&self, notification: &InboundNotification) {
        let reason = notification.logout_reason();
        tracing::info!("force logout received");
        self.session.mark_invalid();
        self.session.set_logout_reason(&reason);
        self.bus.publish(CoreEvent::SessionInvalidated { reason });
    }

    /// Navigate after the settle delay, on the Tokio runtime when inside one
    fn schedule_navigation(&self, target: DeepLink) {
        let navigator = self.navigator.clone();
        let delay = self.navigation_delay;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    navigator.navigate(target);
                });
            }
            Err(_) => {
                std::thread::spawn(move || {
                    std::thread::sleep(delay);
                    navigator.navigate(target);
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::platform::test_support::RecordingPlatform;
    use crate::storage::MemoryStore;
    use parking_lot::Mutex;
    use serde_json::json;

    pub(super) struct Harness {
        pub pipeline: Arc<IngestionPipeline>,
        pub history: Arc<NotificationHistoryStore>,
        pub session: SessionValidityStore,
        pub bus: Arc<EventBus>,
        pub platform: Arc<RecordingPlatform>,
    }

    pub(super) fn harness() -> Harness {
        let storage = Arc::new(MemoryStore::new());
        let bus = EventBus::new();
        let platform = Arc::new(RecordingPlatform::default());
        let history = Arc::new(NotificationHistoryStore::new(
            storage.clone(),
            bus.clone(),
            platform.clone(),
        ));
        let session = SessionValidityStore::new(storage);
        let pipeline = Arc::new(
            IngestionPipeline::new(history.clone(), session.clone(), bus.clone(), platform.clone())
                .with_navigation_delay(Duration::from_millis(10)),
        );
        Harness {
            pipeline,
            history,
            session,
            bus,
            platform,
        }
    }

    pub(super) fn inbound(value: serde_json::Value) -> InboundNotification {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_presented_then_tapped_end_to_end() {
        let h = harness();
        let n = inbound(json!({"identifier": "os-1", "title": "T", "body": "B", "data": {"type": "event"}}));

        let first = h.pipeline.ingest(&n, DeliveryChannel::AlreadyPresented);
        assert!(matches!(first, IngestOutcome::Created { navigation: None, .. }));
        assert_eq!(h.history.history().len(), 1);
        assert!(!h.history.history()[0].read);
        assert_eq!(h.history.unread_count(), 1);
        assert_eq!(h.platform.last_badge(), Some(1));

        let second = h.pipeline.ingest(&n, DeliveryChannel::Tapped);
        assert!(matches!(second, IngestOutcome::MarkedRead { .. }));
        assert!(second.navigation().is_some());
        assert_eq!(h.history.history().len(), 1);
        assert!(h.history.history()[0].read);
        assert_eq!(h.history.unread_count(), 0);
        assert_eq!(h.platform.last_badge(), Some(0));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(h.platform.navigations.lock().len(), 1);
    }

    #[test]
    fn test_redelivery_with_new_transport_id_is_deduplicated() {
        let h = harness();
        let first = inbound(json!({"identifier": "os-1", "data": {"notificationId": 9}}));
        let second = inbound(json!({"identifier": "os-2", "data": {"notificationId": 9}}));

        h.pipeline.ingest(&first, DeliveryChannel::Foreground);
        let outcome = h.pipeline.ingest(&second, DeliveryChannel::Background);

        assert_eq!(outcome, IngestOutcome::Duplicate { id: "mcnp_9".to_string(), navigation: None });
        assert_eq!(h.history.history().len(), 1);
        assert_eq!(h.history.unread_count(), 1);
    }

    #[test]
    fn test_first_sighting_by_tap_is_created_read() {
        let h = harness();
        let n = inbound(json!({
            "identifier": "os-5",
            "title": "Congreso",
            "data": {"screen": "Events", "section": "agenda"}
        }));

        let outcome = h.pipeline.ingest(&n, DeliveryChannel::Tapped);
        assert_eq!(
            outcome.navigation(),
            Some(&DeepLink::new("Events", Some("agenda".to_string())))
        );
        let record = h.history.get_by_id("os-5").unwrap();
        assert!(record.read);
        assert_eq!(record.received_in_background, Some(true));
        assert_eq!(h.history.unread_count(), 0);
    }

    #[test]
    fn test_tap_on_read_record_is_noop_but_navigates() {
        let h = harness();
        let n = inbound(json!({"identifier": "os-1"}));
        h.pipeline.ingest(&n, DeliveryChannel::Tapped);
        let outcome = h.pipeline.ingest(&n, DeliveryChannel::Tapped);

        assert!(matches!(outcome, IngestOutcome::Duplicate { navigation: Some(_), .. }));
    }

    #[test]
    fn test_foreground_delivery_is_not_background() {
        let h = harness();
        h.pipeline.ingest(&inbound(json!({"identifier": "fg"})), DeliveryChannel::Foreground);
        h.pipeline.ingest(&inbound(json!({"identifier": "bg"})), DeliveryChannel::Background);

        assert_eq!(h.history.get_by_id("fg").unwrap().received_in_background, Some(false));
        assert_eq!(h.history.get_by_id("bg").unwrap().received_in_background, Some(true));
    }

    #[test]
    fn test_force_logout_invalidates_session_and_logs_history() {
        let h = harness();
        let reasons = Arc::new(Mutex::new(Vec::new()));
        let r = reasons.clone();
        h.bus.subscribe(EventKind::SessionInvalidated, move |event| {
            if let CoreEvent::SessionInvalidated { reason } = event {
                r.lock().push(reason.clone());
            }
        });

        let outcome = h
            .pipeline
            .ingest(&inbound(json!({"data": {"type": "force_logout"}})), DeliveryChannel::Background);

        assert!(matches!(outcome, IngestOutcome::Created { .. }));
        assert!(!h.session.is_valid());
        assert!(h.session.logout_reason().is_some());
        assert_eq!(reasons.lock().len(), 1);
        assert_eq!(h.history.history().len(), 1);
        assert!(h.history.history()[0].is_force_logout());
    }

    #[test]
    fn test_redelivered_force_logout_keeps_new_session() {
        let h = harness();
        let reasons = Arc::new(Mutex::new(Vec::new()));
        let r = reasons.clone();
        h.bus.subscribe(EventKind::SessionInvalidated, move |event| {
            if let CoreEvent::SessionInvalidated { reason } = event {
                r.lock().push(reason.clone());
            }
        });
        let payload = inbound(json!({
            "identifier": "x",
            "data": {"type": "force_logout", "reason": "Sesión cerrada"}
        }));

        h.pipeline.ingest(&payload, DeliveryChannel::Background);
        assert!(!h.session.is_valid());
        h.session.mark_valid();
        assert_eq!(h.session.take_logout_reason().as_deref(), Some("Sesión cerrada"));

        let outcome = h.pipeline.ingest(&payload, DeliveryChannel::AlreadyPresented);

        assert!(matches!(outcome, IngestOutcome::Duplicate { .. }));
        assert!(h.session.is_valid());
        assert!(h.session.logout_reason().is_none());
        assert_eq!(reasons.lock().len(), 1);
        assert_eq!(h.history.history().len(), 1);
    }

    #[test]
    fn test_navigation_without_runtime_uses_thread() {
        let h = harness();
        h.pipeline
            .ingest(&inbound(json!({"identifier": "t"})), DeliveryChannel::Tapped);
        std::thread::sleep(Duration::from_millis(100));

        let navigations = h.platform.navigations.lock();
        assert_eq!(navigations.len(), 1);
        assert_eq!(navigations[0].screen, "NotificationHistory");
    }
}
