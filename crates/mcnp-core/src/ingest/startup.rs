//! Bounded startup sequence and the live delivery listener.
//!
//! At launch several channels race: notifications still in the OS tray, the
//! tap that opened the app, and new live deliveries. They are applied in that
//! order so a tap's mark-read always lands after the record it refers to.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{DeliveryChannel, InboundNotification, IngestOutcome, IngestionPipeline};

/// One live delivery handed to the listener
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub notification: InboundNotification,
    pub channel: DeliveryChannel,
}

/// What the OS reported at launch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupInputs {
    /// Notifications still presented in the tray
    #[serde(default)]
    pub presented: Vec<InboundNotification>,
    /// The notification whose tap launched or resumed the app
    #[serde(default)]
    pub launch_response: Option<InboundNotification>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupReport {
    pub presented: Vec<IngestOutcome>,
    pub launch_response: Option<IngestOutcome>,
}

impl StartupReport {
    pub fn created(&self) -> usize {
        self.presented
            .iter()
            .chain(self.launch_response.iter())
            .filter(|o| matches!(o, IngestOutcome::Created { .. }))
            .count()
    }
}

/// Handle to the live listener task; stops it on `stop()` or drop
#[derive(Debug)]
pub struct LiveListener {
    task: JoinHandle<()>,
}

impl LiveListener {
    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for LiveListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl IngestionPipeline {
    /// Drain the tray, then the launch tap. No live deliveries are processed.
    pub fn run_startup(&self, inputs: StartupInputs) -> StartupReport {
        let presented: Vec<IngestOutcome> = inputs
            .presented
            .iter()
            .map(|n| self.ingest(n, DeliveryChannel::AlreadyPresented))
            .collect();

        let launch_response = inputs
            .launch_response
            .as_ref()
            .map(|n| self.ingest(n, DeliveryChannel::Tapped));

        tracing::info!(
            presented = presented.len(),
            launch_tap = launch_response.is_some(),
            "notification startup drained"
        );

        StartupReport {
            presented,
            launch_response,
        }
    }

    /// Process live deliveries in arrival order until the sender closes
    pub fn attach_live(self: &Arc<Self>, mut deliveries: mpsc::UnboundedReceiver<Delivery>) -> LiveListener {
        let pipeline = Arc::clone(self);
        let task = tokio::spawn(async move {
            while let Some(delivery) = deliveries.recv().await {
                pipeline.ingest(&delivery.notification, delivery.channel);
            }
            tracing::debug!("live notification listener closed");
        });
        LiveListener { task }
    }

    /// Full startup: tray, then launch tap, then the live listener.
    ///
    /// Deliveries queued on `deliveries` before this call are held until the
    /// first two phases finish. Must be called inside a Tokio runtime.
    pub fn start(
        self: &Arc<Self>,
        inputs: StartupInputs,
        deliveries: mpsc::UnboundedReceiver<Delivery>,
    ) -> (StartupReport, LiveListener) {
        let report = self.run_startup(inputs);
        let listener = self.attach_live(deliveries);
        (report, listener)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{harness, inbound};
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_launch_tap_applies_after_presented_drain() {
        let h = harness();
        let tapped = inbound(json!({"identifier": "os-1", "title": "Congreso"}));
        let inputs = StartupInputs {
            presented: vec![tapped.clone(), inbound(json!({"identifier": "os-2"}))],
            launch_response: Some(tapped),
        };

        let (_tx, rx) = mpsc::unbounded_channel();
        let (report, _listener) = h.pipeline.start(inputs, rx);

        assert_eq!(report.created(), 2);
        assert!(matches!(
            report.launch_response,
            Some(IngestOutcome::MarkedRead { .. })
        ));
        assert!(h.history.get_by_id("os-1").unwrap().read);
        assert!(!h.history.get_by_id("os-2").unwrap().read);
        assert_eq!(h.history.unread_count(), 1);
    }

    #[tokio::test]
    async fn test_live_deliveries_queued_early_run_after_startup() {
        let h = harness();
        let (tx, rx) = mpsc::unbounded_channel();

        // A live tap that arrives before startup finishes must not be lost
        tx.send(Delivery {
            notification: inbound(json!({"identifier": "os-9"})),
            channel: DeliveryChannel::Tapped,
        })
        .unwrap();

        let inputs = StartupInputs {
            presented: vec![inbound(json!({"identifier": "os-9"}))],
            launch_response: None,
        };
        let (report, listener) = h.pipeline.start(inputs, rx);
        assert_eq!(report.created(), 1);

        tx.send(Delivery {
            notification: inbound(json!({"identifier": "os-10"})),
            channel: DeliveryChannel::Foreground,
        })
        .unwrap();
        drop(tx);

        for _ in 0..50 {
            if listener.is_finished() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(h.history.get_by_id("os-9").unwrap().read);
        assert!(h.history.get_by_id("os-10").is_some());
        assert_eq!(h.history.unread_count(), 1);
    }

    #[tokio::test]
    async fn test_stopped_listener_ignores_deliveries() {
        let h = harness();
        let (tx, rx) = mpsc::unbounded_channel();
        let listener = h.pipeline.attach_live(rx);
        listener.stop();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let _ = tx.send(Delivery {
            notification: inbound(json!({"identifier": "late"})),
            channel: DeliveryChannel::Foreground,
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(h.history.history().is_empty());
    }
}
