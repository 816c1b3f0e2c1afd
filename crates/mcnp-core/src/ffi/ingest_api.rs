use super::*;

use crate::ingest::{InboundNotification, StartupInputs};

fn parse_notification(json: &str) -> Result<InboundNotification, McnpError> {
    serde_json::from_str(json).map_err(invalid_input)
}

#[uniffi::export]
impl McnpCore {
    /// Ingest one notification immediately and report what happened
    pub fn ingest_notification_json(
        &self,
        json: String,
        channel: NotificationChannel,
    ) -> Result<IngestResult, McnpError> {
        let notification = parse_notification(&json)?;
        let services = self.services()?;
        let _enter = get_tokio_runtime()?.enter();
        let outcome = services.pipeline.ingest(&notification, channel.into());
        Ok(IngestResult::from(&outcome))
    }

    /// Queue a live delivery. Deliveries queued before `run_startup_json`
    /// are processed after the startup drain.
    pub fn deliver_notification_json(
        &self,
        json: String,
        channel: NotificationChannel,
    ) -> Result<(), McnpError> {
        let notification = parse_notification(&json)?;
        let services = self.services()?;
        services
            .live_tx
            .send(Delivery {
                notification,
                channel: channel.into(),
            })
            .map_err(|_| McnpError::Internal {
                message: "live notification listener closed".to_string(),
            })
    }

    /// Drain the tray (`presented`), apply the launch tap (`launchResponse`)
    /// and then start the live listener. Returns the number of new records.
    pub fn run_startup_json(&self, inputs_json: String) -> Result<u32, McnpError> {
        let inputs: StartupInputs = serde_json::from_str(&inputs_json).map_err(invalid_input)?;
        let services = self.services()?;

        let rx = services
            .live_rx
            .lock()
            .map_err(|_| lock_error("live_rx"))?
            .take()
            .ok_or_else(|| invalid_input("startup already ran"))?;

        let _enter = get_tokio_runtime()?.enter();
        let (report, listener) = services.pipeline.start(inputs, rx);

        *services
            .live_listener
            .lock()
            .map_err(|_| lock_error("live_listener"))? = Some(listener);
        Ok(report.created() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_startup_then_live() {
        let dir = tempfile::tempdir().unwrap();
        let core = McnpCore::new();
        assert!(core.init(Some(dir.path().display().to_string())));

        core.deliver_notification_json(
            r#"{"identifier":"tray-1"}"#.to_string(),
            NotificationChannel::Tapped,
        )
        .unwrap();

        let created = core
            .run_startup_json(r#"{"presented":[{"identifier":"tray-1","title":"Aviso"}]}"#.to_string())
            .unwrap();
        assert_eq!(created, 1);
        assert!(core.run_startup_json("{}".to_string()).is_err());

        for _ in 0..50 {
            if core.get_unread_count().unwrap() == 0 {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        let record = core.get_notification("tray-1".to_string()).unwrap().unwrap();
        assert!(record.read);
        core.shutdown();
    }

    #[test]
    fn test_rejects_malformed_payload() {
        let dir = tempfile::tempdir().unwrap();
        let core = McnpCore::new();
        assert!(core.init(Some(dir.path().display().to_string())));

        assert!(matches!(
            core.ingest_notification_json("[1,2]".to_string(), NotificationChannel::Foreground),
            Err(McnpError::InvalidInput { .. })
        ));
        core.shutdown();
    }
}
