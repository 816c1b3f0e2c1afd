use super::*;

#[uniffi::export]
impl McnpCore {
    // =========================================================================
    // EVENT CALLBACK API
    // =========================================================================

    /// Register a callback to receive history and session events.
    ///
    /// The callback is invoked on whichever thread caused the change.
    /// Only one callback can be registered at a time; calling this again
    /// replaces the previous one.
    pub fn set_event_callback(&self, callback: Box<dyn EventCallback>) {
        let callback: Arc<dyn EventCallback> = Arc::from(callback);
        if let Ok(mut guard) = self.event_callback.write() {
            *guard = Some(callback);
        }
        tracing::debug!("ffi.set_event_callback");
    }

    pub fn clear_event_callback(&self) {
        if let Ok(mut guard) = self.event_callback.write() {
            *guard = None;
        }
    }

    // =========================================================================
    // PLATFORM CALLBACK API
    // =========================================================================

    /// Register the badge/navigation implementation of the host shell
    pub fn set_platform_callback(&self, callback: Box<dyn PlatformCallback>) {
        let callback: Arc<dyn PlatformCallback> = Arc::from(callback);
        if let Ok(mut guard) = self.platform_callback.write() {
            *guard = Some(callback);
        }
    }

    pub fn clear_platform_callback(&self) {
        if let Ok(mut guard) = self.platform_callback.write() {
            *guard = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        unread: Mutex<Vec<u32>>,
        invalidated: Mutex<Vec<String>>,
        badges: Mutex<Vec<u32>>,
        navigations: Mutex<Vec<String>>,
    }

    struct EventProbe(Arc<Recorder>);

    impl EventCallback for EventProbe {
        fn on_history_updated(&self, unread_count: u32) {
            self.0.unread.lock().unwrap().push(unread_count);
        }

        fn on_session_invalidated(&self, reason: String) {
            self.0.invalidated.lock().unwrap().push(reason);
        }
    }

    struct PlatformProbe(Arc<Recorder>);

    impl PlatformCallback for PlatformProbe {
        fn set_badge_count(&self, count: u32) {
            self.0.badges.lock().unwrap().push(count);
        }

        fn navigate(&self, screen: String, _section: Option<String>) {
            self.0.navigations.lock().unwrap().push(screen);
        }
    }

    #[test]
    fn test_callbacks_receive_events() {
        let dir = tempfile::tempdir().unwrap();
        let core = McnpCore::new();
        assert!(core.init(Some(dir.path().display().to_string())));

        let recorder = Arc::new(Recorder::default());
        core.set_event_callback(Box::new(EventProbe(Arc::clone(&recorder))));
        core.set_platform_callback(Box::new(PlatformProbe(Arc::clone(&recorder))));

        core.ingest_notification_json(
            r#"{"identifier":"n1","data":{"screen":"Events"}}"#.to_string(),
            NotificationChannel::Tapped,
        )
        .unwrap();
        core.ingest_notification_json(
            r#"{"identifier":"n2","data":{"type":"force_logout"}}"#.to_string(),
            NotificationChannel::Foreground,
        )
        .unwrap();

        assert_eq!(recorder.unread.lock().unwrap().first(), Some(&0));
        assert_eq!(recorder.invalidated.lock().unwrap().len(), 1);
        assert_eq!(recorder.badges.lock().unwrap().last(), Some(&1));

        for _ in 0..100 {
            if !recorder.navigations.lock().unwrap().is_empty() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(recorder.navigations.lock().unwrap().as_slice(), ["Events"]);

        core.clear_event_callback();
        core.clear_history().unwrap();
        assert_eq!(recorder.unread.lock().unwrap().len(), 2);
        core.shutdown();
    }
}
