//! Background checks: session validity polling and unread-counter repair.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::CoreConfig;
use crate::store::{NotificationHistoryStore, SessionValidityStore};

/// Called when the session is found invalid
pub type InvalidationHandler = Arc<dyn Fn() + Send + Sync>;

pub struct SessionMonitor {
    session: SessionValidityStore,
    history: Arc<NotificationHistoryStore>,
    on_invalid: InvalidationHandler,
    // Set once the handler fired; reset when the session is valid again
    reported: AtomicBool,
}

impl SessionMonitor {
    pub fn new(
        session: SessionValidityStore,
        history: Arc<NotificationHistoryStore>,
        on_invalid: InvalidationHandler,
    ) -> Arc<Self> {
        Arc::new(Self {
            session,
            history,
            on_invalid,
            reported: AtomicBool::new(false),
        })
    }

    /// Check validity now; fires the handler once per invalidation
    pub fn check_session(&self) -> bool {
        let valid = self.session.is_valid();
        if valid {
            self.reported.store(false, Ordering::Relaxed);
        } else if !self.reported.swap(true, Ordering::Relaxed) {
            tracing::info!("session invalidated, notifying host");
            (self.on_invalid)();
        }
        valid
    }

    /// Recompute the unread counter from the list
    pub fn repair_history(&self) -> u32 {
        self.history.sync_unread_count()
    }

    /// OS resume signal: run both checks immediately
    pub fn on_foreground(&self) -> bool {
        let valid = self.check_session();
        self.repair_history();
        valid
    }

    /// Start the periodic checks. Must be called inside a Tokio runtime.
    pub fn spawn(self: &Arc<Self>, poll: Duration, repair: Duration) -> MonitorHandle {
        let monitor = Arc::clone(self);
        let task = tokio::spawn(async move {
            // First ticks fire one period after spawn
            let start = tokio::time::Instant::now();
            let mut poll_tick = tokio::time::interval_at(start + poll, poll);
            let mut repair_tick = tokio::time::interval_at(start + repair, repair);
            poll_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            repair_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = poll_tick.tick() => {
                        monitor.check_session();
                    }
                    _ = repair_tick.tick() => {
                        let unread = monitor.repair_history();
                        tracing::debug!(unread, "unread counter repaired");
                    }
                }
            }
        });
        MonitorHandle { task }
    }

    pub fn spawn_with_config(self: &Arc<Self>, config: &CoreConfig) -> MonitorHandle {
        self.spawn(config.session_poll_interval, config.history_repair_interval)
    }
}

/// Owns the monitor task; aborts it on `stop()` or drop
#[derive(Debug)]
pub struct MonitorHandle {
    task: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
