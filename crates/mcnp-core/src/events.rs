//! In-process publish/subscribe registry.
//!
//! The bus is an injectable service: build it once with [`EventBus::new`] and
//! hand the `Arc` to every store or UI adapter that needs it. There is no
//! global instance.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// Event types listeners can register for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    HistoryUpdated,
    SessionInvalidated,
}

/// Events published by the core
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    /// The notification history or its unread counter changed
    HistoryUpdated { unread_count: u32 },
    /// A force logout was received; the host should return to login
    SessionInvalidated { reason: String },
}

impl CoreEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            CoreEvent::HistoryUpdated { .. } => EventKind::HistoryUpdated,
            CoreEvent::SessionInvalidated { .. } => EventKind::SessionInvalidated,
        }
    }
}

type Listener = Arc<dyn Fn(&CoreEvent) + Send + Sync>;

#[derive(Default)]
pub struct EventBus {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<EventKind, Vec<(u64, Listener)>>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.listeners.lock();
        let counts: HashMap<_, _> = listeners.iter().map(|(k, v)| (*k, v.len())).collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

impl EventBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register `listener` for `kind`.
    ///
    /// Dropping the returned [`Subscription`] does not unsubscribe; call
    /// [`Subscription::unsubscribe`] to remove exactly this registration.
    pub fn subscribe<F>(self: &Arc<Self>, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(&CoreEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .entry(kind)
            .or_default()
            .push((id, Arc::new(listener)));
        Subscription {
            bus: Arc::downgrade(self),
            kind,
            id,
        }
    }

    /// Invoke every listener registered for the event's kind, in registration order.
    ///
    /// The listener list is snapshotted first: listeners added during this
    /// publish are not called, and callbacks may subscribe or unsubscribe
    /// without deadlocking. A panicking listener is logged and skipped.
    pub fn publish(&self, event: CoreEvent) {
        let snapshot: Vec<Listener> = {
            let listeners = self.listeners.lock();
            match listeners.get(&event.kind()) {
                Some(entries) => entries.iter().map(|(_, l)| l.clone()).collect(),
                None => return,
            }
        };

        for listener in snapshot {
            if catch_unwind(AssertUnwindSafe(|| listener(&event))).is_err() {
                tracing::warn!(kind = ?event.kind(), "event listener panicked");
            }
        }
    }

    /// Remove every listener for `kind`, or for all kinds when `None`
    pub fn clear_listeners(&self, kind: Option<EventKind>) {
        let mut listeners = self.listeners.lock();
        match kind {
            Some(kind) => {
                listeners.remove(&kind);
            }
            None => listeners.clear(),
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.lock().get(&kind).map_or(0, Vec::len)
    }

    fn remove(&self, kind: EventKind, id: u64) -> bool {
        let mut listeners = self.listeners.lock();
        let Some(entries) = listeners.get_mut(&kind) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        before != entries.len()
    }
}

/// Capability to remove one listener registration
#[derive(Debug)]
pub struct Subscription {
    bus: Weak<EventBus>,
    kind: EventKind,
    id: u64,
}

impl Subscription {
    /// Remove this registration. Returns false when it was already gone
    /// (cleared, or the bus was dropped).
    pub fn unsubscribe(&self) -> bool {
        self.bus
            .upgrade()
            .map_or(false, |bus| bus.remove(self.kind, self.id))
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn history_event(count: u32) -> CoreEvent {
        CoreEvent::HistoryUpdated {
            unread_count: count,
        }
    }

    #[test]
    fn test_publish_reaches_listeners_in_order() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let seen = seen.clone();
            bus.subscribe(EventKind::HistoryUpdated, move |_| seen.lock().push(tag));
        }
        bus.publish(history_event(1));

        assert_eq!(*seen.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_publish_only_matching_kind() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        bus.subscribe(EventKind::SessionInvalidated, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(history_event(0));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        bus.publish(CoreEvent::SessionInvalidated {
            reason: "remote".to_string(),
        });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_listener_does_not_stop_others() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        bus.subscribe(EventKind::HistoryUpdated, |_| panic!("listener failure"));
        let h = hits.clone();
        bus.subscribe(EventKind::HistoryUpdated, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(history_event(2));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_removes_exactly_one_registration() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h1 = hits.clone();
        let first = bus.subscribe(EventKind::HistoryUpdated, move |_| {
            h1.fetch_add(1, Ordering::SeqCst);
        });
        let h2 = hits.clone();
        let _second = bus.subscribe(EventKind::HistoryUpdated, move |_| {
            h2.fetch_add(10, Ordering::SeqCst);
        });

        assert!(first.unsubscribe());
        assert!(!first.unsubscribe());
        bus.publish(history_event(0));

        assert_eq!(hits.load(Ordering::SeqCst), 10);
        assert_eq!(bus.listener_count(EventKind::HistoryUpdated), 1);
    }

    #[test]
    fn test_listener_added_during_publish_is_not_called() {
        let bus = EventBus::new();
        let late_hits = Arc::new(AtomicUsize::new(0));

        let bus_clone = bus.clone();
        let late = late_hits.clone();
        bus.subscribe(EventKind::HistoryUpdated, move |_| {
            let late = late.clone();
            bus_clone.subscribe(EventKind::HistoryUpdated, move |_| {
                late.fetch_add(1, Ordering::SeqCst);
            });
        });

        bus.publish(history_event(0));
        assert_eq!(late_hits.load(Ordering::SeqCst), 0);
        assert_eq!(bus.listener_count(EventKind::HistoryUpdated), 2);

        bus.publish(history_event(0));
        assert_eq!(late_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_listeners() {
        let bus = EventBus::new();
        bus.subscribe(EventKind::HistoryUpdated, |_| {});
        bus.subscribe(EventKind::SessionInvalidated, |_| {});

        bus.clear_listeners(Some(EventKind::HistoryUpdated));
        assert_eq!(bus.listener_count(EventKind::HistoryUpdated), 0);
        assert_eq!(bus.listener_count(EventKind::SessionInvalidated), 1);

        bus.clear_listeners(None);
        assert_eq!(bus.listener_count(EventKind::SessionInvalidated), 0);
    }

    #[test]
    fn test_unsubscribe_after_bus_dropped() {
        let bus = EventBus::new();
        let sub = bus.subscribe(EventKind::HistoryUpdated, |_| {});
        drop(bus);
        assert!(!sub.unsubscribe());
    }
}
