use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::constants::keys;
use crate::storage::{log_write_failure, FailOpen, SharedStore};

/// Persisted session validity, as read back for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionValidity {
    pub valid: bool,
    pub session_start_time: Option<DateTime<Utc>>,
    pub last_check_time: Option<DateTime<Utc>>,
}

/// Whether the current login may still be used.
///
/// Fail-open throughout: a missing, unreadable or unparseable flag means
/// valid. Storage errors are logged and never reach the caller.
#[derive(Clone)]
pub struct SessionValidityStore {
    storage: SharedStore,
}

impl SessionValidityStore {
    pub fn new(storage: SharedStore) -> Self {
        Self { storage }
    }

    /// Called on successful login
    pub fn mark_valid(&self) {
        let now = now_millis_string();
        log_write_failure(self.storage.set(keys::SESSION_VALID, "true"), "session.mark_valid");
        log_write_failure(
            self.storage.set(keys::SESSION_START_TIME, &now),
            "session.mark_valid",
        );
        log_write_failure(
            self.storage.set(keys::SESSION_LAST_CHECK, &now),
            "session.mark_valid",
        );
        tracing::info!("session marked valid");
    }

    /// Called when a force logout arrives; timestamps are left untouched
    pub fn mark_invalid(&self) {
        log_write_failure(
            self.storage.set(keys::SESSION_VALID, "false"),
            "session.mark_invalid",
        );
        tracing::info!("session marked invalid");
    }

    /// Current validity. Stamps the last-check time on every call.
    pub fn is_valid(&self) -> bool {
        let raw = self
            .storage
            .get(keys::SESSION_VALID)
            .fail_open("session.is_valid", None);

        log_write_failure(
            self.storage
                .set(keys::SESSION_LAST_CHECK, &now_millis_string()),
            "session.is_valid",
        );

        match raw.as_deref().map(str::trim) {
            None => true,
            Some("true") => true,
            Some("false") => false,
            Some(other) => {
                tracing::warn!(value = other, "unrecognized session flag, assuming valid");
                true
            }
        }
    }

    /// Called on logout
    pub fn clear(&self) {
        log_write_failure(
            self.storage.remove_many(&[
                keys::SESSION_VALID,
                keys::SESSION_START_TIME,
                keys::SESSION_LAST_CHECK,
            ]),
            "session.clear",
        );
    }

    /// Read the persisted fields without stamping the check time
    pub fn snapshot(&self) -> SessionValidity {
        let valid = self
            .storage
            .get(keys::SESSION_VALID)
            .fail_open("session.snapshot", None)
            .map_or(true, |v| v.trim() != "false");
        SessionValidity {
            valid,
            session_start_time: self.read_timestamp(keys::SESSION_START_TIME),
            last_check_time: self.read_timestamp(keys::SESSION_LAST_CHECK),
        }
    }

    /// Keep a human-readable reason to show at the next login screen
    pub fn set_logout_reason(&self, reason: &str) {
        log_write_failure(
            self.storage.set(keys::FORCE_LOGOUT_REASON, reason),
            "session.set_logout_reason",
        );
    }

    pub fn logout_reason(&self) -> Option<String> {
        self.storage
            .get(keys::FORCE_LOGOUT_REASON)
            .fail_open("session.logout_reason", None)
    }

    /// Read and remove the pending logout reason so it is shown once
    pub fn take_logout_reason(&self) -> Option<String> {
        let reason = self.logout_reason()?;
        log_write_failure(
            self.storage.remove(keys::FORCE_LOGOUT_REASON),
            "session.take_logout_reason",
        );
        Some(reason)
    }

    fn read_timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        let raw = self.storage.get(key).fail_open("session.read_timestamp", None)?;
        let millis = raw.trim().parse::<i64>().ok()?;
        Utc.timestamp_millis_opt(millis).single()
    }
}

fn now_millis_string() -> String {
    Utc::now().timestamp_millis().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::BrokenStore;
    use crate::storage::{KeyValueStore, MemoryStore};
    use std::sync::Arc;

    fn store() -> (Arc<MemoryStore>, SessionValidityStore) {
        let storage = Arc::new(MemoryStore::new());
        let session = SessionValidityStore::new(storage.clone());
        (storage, session)
    }

    #[test]
    fn test_never_written_is_valid() {
        let (_, session) = store();
        assert!(session.is_valid());
    }

    #[test]
    fn test_read_error_is_valid() {
        let session = SessionValidityStore::new(Arc::new(BrokenStore));
        assert!(session.is_valid());
        session.mark_invalid();
        assert!(session.is_valid());
        assert!(session.snapshot().valid);
    }

    #[test]
    fn test_mark_invalid_then_valid() {
        let (_, session) = store();
        session.mark_invalid();
        assert!(!session.is_valid());
        session.mark_valid();
        assert!(session.is_valid());
    }

    #[test]
    fn test_mark_valid_stamps_both_times() {
        let (storage, session) = store();
        session.mark_valid();

        let snapshot = session.snapshot();
        assert!(snapshot.valid);
        assert!(snapshot.session_start_time.is_some());
        assert_eq!(snapshot.session_start_time, snapshot.last_check_time);
        assert_eq!(storage.get(keys::SESSION_VALID).unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn test_mark_invalid_keeps_timestamps() {
        let (storage, session) = store();
        storage.set(keys::SESSION_START_TIME, "1700000000000").unwrap();
        session.mark_invalid();

        assert_eq!(
            storage.get(keys::SESSION_START_TIME).unwrap().as_deref(),
            Some("1700000000000")
        );
        assert_eq!(storage.get(keys::SESSION_LAST_CHECK).unwrap(), None);
    }

    #[test]
    fn test_is_valid_stamps_last_check() {
        let (storage, session) = store();
        assert_eq!(storage.get(keys::SESSION_LAST_CHECK).unwrap(), None);
        session.is_valid();
        let stamped = storage.get(keys::SESSION_LAST_CHECK).unwrap().unwrap();
        assert!(stamped.parse::<i64>().is_ok());
    }

    #[test]
    fn test_garbage_flag_is_valid() {
        let (storage, session) = store();
        storage.set(keys::SESSION_VALID, "maybe").unwrap();
        assert!(session.is_valid());
    }

    #[test]
    fn test_clear_removes_all_three_keys() {
        let (storage, session) = store();
        session.mark_valid();
        session.mark_invalid();
        session.clear();

        assert!(storage.is_empty());
        assert!(session.is_valid());
    }

    #[test]
    fn test_logout_reason_is_taken_once() {
        let (_, session) = store();
        assert_eq!(session.take_logout_reason(), None);

        session.set_logout_reason("Sesión cerrada por el administrador");
        assert_eq!(
            session.logout_reason().as_deref(),
            Some("Sesión cerrada por el administrador")
        );
        assert_eq!(
            session.take_logout_reason().as_deref(),
            Some("Sesión cerrada por el administrador")
        );
        assert_eq!(session.take_logout_reason(), None);
    }
}
