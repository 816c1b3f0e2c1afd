use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::history_queries::{self, DayGroup, HistoryStats, SortOrder};
use crate::constants::{keys, DEFAULT_NOTIFICATION_BODY, EXPORT_VERSION, HISTORY_CAPACITY};
use crate::events::{CoreEvent, EventBus};
use crate::models::NotificationRecord;
use crate::platform::BadgeSink;
use crate::storage::{log_write_failure, FailOpen, JsonStoreExt, SharedStore, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Invalid history export: {0}")]
    InvalidEnvelope(String),
    #[error("Failed to encode history export: {0}")]
    Encode(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Versioned export envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryExport {
    pub history: Vec<NotificationRecord>,
    pub export_date: DateTime<Utc>,
    pub version: String,
}

/// Lenient envelope used on import: records are validated one by one
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHistoryExport {
    history: Vec<Value>,
    #[serde(default)]
    version: Option<String>,
}

/// Local notification history plus its denormalized unread counter.
///
/// Every mutation is a whole-list read-modify-write of one storage key,
/// serialized by `write_lock` so concurrent callers cannot lose updates.
/// Events are published after the lock is released, so listeners may call
/// back into the store.
pub struct NotificationHistoryStore {
    storage: SharedStore,
    bus: Arc<EventBus>,
    badge: Arc<dyn BadgeSink>,
    capacity: usize,
    write_lock: Mutex<()>,
}

impl NotificationHistoryStore {
    pub fn new(storage: SharedStore, bus: Arc<EventBus>, badge: Arc<dyn BadgeSink>) -> Self {
        Self {
            storage,
            bus,
            badge,
            capacity: HISTORY_CAPACITY,
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// All records, newest first. Empty on storage failure.
    pub fn history(&self) -> Vec<NotificationRecord> {
        self.storage
            .get_json::<Vec<NotificationRecord>>(keys::NOTIFICATION_HISTORY)
            .fail_open("history.load", None)
            .unwrap_or_default()
    }

    /// Persisted unread counter. 0 on storage failure or garbage.
    pub fn unread_count(&self) -> u32 {
        self.storage
            .get(keys::UNREAD_COUNT)
            .fail_open("history.unread_count", None)
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .unwrap_or(0)
    }

    pub fn get_by_id(&self, id: &str) -> Option<NotificationRecord> {
        self.history().into_iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.history().iter().any(|r| r.id == id)
    }

    /// Insert a record at the front. Idempotent on `id`.
    ///
    /// Returns false only when the list could not be persisted.
    pub fn add(&self, record: NotificationRecord) -> bool {
        let unread = {
            let _guard = self.write_lock.lock();
            let mut history = self.history();
            if history.iter().any(|r| r.id == record.id) {
                tracing::debug!(id = %record.id, "notification already in history");
                return true;
            }

            let added_unread = !record.read;
            history.insert(0, record);
            let evicted_unread = history
                .iter()
                .skip(self.capacity)
                .filter(|r| !r.read)
                .count() as u32;
            history.truncate(self.capacity);

            if !self.save_history(&history, "history.add") {
                return false;
            }

            let mut count = self.unread_count();
            if added_unread {
                count = count.saturating_add(1);
            }
            count = count.saturating_sub(evicted_unread);
            self.write_unread_count(count, "history.add");
            count
        };

        self.publish(unread);
        true
    }

    /// Flip an unread record to read. No-op if absent or already read.
    pub fn mark_read(&self, id: &str) -> bool {
        let unread = {
            let _guard = self.write_lock.lock();
            let mut history = self.history();
            let Some(record) = history.iter_mut().find(|r| r.id == id && !r.read) else {
                return false;
            };
            record.read = true;

            if !self.save_history(&history, "history.mark_read") {
                return false;
            }
            let count = self.unread_count().saturating_sub(1);
            self.write_unread_count(count, "history.mark_read");
            count
        };

        self.publish(unread);
        true
    }

    /// Mark every record read; returns how many changed
    pub fn mark_all_read(&self) -> usize {
        let changed = {
            let _guard = self.write_lock.lock();
            let mut history = self.history();
            let mut changed = 0;
            for record in history.iter_mut().filter(|r| !r.read) {
                record.read = true;
                changed += 1;
            }
            if changed > 0 && !self.save_history(&history, "history.mark_all_read") {
                return 0;
            }
            self.write_unread_count(0, "history.mark_all_read");
            changed
        };

        self.publish(0);
        changed
    }

    /// Remove one record. Publishes only when an unread record was removed.
    pub fn delete(&self, id: &str) -> bool {
        let outcome = {
            let _guard = self.write_lock.lock();
            let mut history = self.history();
            let Some(index) = history.iter().position(|r| r.id == id) else {
                return false;
            };
            let removed = history.remove(index);

            if !self.save_history(&history, "history.delete") {
                return false;
            }
            if removed.read {
                None
            } else {
                let count = self.unread_count().saturating_sub(1);
                self.write_unread_count(count, "history.delete");
                Some(count)
            }
        };

        if let Some(unread) = outcome {
            self.publish(unread);
        }
        true
    }

    /// Remove several records with a single counter adjustment and one publish
    pub fn delete_many(&self, ids: &[String]) -> usize {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let (removed, unread) = {
            let _guard = self.write_lock.lock();
            let history = self.history();
            let before = history.len();
            let (gone, kept): (Vec<_>, Vec<_>) = history
                .into_iter()
                .partition(|r| wanted.contains(r.id.as_str()));
            if gone.is_empty() {
                return 0;
            }
            if !self.save_history(&kept, "history.delete_many") {
                return 0;
            }

            let unread_removed = gone.iter().filter(|r| !r.read).count() as u32;
            let count = self.unread_count().saturating_sub(unread_removed);
            self.write_unread_count(count, "history.delete_many");
            (before - kept.len(), count)
        };

        self.publish(unread);
        removed
    }

    pub fn clear_all(&self) {
        {
            let _guard = self.write_lock.lock();
            self.save_history(&[], "history.clear_all");
            self.write_unread_count(0, "history.clear_all");
        }
        self.publish(0);
    }

    /// Push a count to the OS badge, defaulting to the stored counter
    pub fn update_badge(&self, count: Option<u32>) {
        let count = count.unwrap_or_else(|| self.unread_count());
        if let Err(e) = self.badge.set_badge_count(count) {
            tracing::warn!(count, error = %e, "failed to update badge");
        }
    }

    /// Recompute the counter from the list. Safe to call at any time.
    pub fn sync_unread_count(&self) -> u32 {
        let (actual, drifted) = {
            let _guard = self.write_lock.lock();
            let actual = history_queries::unread_total(&self.history());
            let stored = self.unread_count();
            self.write_unread_count(actual, "history.sync_unread_count");
            (actual, stored != actual)
        };

        if drifted {
            tracing::info!(unread = actual, "unread counter repaired");
        }
        self.update_badge(Some(actual));
        self.publish(actual);
        actual
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn filter_by_read(&self, read: bool) -> Vec<NotificationRecord> {
        history_queries::filter_by_read(&self.history(), read)
    }

    pub fn filter_by_type(&self, kind: &str) -> Vec<NotificationRecord> {
        history_queries::filter_by_type(&self.history(), kind)
    }

    pub fn filter_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<NotificationRecord> {
        history_queries::filter_by_date_range(&self.history(), start, end)
    }

    pub fn sorted(&self, order: SortOrder) -> Vec<NotificationRecord> {
        history_queries::sorted(&self.history(), order)
    }

    pub fn grouped_by_day(&self) -> Vec<DayGroup> {
        history_queries::group_by_day(&self.history())
    }

    pub fn search(&self, query: &str) -> Vec<NotificationRecord> {
        history_queries::search(&self.history(), query)
    }

    pub fn stats(&self) -> HistoryStats {
        history_queries::stats(&self.history())
    }

    // ---------------------------------------------------------------------
    // Export / import / compress
    // ---------------------------------------------------------------------

    pub fn export(&self) -> HistoryExport {
        HistoryExport {
            history: self.history(),
            export_date: Utc::now(),
            version: EXPORT_VERSION.to_string(),
        }
    }

    pub fn export_json(&self) -> Result<String, HistoryError> {
        serde_json::to_string_pretty(&self.export()).map_err(|e| HistoryError::Encode(e.to_string()))
    }

    /// Replace the history with the records of an export envelope.
    ///
    /// Records missing an id, title or parseable `receivedAt` are dropped;
    /// the rest are de-duplicated, ordered newest first and capped. The
    /// unread counter is recomputed afterwards. Returns the number imported.
    pub fn import_json(&self, json: &str) -> Result<usize, HistoryError> {
        let raw: RawHistoryExport =
            serde_json::from_str(json).map_err(|e| HistoryError::InvalidEnvelope(e.to_string()))?;
        if let Some(version) = raw.version.as_deref().filter(|v| *v != EXPORT_VERSION) {
            tracing::warn!(version, "importing history export with unexpected version");
        }

        let offered = raw.history.len();
        let mut seen = HashSet::new();
        let mut records: Vec<NotificationRecord> = raw
            .history
            .into_iter()
            .filter_map(record_from_import)
            .filter(|r| seen.insert(r.id.clone()))
            .collect();
        records.sort_by(|a, b| b.received_at.cmp(&a.received_at));
        records.truncate(self.capacity);

        {
            let _guard = self.write_lock.lock();
            self.storage
                .set_json(keys::NOTIFICATION_HISTORY, &records)?;
        }

        tracing::info!(imported = records.len(), offered, "history imported");
        self.sync_unread_count();
        Ok(records.len())
    }

    /// Strip every record's payload down to the navigation and type keys
    pub fn compress(&self) -> usize {
        let _guard = self.write_lock.lock();
        let mut history = self.history();
        for record in history.iter_mut() {
            record.compress();
        }
        if self.save_history(&history, "history.compress") {
            history.len()
        } else {
            0
        }
    }

    fn save_history(&self, history: &[NotificationRecord], context: &str) -> bool {
        log_write_failure(
            self.storage.set_json(keys::NOTIFICATION_HISTORY, history),
            context,
        )
    }

    fn write_unread_count(&self, count: u32, context: &str) {
        log_write_failure(
            self.storage.set(keys::UNREAD_COUNT, &count.to_string()),
            context,
        );
    }

    fn publish(&self, unread_count: u32) {
        self.bus.publish(CoreEvent::HistoryUpdated { unread_count });
    }
}

/// Validate one imported record; id, title and receivedAt are mandatory
fn record_from_import(value: Value) -> Option<NotificationRecord> {
    let object = value.as_object()?;
    let id = object.get("id")?.as_str()?.trim();
    if id.is_empty() {
        return None;
    }
    let title = object.get("title")?.as_str()?;
    let received_at = object
        .get("receivedAt")?
        .as_str()?
        .parse::<DateTime<Utc>>()
        .ok()?;

    Some(NotificationRecord {
        id: id.to_string(),
        title: title.to_string(),
        body: object
            .get("body")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_NOTIFICATION_BODY)
            .to_string(),
        data: object
            .get("data")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
        received_at,
        read: object.get("read").and_then(Value::as_bool).unwrap_or(false),
        received_in_background: object.get("receivedInBackground").and_then(Value::as_bool),
    })
}
