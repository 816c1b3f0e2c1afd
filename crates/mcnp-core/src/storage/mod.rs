//! Persisted key-value storage.
//!
//! Every persisted artifact in the core (notification history, unread counter,
//! session validity, per-user form caches) lives under a string key holding a
//! string value, JSON-encoded where structured. Stores hold a [`SharedStore`]
//! and never touch the filesystem directly.

mod file_store;
mod memory_store;

pub use file_store::JsonFileStore;
pub use memory_store::MemoryStore;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Errors raised by a [`KeyValueStore`] backend
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to read storage: {0}")]
    Read(String),
    #[error("Failed to write storage: {0}")]
    Write(String),
    #[error("Failed to parse value stored under {key}: {message}")]
    Parse { key: String, message: String },
    #[error("Failed to encode value for {key}: {message}")]
    Encode { key: String, message: String },
}

/// String key-value persistence backend.
///
/// Implementations must be safe to share across threads; each call is
/// individually atomic but there are no multi-key transactions.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}

pub type SharedStore = Arc<dyn KeyValueStore>;

/// JSON helpers available on every store, including `dyn KeyValueStore`
pub trait JsonStoreExt {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError>;
    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> JsonStoreExt for S {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StorageError::Parse {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|e| StorageError::Encode {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.set(key, &raw)
    }
}

/// The fail-open policy for storage reads and writes.
///
/// A storage glitch must never block a signed-in user, so callers collapse a
/// `Result<T, StorageError>` into a safe default with a logged warning instead
/// of propagating it.
pub trait FailOpen<T> {
    /// Return the value, or `fallback` after logging the error under `context`
    fn fail_open(self, context: &str, fallback: T) -> T;
}

impl<T> FailOpen<T> for Result<T, StorageError> {
    fn fail_open(self, context: &str, fallback: T) -> T {
        match self {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(context, error = %e, "storage failure, using fallback");
                fallback
            }
        }
    }
}

/// Run a write whose failure is logged and otherwise ignored
pub(crate) fn log_write_failure(result: Result<(), StorageError>, context: &str) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(context, error = %e, "storage write failed");
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Store whose every operation fails, for exercising fail-open paths
    pub struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Read("disk unavailable".to_string()))
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Write("disk unavailable".to_string()))
        }
        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Write("disk unavailable".to_string()))
        }
        fn keys(&self) -> Result<Vec<String>, StorageError> {
            Err(StorageError::Read("disk unavailable".to_string()))
        }
    }
}
