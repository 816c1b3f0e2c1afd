use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use super::{KeyValueStore, StorageError};

/// Key-value store persisted as one JSON object on disk.
///
/// All entries are cached in memory; every mutation rewrites the file via a
/// temp-file-then-rename so a crash mid-write never leaves a truncated file.
/// A failed write rolls the in-memory entry back so memory and disk agree.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open (or lazily create) the store file at `path`.
    ///
    /// A missing file is an empty store. A corrupt file is logged and replaced
    /// on the next successful write rather than failing startup.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let (entries, error) = Self::load_from_file(&path);
        if let Some(e) = error {
            tracing::warn!(path = %path.display(), error = %e, "discarding unreadable storage file");
        }
        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_file(path: &Path) -> (BTreeMap<String, String>, Option<StorageError>) {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(entries) => (entries, None),
                Err(e) => (
                    BTreeMap::new(),
                    Some(StorageError::Parse {
                        key: path.display().to_string(),
                        message: e.to_string(),
                    }),
                ),
            },
            // File doesn't exist yet - that's fine, not an error
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (BTreeMap::new(), None),
            Err(e) => (BTreeMap::new(), Some(StorageError::Read(e.to_string()))),
        }
    }

    fn save_to_file(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| StorageError::Write(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StorageError::Write(e.to_string()))?;
            }
        }

        let temp_file = self.path.with_extension("json.tmp");
        fs::write(&temp_file, json).map_err(|e| StorageError::Write(e.to_string()))?;
        fs::rename(&temp_file, &self.path).map_err(|e| StorageError::Write(e.to_string()))?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write();
        let previous = entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.save_to_file(&entries) {
            // Rollback: restore the previous value
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.remove_many(&[key])
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut entries = self.entries.write();
        let removed: Vec<(String, String)> = keys
            .iter()
            .filter_map(|key| entries.remove_entry(*key))
            .collect();
        if removed.is_empty() {
            return Ok(());
        }
        if let Err(e) = self.save_to_file(&entries) {
            entries.extend(removed);
            return Err(e);
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}
