use crate::constants::keys;
use crate::models::{FormProgress, ProfileFormData};
use crate::storage::{log_write_failure, FailOpen, JsonStoreExt, SharedStore};

/// Per-user local cache for the profile form.
///
/// Three keys per user: partial data, wizard progress and the completed flag.
/// Reads fail open to "nothing cached"; writes report success as a bool.
#[derive(Clone)]
pub struct FormCache {
    storage: SharedStore,
}

impl FormCache {
    pub fn new(storage: SharedStore) -> Self {
        Self { storage }
    }

    pub fn load_data(&self, user_id: &str) -> Option<ProfileFormData> {
        self.storage
            .get_json(&data_key(user_id))
            .fail_open("form_cache.load_data", None)
    }

    pub fn save_data(&self, user_id: &str, data: &ProfileFormData) -> bool {
        log_write_failure(
            self.storage.set_json(&data_key(user_id), data),
            "form_cache.save_data",
        )
    }

    pub fn load_progress(&self, user_id: &str) -> Option<FormProgress> {
        self.storage
            .get_json(&progress_key(user_id))
            .fail_open("form_cache.load_progress", None)
    }

    pub fn save_progress(&self, user_id: &str, progress: &FormProgress) -> bool {
        log_write_failure(
            self.storage.set_json(&progress_key(user_id), progress),
            "form_cache.save_progress",
        )
    }

    pub fn is_completed(&self, user_id: &str) -> bool {
        self.storage
            .get(&completed_key(user_id))
            .fail_open("form_cache.is_completed", None)
            .is_some_and(|v| v.trim() == "true")
    }

    pub fn mark_completed(&self, user_id: &str) -> bool {
        log_write_failure(
            self.storage.set(&completed_key(user_id), "true"),
            "form_cache.mark_completed",
        )
    }

    /// Drop partial data and progress, keeping the completed flag
    pub fn clear_partial(&self, user_id: &str) {
        let data = data_key(user_id);
        let progress = progress_key(user_id);
        log_write_failure(
            self.storage.remove_many(&[data.as_str(), progress.as_str()]),
            "form_cache.clear_partial",
        );
    }

    /// Remove every key belonging to `user_id`
    pub fn clear_user(&self, user_id: &str) {
        let data = data_key(user_id);
        let progress = progress_key(user_id);
        let completed = completed_key(user_id);
        log_write_failure(
            self.storage.remove_many(&[data.as_str(), progress.as_str(), completed.as_str()]),
            "form_cache.clear_user",
        );
    }

    /// Remove form keys of every user, for logouts where the user id is unknown
    pub fn clear_all_users(&self) {
        let all_keys = self
            .storage
            .keys()
            .fail_open("form_cache.clear_all_users", Vec::new());
        let form_keys: Vec<&str> = all_keys
            .iter()
            .map(String::as_str)
            .filter(|k| {
                k.starts_with(keys::FORM_DATA_PREFIX)
                    || k.starts_with(keys::FORM_PROGRESS_PREFIX)
                    || k.starts_with(keys::FORM_COMPLETED_PREFIX)
            })
            .collect();
        if !form_keys.is_empty() {
            log_write_failure(
                self.storage.remove_many(&form_keys),
                "form_cache.clear_all_users",
            );
        }
    }
}

fn data_key(user_id: &str) -> String {
    format!("{}{}", keys::FORM_DATA_PREFIX, user_id)
}

fn progress_key(user_id: &str) -> String {
    format!("{}{}", keys::FORM_PROGRESS_PREFIX, user_id)
}

fn completed_key(user_id: &str) -> String {
    format!("{}{}", keys::FORM_COMPLETED_PREFIX, user_id)
}
