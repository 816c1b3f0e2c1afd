use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    DEFAULT_API_BASE_URL, HISTORY_CAPACITY, HISTORY_REPAIR_INTERVAL_SECS, NAVIGATION_DELAY_MS,
    SESSION_POLL_INTERVAL_SECS,
};

#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    pub api_base_url: String,
    pub session_poll_interval: Duration,
    pub history_repair_interval: Duration,
    pub navigation_delay: Duration,
    pub history_capacity: usize,
}

impl CoreConfig {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            session_poll_interval: Duration::from_secs(SESSION_POLL_INTERVAL_SECS),
            history_repair_interval: Duration::from_secs(HISTORY_REPAIR_INTERVAL_SECS),
            navigation_delay: Duration::from_millis(NAVIGATION_DELAY_MS),
            history_capacity: HISTORY_CAPACITY,
        }
    }

    /// Build a config from the process environment.
    ///
    /// - `MCNP_BASE_DIR`: data directory (defaults to the platform data dir + `mcnp`)
    /// - `MCNP_API_URL`: backend root URL
    /// - `MCNP_SESSION_POLL_SECS`: session validity poll interval
    pub fn from_env() -> Self {
        let mut config = Self::new(default_data_dir());

        if let Ok(url) = std::env::var("MCNP_API_URL") {
            if !url.trim().is_empty() {
                config.api_base_url = url.trim().trim_end_matches('/').to_string();
            }
        }

        if let Some(secs) = std::env::var("MCNP_SESSION_POLL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
        {
            config.session_poll_interval = Duration::from_secs(secs);
        }

        config
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join("storage.json")
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new("mcnp_data")
    }
}

/// Data directory used when no explicit path is given
pub fn default_data_dir() -> PathBuf {
    if let Ok(base_dir) = std::env::var("MCNP_BASE_DIR") {
        return PathBuf::from(base_dir);
    }
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("mcnp")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_defaults() {
        let config = CoreConfig::new("/tmp/mcnp-test");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/mcnp-test"));
        assert_eq!(config.history_capacity, 100);
        assert_eq!(config.navigation_delay, Duration::from_millis(500));
        assert_eq!(config.storage_path(), PathBuf::from("/tmp/mcnp-test/storage.json"));
    }

    #[test]
    fn test_with_api_base_url() {
        let config = CoreConfig::default().with_api_base_url("http://localhost:9000");
        assert_eq!(config.api_base_url, "http://localhost:9000");
        assert_eq!(config.data_dir, PathBuf::from("mcnp_data"));
    }
}
