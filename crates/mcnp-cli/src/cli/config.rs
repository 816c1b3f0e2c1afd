use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mcnp_core::CoreConfig;
use serde::{Deserialize, Serialize};

/// CLI configuration that can be loaded from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    /// Directory holding `storage.json`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Backend root URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl CliConfig {
    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: CliConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Core config from the environment, overridden by this file and then
    /// by an explicit `--data-dir`
    pub fn core_config(&self, data_dir: Option<PathBuf>) -> CoreConfig {
        let mut config = CoreConfig::from_env();
        if let Some(dir) = data_dir.or_else(|| self.data_dir.clone()) {
            config.data_dir = dir;
        }
        if let Some(url) = &self.api_url {
            config = config.with_api_base_url(url.clone());
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{"dataDir": "/tmp/mcnp", "apiUrl": "https://staging.mcnp.mx"}"#;
        let config: CliConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/mcnp")));
        assert_eq!(config.api_url.as_deref(), Some("https://staging.mcnp.mx"));
    }

    #[test]
    fn test_parse_config_minimal() {
        let config: CliConfig = serde_json::from_str("{}").unwrap();
        assert!(config.data_dir.is_none());
        assert!(config.api_url.is_none());
    }

    #[test]
    fn test_flag_overrides_file() {
        let config = CliConfig {
            data_dir: Some(PathBuf::from("/from/file")),
            api_url: None,
        };
        assert_eq!(
            config.core_config(Some(PathBuf::from("/from/flag"))).data_dir,
            PathBuf::from("/from/flag")
        );
        assert_eq!(config.core_config(None).data_dir, PathBuf::from("/from/file"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = CliConfig::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
