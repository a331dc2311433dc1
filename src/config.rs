//! User configuration, read from `config.toml`

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::review::composer::SessionCaps;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
    #[error("Failed to get config directory")]
    ConfigDirNotFound,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Where review data comes from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// JSON files on this machine
    #[default]
    Local,
    /// The hosted review API
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendConfig {
    #[serde(default)]
    pub mode: BackendMode,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Environment variable holding the bearer token
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://api.biubiuenglish.com".to_string()
}

fn default_token_env() -> String {
    "REVIEW_API_TOKEN".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            mode: BackendMode::default(),
            api_base: default_api_base(),
            token_env: default_token_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BackendConfig {
    /// Bearer token from the configured environment variable
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env).ok().filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Base directory for local notebooks and session progress
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Scopes saved progress and cached states
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionCaps,
    #[serde(default)]
    pub storage: StorageConfig,
}

fn default_user_id() -> String {
    "local".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            backend: BackendConfig::default(),
            session: SessionCaps::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("notebook-review").join("config.toml"))
            .ok_or(ConfigError::ConfigDirNotFound)
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.session.vocab_cap == 0 || self.session.sentence_cap == 0 {
            return Err(ConfigError::Invalid(
                "session caps must be at least 1".to_string(),
            ));
        }
        if self.user_id.trim().is_empty() {
            return Err(ConfigError::Invalid("user_id must not be empty".to_string()));
        }
        if self.backend.mode == BackendMode::Remote
            && !self.backend.api_base.starts_with("http://")
            && !self.backend.api_base.starts_with("https://")
        {
            return Err(ConfigError::Invalid(format!(
                "api_base must be an http(s) URL, got {}",
                self.backend.api_base
            )));
        }
        Ok(())
    }

    /// Data directory, falling back to the user's local data directory
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.storage
            .data_dir
            .clone()
            .or_else(|| dirs::data_local_dir().map(|p| p.join("notebook-review")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(&temp.path().join("config.toml")).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.session.vocab_cap, 20);
        assert_eq!(config.session.sentence_cap, 50);
        assert_eq!(config.backend.mode, BackendMode::Local);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
user_id = "u-42"

[backend]
mode = "remote"

[session]
sentence_cap = 30
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.user_id, "u-42");
        assert_eq!(config.backend.mode, BackendMode::Remote);
        assert_eq!(config.backend.api_base, "https://api.biubiuenglish.com");
        assert_eq!(config.session.vocab_cap, 20);
        assert_eq!(config.session.sentence_cap, 30);
    }

    #[test]
    fn test_zero_cap_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[session]\nvocab_cap = 0\n").unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_remote_needs_http_url() {
        let mut config = Config::default();
        config.backend.mode = BackendMode::Remote;
        config.backend.api_base = "api.example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.storage.data_dir = Some(temp.path().join("data"));
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
