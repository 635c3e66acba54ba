use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LoroError, LoroResult};

/// Top-level configuration (loaded from loro.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoroConfig {
    pub storage: StorageConfig,
    pub vault: VaultConfig,
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage backend: "file" or "memory"
    pub backend: String,
    /// JSON file holding every namespaced key (file backend only)
    pub path: PathBuf,
    /// Prefix applied to every key before it reaches the backend
    pub namespace: String,
    /// Optional byte cap emulating a browser storage quota
    pub quota_bytes: Option<usize>,
}

/// Encrypted safety-plan vault configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Store key (without namespace) holding the encrypted blob
    pub key: String,
    /// PBKDF2-SHA256 iteration count for new blobs (default: 200000)
    pub iterations: u32,
    /// Minimum passphrase length enforced when saving (default: 4)
    pub min_passphrase_len: usize,
}

/// Reflection proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (default: 127.0.0.1:8787)
    pub listen: String,
    /// Chat model name passed upstream
    pub model: String,
    /// OpenAI-compatible API base URL
    pub api_base: String,
    /// Sampling temperature for reflections
    pub temperature: f32,
    /// Upstream request timeout in seconds
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the reflection proxy used by `loro reflect`
    pub reflect_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "file".into(),
            path: PathBuf::from("~/.local/share/loro/storage.json"),
            namespace: "loro:".into(),
            quota_bytes: None,
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            key: "safetyplan:vault".into(),
            iterations: 200_000,
            min_passphrase_len: 4,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8787".into(),
            model: "gpt-4o-mini".into(),
            api_base: "https://api.openai.com/v1".into(),
            temperature: 0.4,
            request_timeout_secs: 30,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            reflect_url: "http://localhost:8787".into(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl LoroConfig {
    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: &Path) -> LoroResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| LoroError::Config(format!("parsing {}: {e}", path.display())))
    }

    pub fn parse(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}

/// Default config file location: `$XDG_CONFIG_HOME/loro/config.toml`
pub fn default_config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        })
        .join("loro")
        .join("config.toml")
}

/// Expand `~` in path to the user's home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    match s.strip_prefix("~/") {
        Some(rest) => {
            let home = std::env::var("HOME").unwrap_or_default();
            PathBuf::from(home).join(rest)
        }
        None => path.to_path_buf(),
    }
}
