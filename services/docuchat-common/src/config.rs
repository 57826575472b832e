//! Configuration, loaded from `~/.docuchat/config.json`.
//!
//! # Environment Variable Overrides
//!
//! The following environment variables override config file values:
//!
//! ## Server
//! - `DOCUCHAT_PORT` → server.port
//! - `DOCUCHAT_BIND_ADDRESS` → server.host
//!
//! ## Storage
//! - `DOCUCHAT_DATA_DIR` → storage.data_dir
//!
//! ## Observability
//! - `DOCUCHAT_LOG_LEVEL` → observability.log_level
//!
//! ## Gemini
//! - `GEMINI_API_KEY` (or `GOOGLE_API_KEY`) → gemini.api_key

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".docuchat"),
        |dirs| dirs.home_dir().join(".docuchat"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Server Configuration
// ============================================================================

/// HTTP server bind settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address. Default: "127.0.0.1" (local only).
    /// Set to "0.0.0.0" for remote access.
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    8000
}

// ============================================================================
// Gemini Configuration
// ============================================================================

/// Gemini API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key. Usually left unset here and supplied via `GEMINI_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model used for both context caching and generation
    #[serde(default = "default_model")]
    pub model: String,

    /// Time-to-live for created context caches, in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.5-flash".into()
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

// ============================================================================
// Storage Configuration
// ============================================================================

/// Flat-file storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `meetings.json`, `chats_<id>.json`, and
    /// `meeting_<id>.txt`. Tilde paths are expanded.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl StorageConfig {
    /// Resolved data directory with `~` expanded.
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.data_dir).as_ref())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> String {
    "data".into()
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration for DocuChat services.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Gemini API settings
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Flat-file storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration with environment variable fallbacks.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("DOCUCHAT_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }

        if let Ok(bind) = std::env::var("DOCUCHAT_BIND_ADDRESS") {
            self.server.host = bind;
        }

        if let Ok(dir) = std::env::var("DOCUCHAT_DATA_DIR") {
            self.storage.data_dir = dir;
        }

        if let Ok(level) = std::env::var("DOCUCHAT_LOG_LEVEL") {
            self.observability.log_level = level;
        }

        if let Ok(key) =
            std::env::var("GEMINI_API_KEY").or_else(|_| std::env::var("GOOGLE_API_KEY"))
        {
            self.gemini.api_key = Some(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        assert_eq!(config.gemini.cache_ttl_secs, 3600);
        assert!(config.gemini.api_key.is_none());
        assert_eq!(config.storage.data_dir, "data");
        assert_eq!(config.observability.log_level, "info");
        assert_eq!(config.observability.log_format, "pretty");
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.server.port, config.server.port);
        assert_eq!(parsed.gemini.model, config.gemini.model);
        assert_eq!(parsed.storage.data_dir, config.storage.data_dir);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: Config =
            serde_json::from_str(r#"{"server": {"port": 9000}, "gemini": {"model": "gemini-2.5-pro"}}"#)
                .unwrap();
        assert_eq!(parsed.server.port, 9000);
        assert_eq!(parsed.server.host, "127.0.0.1");
        assert_eq!(parsed.gemini.model, "gemini-2.5-pro");
        assert_eq!(parsed.gemini.cache_ttl_secs, 3600);
    }

    #[test]
    fn test_observability_aliases() {
        let parsed: Config =
            serde_json::from_str(r#"{"observability": {"level": "debug", "format": "json"}}"#)
                .unwrap();
        assert_eq!(parsed.observability.log_level, "debug");
        assert_eq!(parsed.observability.log_format, "json");
    }

    #[test]
    fn test_data_dir_relative_path_unchanged() {
        let storage = StorageConfig {
            data_dir: "data".into(),
        };
        assert_eq!(storage.data_dir(), PathBuf::from("data"));
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{"server": {"host": "0.0.0.0"}}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_load_from_rejects_bad_json() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
