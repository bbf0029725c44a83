//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration for studymate
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Remote backend addressing
    #[serde(default)]
    pub backend: BackendConfig,
    /// Session behaviour
    #[serde(default)]
    pub session: SessionConfig,
    /// Client-local storage
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Prefix for chat, reset, health and status requests
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Absolute base for document uploads. Uploads fall back to `api_base` when unset.
    #[serde(default = "default_upload_base")]
    pub upload_base: Option<String>,
    /// Per-request timeout in seconds. No timeout when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_api_base() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_upload_base() -> Option<String> {
    Some("http://localhost:8000".to_string())
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            upload_base: default_upload_base(),
            timeout_secs: None,
        }
    }
}

impl BackendConfig {
    /// Base address actually used for uploads
    pub fn effective_upload_base(&self) -> &str {
        self.upload_base
            .as_deref()
            .filter(|base| !base.trim().is_empty())
            .unwrap_or(&self.api_base)
    }
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum number of remembered document names
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
    /// Send prior user/assistant turns as `chat_history`
    #[serde(default)]
    pub include_history: bool,
    /// Buffer size of the notification channel
    #[serde(default = "default_notification_capacity")]
    pub notification_capacity: usize,
}

fn default_recent_limit() -> usize {
    10
}

fn default_notification_capacity() -> usize {
    32
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            recent_limit: default_recent_limit(),
            include_history: false,
            notification_capacity: default_notification_capacity(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the key-value store file
    #[serde(default = "default_storage_dir")]
    pub dir: String,
}

fn default_storage_dir() -> String {
    "~/.studymate/data".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Directory for log files
    #[serde(default = "default_log_dir")]
    pub dir: String,
    /// Module-specific overrides
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_dir() -> String {
    "~/.studymate/logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            dir: default_log_dir(),
            overrides: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_base_falls_back_to_api_base() {
        let mut backend = BackendConfig::default();
        assert_eq!(backend.effective_upload_base(), "http://localhost:8000");

        backend.upload_base = None;
        assert_eq!(backend.effective_upload_base(), "http://localhost:8080/api");

        backend.upload_base = Some("  ".to_string());
        assert_eq!(backend.effective_upload_base(), "http://localhost:8080/api");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"session":{"include_history":true}}"#).unwrap();
        assert!(config.session.include_history);
        assert_eq!(config.session.recent_limit, 10);
        assert_eq!(config.backend.api_base, "http://localhost:8080/api");
    }
}
