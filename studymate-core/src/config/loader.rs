//! Configuration loading and management

use super::schema::Config;
use super::validate::validate_config;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::warn;

const CONFIG_FILE: &str = "config.json";
const ENV_PREFIX: &str = "STUDYMATE__";

/// Configuration loader
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// Create a new config loader with the default config directory
    pub fn new() -> Self {
        let config_dir = dirs::home_dir()
            .map(|h| h.join(".studymate"))
            .unwrap_or_else(|| PathBuf::from(".studymate"));

        Self { config_dir }
    }

    /// Create a new config loader with a custom config directory
    pub fn with_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            config_dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Load configuration from file and environment
    pub fn load(&self) -> crate::Result<Config> {
        let config_path = self.config_dir.join(CONFIG_FILE);
        let mut merged = serde_json::to_value(Config::default())?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let file_value: Value = serde_json::from_str(&content)?;
            merge_values(&mut merged, file_value);
        }

        apply_alias_overrides(&mut merged);
        apply_path_overrides(&mut merged);

        let config: Config = serde_json::from_value(merged)?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config: &Config) -> crate::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        let config_path = self.config_dir.join(CONFIG_FILE);
        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                if let Some(existing) = base_map.get_mut(&key) {
                    merge_values(existing, value);
                } else {
                    base_map.insert(key, value);
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

fn parse_env_value(raw: &str) -> Value {
    if let Ok(v) = serde_json::from_str::<Value>(raw) {
        return v;
    }
    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::String(raw.to_string())
}

/// Write `value` at `path` below `target`, replacing non-object parents
fn insert_at(target: &mut Value, path: &[&str], value: Value) {
    let Some((head, rest)) = path.split_first() else {
        *target = value;
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(map) = target {
        let child = map.entry(head.to_string()).or_insert(Value::Null);
        insert_at(child, rest, value);
    }
}

fn apply_alias_overrides(config: &mut Value) {
    let aliases = [
        ("STUDYMATE_API_BASE", ["backend", "api_base"]),
        ("STUDYMATE_UPLOAD_BASE", ["backend", "upload_base"]),
    ];

    for (env_key, path) in aliases {
        if let Ok(value) = std::env::var(env_key) {
            insert_at(config, &path, Value::String(value));
        }
    }
}

/// `STUDYMATE__SECTION__FIELD[__KEY]` sets a field inside a section.
/// Keys naming only a section are ignored.
fn apply_path_overrides(config: &mut Value) {
    for (key, raw) in std::env::vars() {
        let Some(suffix) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let lowered = suffix.to_ascii_lowercase();
        let path: Vec<&str> = lowered.split("__").filter(|s| !s.is_empty()).collect();
        if path.len() < 2 {
            warn!("Ignoring {}: expected STUDYMATE__SECTION__FIELD", key);
            continue;
        }
        insert_at(config, &path, parse_env_value(&raw));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::sync::Mutex;
    use tempfile::TempDir;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    /// Load from an empty directory with `vars` set for the duration of the call
    fn load_with_env(vars: &[(&str, &str)]) -> crate::Result<Config> {
        let temp_dir = TempDir::new().unwrap();
        load_dir_with_env(temp_dir.path(), vars)
    }

    fn load_dir_with_env(dir: &Path, vars: &[(&str, &str)]) -> crate::Result<Config> {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let saved: Vec<(&str, Option<String>)> =
            vars.iter().map(|(k, _)| (*k, std::env::var(k).ok())).collect();
        for (key, value) in vars {
            // SAFETY: env mutation is serialized by ENV_LOCK
            unsafe { std::env::set_var(key, value) };
        }

        let result = ConfigLoader::with_dir(dir).load();

        for (key, previous) in saved {
            match previous {
                // SAFETY: env mutation is serialized by ENV_LOCK
                Some(value) => unsafe { std::env::set_var(key, value) },
                None => unsafe { std::env::remove_var(key) },
            }
        }
        result
    }

    #[test]
    fn test_load_default_config() {
        let config = load_with_env(&[]).unwrap();

        assert_eq!(config.session.recent_limit, 10);
        assert!(!config.session.include_history);
        assert!(config.backend.timeout_secs.is_none());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.backend.api_base = "http://backend.test/api".to_string();
        config.session.recent_limit = 5;

        ConfigLoader::with_dir(temp_dir.path()).save(&config).unwrap();
        let loaded = load_dir_with_env(temp_dir.path(), &[]).unwrap();

        assert_eq!(loaded.backend.api_base, "http://backend.test/api");
        assert_eq!(loaded.session.recent_limit, 5);
    }

    #[test]
    fn test_load_applies_alias_env_overrides() {
        let config = load_with_env(&[
            ("STUDYMATE_API_BASE", "http://10.0.0.2:8000"),
            ("STUDYMATE_UPLOAD_BASE", "http://10.0.0.3:8000"),
        ])
        .unwrap();

        assert_eq!(config.backend.api_base, "http://10.0.0.2:8000");
        assert_eq!(
            config.backend.upload_base.as_deref(),
            Some("http://10.0.0.3:8000")
        );
    }

    #[test]
    fn test_load_applies_path_env_overrides() {
        let config = load_with_env(&[
            ("STUDYMATE__SESSION__INCLUDE_HISTORY", "true"),
            ("STUDYMATE__SESSION__RECENT_LIMIT", "3"),
            ("STUDYMATE__BACKEND__TIMEOUT_SECS", "30"),
            ("STUDYMATE__BACKEND__UPLOAD_BASE", "null"),
            ("STUDYMATE__LOGGING__OVERRIDES__HYPER", "warn"),
        ])
        .unwrap();

        assert!(config.session.include_history);
        assert_eq!(config.session.recent_limit, 3);
        assert_eq!(config.backend.timeout_secs, Some(30));
        assert!(config.backend.upload_base.is_none());
        assert_eq!(
            config.logging.overrides.get("hyper").map(String::as_str),
            Some("warn")
        );
    }

    #[test]
    fn test_section_only_override_is_ignored() {
        let config = load_with_env(&[("STUDYMATE__SESSION", "5")]).unwrap();
        assert_eq!(config.session.recent_limit, 10);
    }

    #[test]
    fn test_path_env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILE),
            r#"{"backend":{"api_base":"http://from-file/api"}}"#,
        )
        .unwrap();

        let config = load_dir_with_env(
            temp_dir.path(),
            &[("STUDYMATE__BACKEND__API_BASE", "http://from-env/api")],
        )
        .unwrap();
        assert_eq!(config.backend.api_base, "http://from-env/api");
    }

    #[test]
    fn test_validation_rejects_zero_recent_limit() {
        let err = load_with_env(&[("STUDYMATE__SESSION__RECENT_LIMIT", "0")]).unwrap_err();
        assert!(err.to_string().contains("session.recent_limit"));
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(CONFIG_FILE), "{not json").unwrap();

        let err = load_dir_with_env(temp_dir.path(), &[]).unwrap_err();
        assert!(matches!(err, crate::Error::Serialization(_)));
    }

    #[test]
    fn test_insert_at_replaces_scalar_parents() {
        let mut root = serde_json::json!({"backend": "oops"});
        insert_at(&mut root, &["backend", "api_base"], Value::from("http://x"));
        assert_eq!(root, serde_json::json!({"backend": {"api_base": "http://x"}}));
    }
}
