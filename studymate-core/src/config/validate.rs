//! Configuration validation rules.

use super::schema::Config;

fn is_http_url(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("http://") || value.starts_with("https://")
}

/// Validate configuration and return aggregated validation errors.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    if !is_http_url(&config.backend.api_base) {
        errors.push("backend.api_base must be an http(s) URL".to_string());
    }
    if let Some(upload_base) = &config.backend.upload_base {
        if !upload_base.trim().is_empty() && !is_http_url(upload_base) {
            errors.push("backend.upload_base must be an http(s) URL".to_string());
        }
    }
    if config.backend.timeout_secs == Some(0) {
        errors.push("backend.timeout_secs must be > 0 when set".to_string());
    }

    if config.session.recent_limit == 0 {
        errors.push("session.recent_limit must be > 0".to_string());
    }
    if config.session.notification_capacity == 0 {
        errors.push("session.notification_capacity must be > 0".to_string());
    }

    if config.storage.dir.trim().is_empty() {
        errors.push("storage.dir must not be empty".to_string());
    }

    let format = config.logging.format.to_ascii_lowercase();
    if format != "text" && format != "json" {
        errors.push(format!(
            "logging.format must be text or json, got {}",
            config.logging.format
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_defaults() {
        validate_config(&Config::default()).unwrap();
    }

    #[test]
    fn test_validate_rejects_non_http_bases() {
        let mut config = Config::default();
        config.backend.api_base = "/api".to_string();
        config.backend.upload_base = Some("localhost:8000".to_string());

        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("backend.api_base"));
        assert!(err.contains("backend.upload_base"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.backend.timeout_secs = Some(0);

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("backend.timeout_secs"));
    }

    #[test]
    fn test_validate_rejects_unknown_log_format() {
        let mut config = Config::default();
        config.logging.format = "yaml".to_string();

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("logging.format"));
    }
}
