//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_prefix` or `cache_version` is empty or contains whitespace
    /// - `origin` is not an http(s) URL
    /// - `api_host`, `image_host` or `user_agent` is empty
    /// - a `precache` entry is not root-relative, or is protocol-relative (`//host`)
    /// - a `stale_origin_markers` entry is empty
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("cache_prefix", &self.cache_prefix), ("cache_version", &self.cache_version)] {
            if value.is_empty() {
                return Err(invalid(field, "must not be empty"));
            }
            if value.chars().any(char::is_whitespace) {
                return Err(invalid(field, "must not contain whitespace"));
            }
        }

        match url::Url::parse(&self.origin) {
            Ok(origin) if matches!(origin.scheme(), "http" | "https") => {}
            Ok(_) => return Err(invalid("origin", "scheme must be http or https")),
            Err(e) => return Err(invalid("origin", &e.to_string())),
        }

        if self.api_host.is_empty() {
            return Err(invalid("api_host", "must not be empty"));
        }
        if self.image_host.is_empty() {
            return Err(invalid("image_host", "must not be empty"));
        }
        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        let off_origin = |p: &&String| !p.starts_with('/') || p.starts_with("//") || p.starts_with("/\\");
        if let Some(path) = self.precache.iter().find(off_origin) {
            return Err(ConfigError::Invalid {
                field: "precache".into(),
                reason: format!("'{path}' must be a root-relative path on the app origin"),
            });
        }

        if self.stale_origin_markers.iter().any(String::is_empty) {
            return Err(invalid("stale_origin_markers", "entries must not be empty"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.precache.is_empty() {
            tracing::warn!("precache manifest is empty; offline navigation will only see pages visited online");
        }

        Ok(())
    }
}
