//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (OTAKU_SW_*)
//! 2. TOML config file (if OTAKU_SW_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod partitions;
mod validation;

pub use partitions::{PartitionSet, Purpose};
pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (OTAKU_SW_*)
/// 2. TOML config file (if OTAKU_SW_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Prefix shared by every cache partition name.
    ///
    /// Set via OTAKU_SW_CACHE_PREFIX environment variable.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Version segment of the partition names. Bumping it rotates every
    /// partition on the next activation.
    ///
    /// Set via OTAKU_SW_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Origin of the app shell. Precache paths resolve against it and
    /// notification clicks look for windows on it.
    ///
    /// Set via OTAKU_SW_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Hostname of the anime catalog API (exact match).
    ///
    /// Set via OTAKU_SW_API_HOST environment variable.
    #[serde(default = "default_api_host")]
    pub api_host: String,

    /// Hostname of the image CDN (substring match).
    ///
    /// Set via OTAKU_SW_IMAGE_HOST environment variable.
    #[serde(default = "default_image_host")]
    pub image_host: String,

    /// Root-relative paths fetched and stored on install.
    ///
    /// Set via OTAKU_SW_PRECACHE environment variable (`[a,b]` syntax).
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// URL substrings purged from the API partition on activation.
    ///
    /// Set via OTAKU_SW_STALE_ORIGIN_MARKERS environment variable.
    #[serde(default = "default_stale_origin_markers")]
    pub stale_origin_markers: Vec<String>,

    /// Path to SQLite cache storage.
    ///
    /// Set via OTAKU_SW_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for outbound requests.
    ///
    /// Set via OTAKU_SW_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Transport timeout in milliseconds. The router applies none of its own.
    ///
    /// Set via OTAKU_SW_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Defaults applied to push notifications.
    ///
    /// Set via OTAKU_SW_NOTIFICATIONS__* environment variables.
    #[serde(default)]
    pub notifications: NotificationDefaults,
}

/// Defaults for notifications whose payload leaves fields out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDefaults {
    #[serde(default = "default_title")]
    pub default_title: String,
    #[serde(default = "default_body")]
    pub default_body: String,
    #[serde(default = "default_tag")]
    pub default_tag: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default = "default_icon")]
    pub badge: String,
}

fn default_cache_prefix() -> String {
    "otakudb".into()
}

fn default_cache_version() -> String {
    "v1".into()
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_api_host() -> String {
    "api.jikan.moe".into()
}

fn default_image_host() -> String {
    "cdn.myanimelist.net".into()
}

fn default_precache() -> Vec<String> {
    ["/", "/index.html", "/manifest.json", "/icon-192.png", "/icon-512.png"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_stale_origin_markers() -> Vec<String> {
    vec!["localhost:4000".into()]
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./otaku-sw-cache.sqlite")
}

fn default_user_agent() -> String {
    "otaku-sw/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_title() -> String {
    "OtakuDB".into()
}

fn default_body() -> String {
    "Nouvel épisode disponible !".into()
}

fn default_tag() -> String {
    "otakudb-notification".into()
}

fn default_icon() -> String {
    "/icon-192.png".into()
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            default_title: default_title(),
            default_body: default_body(),
            default_tag: default_tag(),
            icon: default_icon(),
            badge: default_icon(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            origin: default_origin(),
            api_host: default_api_host(),
            image_host: default_image_host(),
            precache: default_precache(),
            stale_origin_markers: default_stale_origin_markers(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            notifications: NotificationDefaults::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The partition names valid for this configuration.
    pub fn partitions(&self) -> PartitionSet {
        PartitionSet::new(&self.cache_prefix, &self.cache_version)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `OTAKU_SW_`
    /// 2. TOML file from `OTAKU_SW_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("OTAKU_SW_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("OTAKU_SW_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.cache_prefix, "otakudb");
        assert_eq!(config.cache_version, "v1");
        assert_eq!(config.api_host, "api.jikan.moe");
        assert_eq!(config.image_host, "cdn.myanimelist.net");
        assert_eq!(config.precache.len(), 5);
        assert_eq!(config.precache[0], "/");
        assert_eq!(config.stale_origin_markers, vec!["localhost:4000".to_string()]);
        assert_eq!(config.db_path, PathBuf::from("./otaku-sw-cache.sqlite"));
        assert_eq!(config.user_agent, "otaku-sw/0.1");
        assert_eq!(config.notifications.default_tag, "otakudb-notification");
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_partitions_follow_version() {
        let config = AppConfig { cache_version: "v2".into(), ..Default::default() };
        let partitions = config.partitions();
        assert_eq!(partitions.name(Purpose::Api), "otakudb-api-v2");
    }

    #[test]
    fn test_toml_layer_overrides_defaults() {
        let figment = Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string(
            r#"
            cache_version = "v7"
            stale_origin_markers = ["localhost:4000", "127.0.0.1:4000"]

            [notifications]
            default_title = "Otaku"
            "#,
        ));
        let config: AppConfig = figment.extract().unwrap();
        assert_eq!(config.cache_version, "v7");
        assert_eq!(config.stale_origin_markers.len(), 2);
        assert_eq!(config.notifications.default_title, "Otaku");
        assert_eq!(config.notifications.default_tag, "otakudb-notification");
        assert_eq!(config.api_host, "api.jikan.moe");
    }
}
