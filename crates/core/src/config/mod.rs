//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (HTTPCACHE_*)
//! 2. TOML config file (if HTTPCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (HTTPCACHE_*)
/// 2. TOML config file (if HTTPCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the cache index and content files.
    ///
    /// Set via HTTPCACHE_CACHE_DIR environment variable.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Part of the cache identity: changing it starts a separate set of entries.
    /// Set via HTTPCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via HTTPCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of redirects the transport follows.
    ///
    /// Set via HTTPCACHE_MAX_REDIRECTS environment variable.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// URLs fetched by the sync driver.
    ///
    /// Set via HTTPCACHE_URLS environment variable (`["https://a", "https://b"]`).
    #[serde(default)]
    pub urls: Vec<String>,

    /// Wipe the cache directory before opening it.
    ///
    /// Set via HTTPCACHE_RESET_CACHE environment variable.
    #[serde(default)]
    pub reset_cache: bool,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./httpcache")
}

fn default_user_agent() -> String {
    "httpcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_redirects() -> usize {
    5
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_redirects: default_max_redirects(),
            urls: Vec::new(),
            reset_cache: false,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `HTTPCACHE_`
    /// 2. TOML file from `HTTPCACHE_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("HTTPCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("HTTPCACHE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// URLs to sync, failing when none are configured.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `urls` is empty.
    pub fn require_urls(&self) -> Result<&[String], ConfigError> {
        if self.urls.is_empty() {
            return Err(ConfigError::Missing {
                field: "urls".into(),
                hint: "Set HTTPCACHE_URLS or add `urls = [...]` to the config file".into(),
            });
        }
        Ok(&self.urls)
    }
}
