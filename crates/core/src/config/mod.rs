//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (TIERSCOPE_*)
//! 2. TOML config file (if TIERSCOPE_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! Request pacing and the cache TTL are fixed by the scheduler and cache
//! modules and are intentionally not part of this struct.

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
/// 1. Environment variables (TIERSCOPE_*)
/// 2. TOML config file (if TIERSCOPE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the player-ranking API.
    ///
    /// Set via TIERSCOPE_API_BASE_URL environment variable.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Avatar image URL template; `{id}` is replaced with the player id.
    ///
    /// Set via TIERSCOPE_AVATAR_URL_TEMPLATE environment variable.
    #[serde(default = "default_avatar_url_template")]
    pub avatar_url_template: String,

    /// Public profile page template; `{name}` is replaced with the player name.
    ///
    /// Set via TIERSCOPE_PROFILE_URL_TEMPLATE environment variable.
    #[serde(default = "default_profile_url_template")]
    pub profile_url_template: String,

    /// Path to the SQLite file backing the durable cache tier.
    ///
    /// Set via TIERSCOPE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via TIERSCOPE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via TIERSCOPE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Whether successful lookups warm the player's avatar image.
    ///
    /// Set via TIERSCOPE_WARM_AVATARS environment variable.
    #[serde(default = "default_true")]
    pub warm_avatars: bool,
}

fn default_api_base_url() -> String {
    "https://mctiers.com/api".into()
}

fn default_avatar_url_template() -> String {
    "https://render.crafty.gg/3d/bust/{id}".into()
}

fn default_profile_url_template() -> String {
    "https://mctiers.com/player/{name}".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./tierscope-cache.sqlite")
}

fn default_user_agent() -> String {
    "tierscope/0.1".into()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            avatar_url_template: default_avatar_url_template(),
            profile_url_template: default_profile_url_template(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            warm_avatars: true,
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
    /// 1. Environment variables prefixed with `TIERSCOPE_`
    /// 2. TOML file from `TIERSCOPE_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("TIERSCOPE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("TIERSCOPE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
