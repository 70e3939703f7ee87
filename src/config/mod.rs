//! Configuration system for vpn-dashboard
//!
//! Loads configuration from TOML files and environment variables.

mod types;

pub use types::*;

use reqwest::Url;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;

/// Environment variable overriding `api.base_url`
pub const ENV_API_URL: &str = "VPN_DASHBOARD_API_URL";
/// Environment variable overriding `web.bind`
pub const ENV_BIND: &str = "VPN_DASHBOARD_BIND";
/// Environment variable overriding `logging.level`
pub const ENV_LOG: &str = "VPN_DASHBOARD_LOG";

/// Base URL used when none is configured
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000/";
/// Address the web UI binds to when none is configured
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main vpn-dashboard configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Gateway admin API
    pub api: ApiConfig,
    /// Local web UI
    pub web: WebConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match Self::load(path).await {
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Load configuration from a string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Self::from_raw(raw)
    }

    /// Convert from raw TOML config to validated config
    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            api: raw.api.unwrap_or_default().try_into()?,
            web: raw.web.unwrap_or_default().into(),
            logging: raw.logging.unwrap_or_default().try_into()?,
        })
    }

    /// Apply `VPN_DASHBOARD_*` environment overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api.base_url = validate_base_url(&url)?;
        }
        if let Some(bind) = lookup(ENV_BIND) {
            self.web.bind = bind;
        }
        if let Some(level) = lookup(ENV_LOG) {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vpn-dashboard")
            .join("config.toml")
    }

    /// Commented config file written by `init`
    pub fn template() -> &'static str {
        DEFAULT_CONFIG_TEMPLATE
    }
}

/// Gateway admin API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Absolute http(s) base URL, always ending in `/`
    pub base_url: String,
    /// Per-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: None,
        }
    }
}

/// Web UI configuration
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Address to bind to
    pub bind: String,
    /// Mark the session cookie `Secure` (only when served over HTTPS)
    pub secure_cookies: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            secure_cookies: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive
    pub level: String,
    /// Format: "json" or "pretty"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format
    Pretty,
    /// JSON format
    Json,
}

/// Check that a base URL is absolute http(s) and ends in `/`
pub fn validate_base_url(url: &str) -> Result<String, ConfigError> {
    parse_base_url(url).map(String::from)
}

/// Parse a base URL so that endpoint paths resolve beneath it
///
/// Query and fragment are dropped; the path always gains a trailing `/`.
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::Invalid(format!("API URL {}: {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid(format!(
            "API URL must use http or https: {}",
            raw
        )));
    }
    if url.cannot_be_a_base() || url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::Invalid(format!("API URL has no host: {}", raw)));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# vpn-dashboard configuration

[api]
# Base URL of the gateway admin API
base_url = "http://127.0.0.1:5000/"
# Per-request timeout in seconds (unset waits indefinitely)
# timeout_secs = 10

[web]
# Address the local dashboard listens on
bind = "127.0.0.1:8080"
# Set when the dashboard is served over HTTPS
secure_cookies = false

[logging]
level = "info"
# "pretty" or "json"
format = "pretty"
"#;
