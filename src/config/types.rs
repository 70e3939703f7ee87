//! Raw configuration types for TOML parsing

use super::*;
use serde::Deserialize;

/// Raw configuration as parsed from TOML
#[derive(Debug, Deserialize)]
pub struct RawConfig {
    pub api: Option<RawApiConfig>,
    pub web: Option<RawWebConfig>,
    pub logging: Option<RawLoggingConfig>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RawApiConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl TryFrom<RawApiConfig> for ApiConfig {
    type Error = ConfigError;

    fn try_from(raw: RawApiConfig) -> Result<Self, Self::Error> {
        let base_url = match raw.base_url {
            Some(url) => validate_base_url(&url)?,
            None => DEFAULT_API_URL.to_string(),
        };

        let timeout = match raw.timeout_secs {
            Some(0) => {
                return Err(ConfigError::Invalid(
                    "api.timeout_secs must be greater than zero".to_string(),
                ))
            }
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        Ok(Self { base_url, timeout })
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawWebConfig {
    pub bind: Option<String>,
    pub secure_cookies: Option<bool>,
}

impl From<RawWebConfig> for WebConfig {
    fn from(raw: RawWebConfig) -> Self {
        Self {
            bind: raw.bind.unwrap_or_else(|| DEFAULT_BIND.to_string()),
            secure_cookies: raw.secure_cookies.unwrap_or(false),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawLoggingConfig {
    pub level: Option<String>,
    pub format: Option<String>,
}

impl TryFrom<RawLoggingConfig> for LoggingConfig {
    type Error = ConfigError;

    fn try_from(raw: RawLoggingConfig) -> Result<Self, Self::Error> {
        let format = match raw.format.as_deref() {
            Some("pretty") | None => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid(format!(
                    "Unknown log format: {}",
                    other
                )))
            }
        };

        Ok(Self {
            level: raw.level.unwrap_or_else(|| "info".to_string()),
            format,
        })
    }
}
