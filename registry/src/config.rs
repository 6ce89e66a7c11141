//! Runtime configuration, read from the environment.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {variable}: {value}")]
    InvalidValue { variable: String, value: String },
}

/// Registry process configuration.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Base URL of the records API. The in-memory backend ignores it.
    pub api_base_url: String,
    /// How long a dispatched command may take to settle.
    pub request_timeout: Duration,
    /// How long shutdown waits for in-flight effects.
    pub shutdown_timeout: Duration,
    /// Default tracing filter, overridden by `RUST_LOG`.
    pub log_level: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".to_string(),
            request_timeout: Duration::from_secs(10),
            shutdown_timeout: Duration::from_secs(5),
            log_level: "info".to_string(),
        }
    }
}

impl RegistryConfig {
    /// Read configuration from `REGISTRY_*` environment variables, keeping
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("REGISTRY_API_BASE_URL") {
            config.api_base_url = url;
        }
        if let Ok(raw) = std::env::var("REGISTRY_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(parse(&raw, "REGISTRY_REQUEST_TIMEOUT_SECS")?);
        }
        if let Ok(raw) = std::env::var("REGISTRY_SHUTDOWN_TIMEOUT_SECS") {
            config.shutdown_timeout =
                Duration::from_secs(parse(&raw, "REGISTRY_SHUTDOWN_TIMEOUT_SECS")?);
        }
        if let Ok(level) = std::env::var("REGISTRY_LOG_LEVEL") {
            config.log_level = level;
        }

        Ok(config)
    }
}

fn parse(raw: &str, variable: &str) -> Result<u64, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidValue {
        variable: variable.to_string(),
        value: raw.to_string(),
    })
}
