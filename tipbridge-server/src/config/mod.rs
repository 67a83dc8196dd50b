//! Configuration loading for tipbridge-server.
//!
//! Structure comes from a TOML file with CLI overrides; credentials come
//! from the environment only and missing ones are fatal at startup.

pub mod file;

use crate::config::file::FileConfig;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tipbridge_core::config::BridgeMode;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("{0} environment variable not set")]
    MissingCredential(&'static str),
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Uppercase the currency codes
    /// 4. Validate the configuration
    pub fn load(&self) -> Result<FileConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            config.server.listen = listen;
        }

        config.bridge.target_currency = config.bridge.target_currency.to_uppercase();
        config.rates.base_currency = config.rates.base_currency.to_uppercase();
        if let Some(only) = config.bridge.forward_only_currency.as_mut() {
            *only = only.to_uppercase();
        }

        validate(&config)?;
        Ok(config)
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if config.tips.account_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "tips.account_id must not be empty".to_string(),
        ));
    }

    currency_code(&config.bridge.target_currency)?;
    currency_code(&config.rates.base_currency)?;
    if let Some(only) = &config.bridge.forward_only_currency {
        currency_code(only)?;
    }

    if config.rates.refresh_interval_secs == 0 {
        return Err(ConfigError::Validation(
            "rates.refresh_interval_secs must be positive".to_string(),
        ));
    }

    if config.bridge.mode == BridgeMode::Socket && config.source.is_none() {
        return Err(ConfigError::Validation(
            "[source] section with socket_url is required in socket mode".to_string(),
        ));
    }

    Ok(())
}

fn currency_code(code: &str) -> Result<(), ConfigError> {
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "invalid currency code: {code}"
        )))
    }
}

/// Bearer token for the tip API, from `TIPS_API_TOKEN`.
pub fn get_tips_token() -> Result<String, ConfigError> {
    std::env::var("TIPS_API_TOKEN").map_err(|_| ConfigError::MissingCredential("TIPS_API_TOKEN"))
}

/// Push-socket auth token, from `SOCKET_TOKEN` (required in socket mode).
pub fn get_socket_token() -> Result<String, ConfigError> {
    std::env::var("SOCKET_TOKEN").map_err(|_| ConfigError::MissingCredential("SOCKET_TOKEN"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_code_validation() {
        assert!(currency_code("USD").is_ok());
        assert!(currency_code("usd").is_ok());
        assert!(currency_code("US").is_err());
        assert!(currency_code("US1").is_err());
        assert!(currency_code("DOLLARS").is_err());
    }

    #[test]
    fn test_socket_mode_requires_source_section() {
        let config: FileConfig = toml::from_str(
            r#"
[bridge]
mode = "socket"

[tips]
api_url = "https://tips.example.com/v2/"
account_id = "acct-123"
"#,
        )
        .unwrap();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_webhook_mode_needs_no_source_section() {
        let config: FileConfig = toml::from_str(
            r#"
[bridge]
mode = "webhook"

[tips]
api_url = "https://tips.example.com/v2/"
account_id = "acct-123"
"#,
        )
        .unwrap();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_account_id_is_rejected() {
        let config: FileConfig = toml::from_str(
            r#"
[bridge]
mode = "webhook"

[tips]
api_url = "https://tips.example.com/v2/"
account_id = "  "
"#,
        )
        .unwrap();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }
}
