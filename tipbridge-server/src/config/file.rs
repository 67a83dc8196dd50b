//! TOML file configuration structures.
//!
//! These structs directly map to the `tipbridge.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tipbridge_core::config::BridgeMode;
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
    pub tips: TipsConfig,
    /// Required in socket mode.
    #[serde(default)]
    pub source: Option<SourceConfig>,
    #[serde(default)]
    pub rates: RatesConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:3000").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    "0.0.0.0:3000".parse().expect("valid default address")
}

/// Bridge behavior section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Ingress transport: `socket` or `webhook`.
    #[serde(default = "default_mode")]
    pub mode: BridgeMode,
    /// Currency tips are converted into before delivery.
    #[serde(default = "default_target_currency")]
    pub target_currency: String,
    /// When set, donations in any other source currency are skipped.
    #[serde(default)]
    pub forward_only_currency: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            target_currency: default_target_currency(),
            forward_only_currency: None,
        }
    }
}

fn default_mode() -> BridgeMode {
    BridgeMode::Socket
}

fn default_target_currency() -> String {
    "USD".to_string()
}

/// Downstream tip API section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TipsConfig {
    /// Root URL of the tip-recording API.
    pub api_url: Url,
    /// Account the tips are recorded under.
    pub account_id: String,
}

/// Push-socket source section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// WebSocket URL of the provider's real-time event channel. The auth
    /// token from the environment is appended as a query parameter.
    pub socket_url: Url,
}

/// Exchange-rate source section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatesConfig {
    /// Root URL of the exchange-rate API.
    #[serde(default = "default_rates_url")]
    pub api_url: Url,
    /// Base currency the table is anchored to; also the assumed currency of
    /// events that carry none.
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// Snapshot age beyond which the pipeline hints for an early refresh.
    #[serde(default = "default_stale_after")]
    pub stale_after_secs: u64,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            api_url: default_rates_url(),
            base_currency: default_base_currency(),
            refresh_interval_secs: default_refresh_interval(),
            stale_after_secs: default_stale_after(),
        }
    }
}

fn default_rates_url() -> Url {
    Url::parse("https://api.frankfurter.dev/v1/").expect("valid default url")
}

fn default_base_currency() -> String {
    "THB".to_string()
}

fn default_refresh_interval() -> u64 {
    900
}

fn default_stale_after() -> u64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:8080"

[bridge]
mode = "webhook"
target_currency = "USD"
forward_only_currency = "THB"

[tips]
api_url = "https://tips.example.com/v2/"
account_id = "acct-123"

[source]
socket_url = "wss://events.example.com/socket"

[rates]
api_url = "https://rates.example.com/v1/"
base_currency = "THB"
refresh_interval_secs = 600
stale_after_secs = 1800
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 8080);
        assert_eq!(config.bridge.mode, BridgeMode::Webhook);
        assert_eq!(config.bridge.forward_only_currency.as_deref(), Some("THB"));
        assert_eq!(config.tips.account_id, "acct-123");
        assert!(config.source.is_some());
        assert_eq!(config.rates.refresh_interval_secs, 600);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let toml_str = r#"
[tips]
api_url = "https://tips.example.com/v2/"
account_id = "acct-123"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.bridge.mode, BridgeMode::Socket);
        assert_eq!(config.bridge.target_currency, "USD");
        assert_eq!(config.rates.base_currency, "THB");
        assert_eq!(config.rates.refresh_interval_secs, 900);
        assert!(config.source.is_none());
    }
}
