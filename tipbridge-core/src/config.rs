//! Configuration types shared between the server and the processors.
//!
//! The actual config loading/parsing is handled by the server crate.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Which ingress transport the bridge runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeMode {
    /// Long-lived connection to the provider's real-time push socket.
    Socket,
    /// Inbound webhook endpoint on the bridge's own HTTP server.
    Webhook,
}

impl std::fmt::Display for BridgeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeMode::Socket => write!(f, "socket"),
            BridgeMode::Webhook => write!(f, "webhook"),
        }
    }
}

/// Currency handling applied to every admitted donation.
#[derive(Debug, Clone)]
pub struct ForwardingPolicy {
    /// Currency every delivered tip is converted into.
    pub target_currency: CompactString,
    /// When set, donations in any other source currency are skipped
    /// before deduplication.
    pub forward_only_currency: Option<CompactString>,
}
