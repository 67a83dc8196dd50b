//! Inbound push-socket event shapes.

use serde::Deserialize;
use serde_json::Value;

/// Event type tag that marks a donation envelope.
pub const DONATION_EVENT_TYPE: &str = "donation";

/// Envelope delivered on the real-time push socket.
///
/// Only the `type` tag and the `message` payload are contractual. Depending
/// on the provider version `message` is either a single donation object or
/// an array of them, and the entries alias their fields under several names,
/// so they are kept as raw JSON for the normalizer.
#[derive(Debug, Clone, Deserialize)]
pub struct SocketEnvelope {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: Value,
}

impl SocketEnvelope {
    /// Whether this envelope carries donation entries.
    pub fn is_donation(&self) -> bool {
        self.kind == DONATION_EVENT_TYPE
    }

    /// The donation entries, whether `message` was one object or an array.
    pub fn entries(self) -> Vec<Value> {
        match self.message {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            single => vec![single],
        }
    }
}
