//! Event type definitions.

use serde_json::Value;
use tokio::sync::oneshot;

use crate::processors::pipeline::BatchReport;

/// Ingress transport a raw event arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Socket,
    Webhook,
}

impl Transport {
    /// Origin tag attached to delivered tips.
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Socket => "socket",
            Transport::Webhook => "webhook",
        }
    }
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reply handle for ingress adapters that need the batch outcome back
/// (the webhook handler answers its HTTP request from it).
pub type BatchReplySender = oneshot::Sender<BatchReport>;

/// One raw inbound payload, queued for the donation processor.
///
/// The payload is the provider's JSON as received; interpretation is the
/// normalizer's job.
pub struct RawDonationEvent {
    pub transport: Transport,
    pub payload: Value,
    /// Present when the ingress adapter wants the batch outcome back.
    pub reply: Option<BatchReplySender>,
}

impl RawDonationEvent {
    /// Fire-and-forget event (socket path).
    pub fn new(transport: Transport, payload: Value) -> Self {
        Self {
            transport,
            payload,
            reply: None,
        }
    }

    /// Event paired with a receiver for its batch outcome (webhook path).
    pub fn with_reply(
        transport: Transport,
        payload: Value,
    ) -> (Self, oneshot::Receiver<BatchReport>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                transport,
                payload,
                reply: Some(tx),
            },
            rx,
        )
    }
}

/// Hint that the pipeline observed a stale rate table.
#[derive(Debug, Clone, Copy)]
pub struct RateRefreshHint;
