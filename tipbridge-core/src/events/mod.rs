//! Event channels feeding the bridge's processors.
//!
//! # Event Flow
//!
//! 1. Ingress adapters (push-socket listener, webhook handler) enqueue
//!    `RawDonationEvent` -> `DonationProcessor`
//! 2. The pipeline emits `RateRefreshHint` -> `RateRefresher` when it
//!    observes a stale rate snapshot
//!
//! Raw events carry the unparsed provider payload; all interpretation
//! happens in the normalizer, on the consumer side.

pub mod channels;
pub mod types;

pub use channels::{
    DEFAULT_CHANNEL_BUFFER, RateRefreshHintReceiver, RateRefreshHintSender, RawDonationReceiver,
    RawDonationSender, rate_refresh_hint_channel, raw_donation_channel,
};

pub use types::{BatchReplySender, RateRefreshHint, RawDonationEvent, Transport};
