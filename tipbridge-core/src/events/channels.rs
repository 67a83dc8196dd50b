//! Event channel factories and handles.

use super::types::{RateRefreshHint, RawDonationEvent};
use tokio::sync::mpsc;

/// Default buffer size for event channels.
///
/// Enough to absorb bursts from the push socket while keeping memory
/// bounded.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for RawDonationEvent events.
pub type RawDonationSender = mpsc::Sender<RawDonationEvent>;
/// Receiver handle for RawDonationEvent events.
pub type RawDonationReceiver = mpsc::Receiver<RawDonationEvent>;

/// Sender handle for RateRefreshHint events.
pub type RateRefreshHintSender = mpsc::Sender<RateRefreshHint>;
/// Receiver handle for RateRefreshHint events.
pub type RateRefreshHintReceiver = mpsc::Receiver<RateRefreshHint>;

/// Create the raw donation event channel feeding the donation processor.
///
/// Every ingress adapter gets a clone of the sender; the single receiver
/// belongs to the `DonationProcessor`.
pub fn raw_donation_channel() -> (RawDonationSender, RawDonationReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Create the staleness-hint channel feeding the rate refresher.
///
/// Deliberately tiny: hints are redundant and dropping excess ones is
/// harmless.
pub fn rate_refresh_hint_channel() -> (RateRefreshHintSender, RateRefreshHintReceiver) {
    mpsc::channel(4)
}
