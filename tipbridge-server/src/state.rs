//! Application state shared across all request handlers.

use tipbridge_core::config::BridgeMode;
use tipbridge_core::events::RawDonationSender;

/// Application state that is shared across all request handlers.
///
/// Cloneable and cheap to pass around.
#[derive(Clone)]
pub struct AppState {
    /// Queue feeding the donation processor.
    pub events: RawDonationSender,
    /// Operating mode, reported by the health endpoint.
    pub mode: BridgeMode,
}
