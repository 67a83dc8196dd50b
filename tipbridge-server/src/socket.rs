//! Push-socket listener.
//!
//! Maintains one long-lived WebSocket connection to the donation provider's
//! real-time event channel, ships every JSON text frame to the donation
//! processor as a raw event, and reconnects with capped exponential backoff
//! when the connection drops. Frames are never interpreted here.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use url::Url;

use tipbridge_core::events::{RawDonationEvent, RawDonationSender, Transport};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Reconnect backoff cap: 2^6 = 64 seconds.
const MAX_RECONNECT_EXP: u32 = 6;

/// Long-lived listener on the provider's push socket.
pub struct SocketListener {
    url: Url,
    events: RawDonationSender,
    shutdown_rx: watch::Receiver<bool>,
}

impl SocketListener {
    /// `url` must already carry the auth token query parameter.
    pub fn new(url: Url, events: RawDonationSender, shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            url,
            events,
            shutdown_rx,
        }
    }

    /// Run the SocketListener.
    pub async fn run(mut self) {
        info!("socket listener started");

        let mut attempt: u32 = 0;
        loop {
            if *self.shutdown_rx.borrow() {
                break;
            }

            match connect_async(self.url.as_str()).await {
                Ok((stream, _response)) => {
                    info!("socket connected");
                    attempt = 0;
                    if self.read_frames(stream).await {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "socket connect failed");
                }
            }

            attempt += 1;
            let delay = reconnect_delay(attempt);
            debug!(delay_secs = delay.as_secs(), "reconnecting after delay");

            tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        break;
                    }
                }

                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!("socket listener shutdown complete");
    }

    /// Read frames until the connection drops. Returns `true` when shutdown
    /// was requested.
    async fn read_frames(&mut self, mut stream: WsStream) -> bool {
        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        let _ = stream.close(None).await;
                        return true;
                    }
                }

                frame = stream.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => self.handle_text(&text).await,
                        Some(Ok(Message::Ping(data))) => {
                            let _ = stream.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!("socket disconnected");
                            return false;
                        }
                        // Binary and pong frames are not part of the contract.
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!(error = %e, "socket read error");
                            return false;
                        }
                    }
                }
            }
        }
    }

    async fn handle_text(&self, text: &str) {
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(payload) => {
                let event = RawDonationEvent::new(Transport::Socket, payload);
                if self.events.send(event).await.is_err() {
                    warn!("event queue closed, dropping socket frame");
                }
            }
            Err(e) => {
                debug!(error = %e, "ignoring non-JSON socket frame");
            }
        }
    }
}

/// Delay before the given reconnect attempt (2^attempt seconds, capped).
fn reconnect_delay(attempt: u32) -> std::time::Duration {
    let seconds = 2u64.pow(attempt.min(MAX_RECONNECT_EXP));
    std::time::Duration::from_secs(seconds)
}
