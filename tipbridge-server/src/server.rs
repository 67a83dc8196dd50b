//! Axum server setup and router configuration.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::shutdown::shutdown_signal;
use crate::state::AppState;
use tipbridge_core::events::{RawDonationEvent, Transport};

/// Build the main application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health endpoint
        .route("/", get(health))
        // Inbound donation webhook
        .route("/webhook/donations", post(webhook_donation))
        // Add state to all routes
        .with_state(state)
}

/// `GET /` – plain-text liveness and operating mode. No side effects.
async fn health(State(state): State<AppState>) -> String {
    format!("Tip bridge running. MODE={}", state.mode)
}

/// `POST /webhook/donations` – inbound donation webhook.
///
/// The body is queued for the donation processor and the response reflects
/// the actual batch outcome: `200 {"ok":true}` unless some delivery
/// exhausted its whole fallback chain.
async fn webhook_donation(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let (event, report_rx) = RawDonationEvent::with_reply(Transport::Webhook, body);

    if state.events.send(event).await.is_err() {
        return error_response("event queue closed");
    }

    match report_rx.await {
        Ok(report) => match report.error_summary() {
            None => (StatusCode::OK, Json(json!({ "ok": true }))),
            Some(error) => error_response(&error),
        },
        Err(_) => error_response("donation processor dropped the event"),
    }
}

fn error_response(error: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "ok": false, "error": error })),
    )
}

/// Run the server with graceful shutdown support.
pub async fn run_server(router: Router, addr: SocketAddr) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}
