//! Tip bridge server.
//!
//! Relays donation events from a live-streaming provider's real-time push
//! socket (or an inbound webhook) to a downstream tip-recording API, with
//! payload normalization, deduplication and currency conversion in between.

mod config;
mod server;
mod shutdown;
mod socket;
mod state;

use clap::Parser;
use compact_str::ToCompactString;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use config::{ConfigLoader, get_socket_token, get_tips_token};
use server::{build_router, run_server};
use socket::SocketListener;
use state::AppState;
use tipbridge_core::config::{BridgeMode, ForwardingPolicy};
use tipbridge_core::events::{raw_donation_channel, rate_refresh_hint_channel};
use tipbridge_core::normalize::Normalizer;
use tipbridge_core::processors::{DonationProcessor, Forwarder, Pipeline, RateRefresher};
use tipbridge_core::rates::{RateStore, RateTable};
use tipbridge_sdk::client::{RatesClient, TipsClient};

/// Tip bridge - relays streaming donations to a tip-recording API
#[derive(Parser, Debug)]
#[command(name = "tipbridge-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./tipbridge.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting tipbridge-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let loader = ConfigLoader::new(&args.config, args.listen);
    let config = loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded from {:?}", args.config);

    // Credentials come from the environment only; missing ones are fatal.
    let tips_token = get_tips_token().map_err(|e| {
        tracing::error!("{}", e);
        e
    })?;
    let socket_url = match config.bridge.mode {
        BridgeMode::Socket => {
            let token = get_socket_token().map_err(|e| {
                tracing::error!("MODE=socket but {}", e);
                e
            })?;
            let source = config
                .source
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("[source] section required in socket mode"))?;
            let mut url = source.socket_url.clone();
            url.query_pairs_mut().append_pair("token", &token);
            Some(url)
        }
        BridgeMode::Webhook => None,
    };

    let tips_client = TipsClient::new(
        config.tips.api_url.clone(),
        config.tips.account_id.clone(),
        tips_token,
    );
    let rates_client = RatesClient::new(config.rates.api_url.clone());

    let base_currency = config.rates.base_currency.to_compact_string();
    let target_currency = config.bridge.target_currency.to_compact_string();
    let stale_after = time::Duration::seconds(config.rates.stale_after_secs as i64);

    // Operable from the first event even if the rate source is down.
    let rate_store = RateStore::new(RateTable::bootstrap(
        base_currency.clone(),
        target_currency.clone(),
        time::OffsetDateTime::now_utc(),
    ));

    let (raw_tx, raw_rx) = raw_donation_channel();
    let (hint_tx, hint_rx) = rate_refresh_hint_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let refresher = RateRefresher::new(
        rates_client,
        rate_store.clone(),
        base_currency.clone(),
        std::time::Duration::from_secs(config.rates.refresh_interval_secs),
        stale_after,
        hint_rx,
        shutdown_rx.clone(),
    );
    let refresher_handle = tokio::spawn(refresher.run());

    let pipeline = Pipeline::new(
        Normalizer::new(base_currency),
        Forwarder::new(tips_client),
        rate_store,
        ForwardingPolicy {
            target_currency,
            forward_only_currency: config
                .bridge
                .forward_only_currency
                .as_deref()
                .map(|s| s.to_compact_string()),
        },
        stale_after,
        hint_tx,
    );
    let processor = DonationProcessor::new(pipeline, raw_rx, shutdown_rx.clone());
    let processor_handle = tokio::spawn(processor.run());

    let socket_handle = socket_url.map(|url| {
        tokio::spawn(SocketListener::new(url, raw_tx.clone(), shutdown_rx.clone()).run())
    });

    // Build the router
    let state = AppState {
        events: raw_tx,
        mode: config.bridge.mode,
    };
    let router = build_router(state);

    // Run the server
    tracing::info!(
        "Starting HTTP server on {} (MODE={})",
        config.server.listen,
        config.bridge.mode
    );
    let result = run_server(router, config.server.listen).await;

    // Stop the background tasks and wait for them to drain.
    let _ = shutdown_tx.send(true);
    let _ = processor_handle.await;
    let _ = refresher_handle.await;
    if let Some(handle) = socket_handle {
        let _ = handle.await;
    }

    tracing::info!("Server shutdown complete");
    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
