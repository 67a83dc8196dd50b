//! Background refresh of the exchange-rate table.

use compact_str::CompactString;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::events::RateRefreshHintReceiver;
use crate::rates::{RateSource, RateStore, RateTable};

/// Periodically replaces the [`RateStore`] snapshot from the remote source.
///
/// Refreshes on a fixed interval (the first tick fires immediately, so a
/// fetch is attempted at startup) and additionally when the pipeline hints
/// that the current snapshot is stale. A failed fetch keeps the previous
/// table untouched; event processing is never blocked by a refresh.
pub struct RateRefresher<R> {
    source: R,
    store: RateStore,
    base: CompactString,
    interval: std::time::Duration,
    stale_after: time::Duration,
    hint_rx: RateRefreshHintReceiver,
    shutdown_rx: watch::Receiver<bool>,
}

impl<R: RateSource> RateRefresher<R> {
    pub fn new(
        source: R,
        store: RateStore,
        base: CompactString,
        interval: std::time::Duration,
        stale_after: time::Duration,
        hint_rx: RateRefreshHintReceiver,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            source,
            store,
            base,
            interval,
            stale_after,
            hint_rx,
            shutdown_rx,
        }
    }

    /// Run the RateRefresher.
    pub async fn run(mut self) {
        info!(base = %self.base, "rate refresher started");

        let mut ticker = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("rate refresher received shutdown signal");
                        break;
                    }
                }

                _ = ticker.tick() => {
                    self.refresh().await;
                }

                Some(_) = self.hint_rx.recv() => {
                    // Only act on a hint when the snapshot really is stale,
                    // so a burst of hints cannot hammer the rate source.
                    let table = self.store.current().await;
                    if table.is_stale(OffsetDateTime::now_utc(), self.stale_after) {
                        debug!("refreshing on staleness hint");
                        self.refresh().await;
                    }
                }
            }
        }

        info!("rate refresher shutdown complete");
    }

    async fn refresh(&self) {
        match self.source.fetch_latest(&self.base).await {
            Ok(resp) => {
                let table = RateTable::from_response(resp, OffsetDateTime::now_utc());
                let currencies = table.rates.len();
                let version = self.store.replace(table).await;
                info!(version, currencies, "rate table refreshed");
            }
            Err(err) => {
                warn!(error = %err, "rate refresh failed, keeping previous table");
            }
        }
    }
}
