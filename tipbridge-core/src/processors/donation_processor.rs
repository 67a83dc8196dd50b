//! Single-consumer run loop draining the raw event queue.

use tokio::sync::watch;
use tracing::{debug, info};

use crate::events::{RawDonationEvent, RawDonationReceiver};
use crate::processors::forwarder::TipSink;
use crate::processors::pipeline::Pipeline;

/// Drains raw donation events one at a time, preserving arrival order.
///
/// Ingress adapters only enqueue; every donation is processed to completion
/// (including its whole fallback chain) before the next event is taken, so
/// the identity cache never races with an in-flight delivery.
pub struct DonationProcessor<S> {
    pipeline: Pipeline<S>,
    raw_rx: RawDonationReceiver,
    shutdown_rx: watch::Receiver<bool>,
}

impl<S: TipSink> DonationProcessor<S> {
    pub fn new(
        pipeline: Pipeline<S>,
        raw_rx: RawDonationReceiver,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            pipeline,
            raw_rx,
            shutdown_rx,
        }
    }

    /// Run the DonationProcessor.
    pub async fn run(mut self) {
        info!("donation processor started");

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("donation processor received shutdown signal");
                        break;
                    }
                }

                Some(event) = self.raw_rx.recv() => {
                    debug!(transport = %event.transport, "received raw donation event");
                    let report = self.pipeline.process(event.transport, &event.payload).await;
                    if let Some(reply) = event.reply {
                        // Receiver may have given up (e.g. the HTTP request
                        // timed out); nothing to do then.
                        let _ = reply.send(report);
                    }
                }

                else => {
                    info!("raw donation channel closed");
                    break;
                }
            }
        }

        info!("donation processor shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use compact_str::CompactString;
    use serde_json::json;
    use tokio::sync::Mutex;

    use crate::config::ForwardingPolicy;
    use crate::events::{Transport, rate_refresh_hint_channel, raw_donation_channel};
    use crate::normalize::Normalizer;
    use crate::processors::forwarder::Forwarder;
    use crate::rates::{RateStore, RateTable};
    use tipbridge_sdk::client::ClientError;
    use tipbridge_sdk::objects::tips::{TipPayload, TipRecord};

    struct CountingSink {
        count: Mutex<u32>,
    }

    #[async_trait]
    impl TipSink for CountingSink {
        async fn post_tip(&self, _payload: &TipPayload) -> Result<TipRecord, ClientError> {
            let mut count = self.count.lock().await;
            *count += 1;
            Ok(TipRecord {
                id: format!("tip-{count}"),
            })
        }
    }

    #[tokio::test]
    async fn test_processor_replies_and_shuts_down() {
        let (hint_tx, _hint_rx) = rate_refresh_hint_channel();
        let pipeline = Pipeline::new(
            Normalizer::new(CompactString::from("THB")),
            Forwarder::new(CountingSink {
                count: Mutex::new(0),
            }),
            RateStore::new(RateTable::bootstrap(
                CompactString::from("THB"),
                CompactString::from("USD"),
                time::OffsetDateTime::now_utc(),
            )),
            ForwardingPolicy {
                target_currency: CompactString::from("USD"),
                forward_only_currency: None,
            },
            time::Duration::seconds(3600),
            hint_tx,
        );

        let (raw_tx, raw_rx) = raw_donation_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(DonationProcessor::new(pipeline, raw_rx, shutdown_rx).run());

        let body = json!({"name": "Alice", "amount": 100, "currency": "THB"});
        let (event, report_rx) = RawDonationEvent::with_reply(Transport::Webhook, body);
        raw_tx.send(event).await.unwrap();

        let report = report_rx.await.unwrap();
        assert_eq!(report.delivered(), 1);
        assert!(!report.has_failures());

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
