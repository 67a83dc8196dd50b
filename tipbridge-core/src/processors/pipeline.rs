//! The per-event processing pipeline.
//!
//! normalize → policy filter → dedupe → convert → forward, run to
//! completion for each donation before the next one is taken.

use compact_str::CompactString;
use serde_json::Value;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::ForwardingPolicy;
use crate::convert::convert;
use crate::dedup::IdentityCache;
use crate::entities::CanonicalDonation;
use crate::events::{RateRefreshHint, RateRefreshHintSender, Transport};
use crate::normalize::Normalizer;
use crate::processors::forwarder::{Delivery, DeliveryError, Forwarder, TipSink};
use crate::rates::RateStore;

/// Outcome for one donation entry of a raw event.
#[derive(Debug)]
pub enum DonationOutcome {
    /// Delivered downstream (possibly via a fallback stage).
    Delivered(Delivery),
    /// Identity already seen inside the dedup window.
    Duplicate { identity: String },
    /// Skipped by the currency-forwarding policy.
    Filtered { currency: CompactString },
    /// Every delivery stage failed.
    Failed(DeliveryError),
}

/// Outcomes of every donation entry found in one raw event.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<DonationOutcome>,
}

impl BatchReport {
    pub fn delivered(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, DonationOutcome::Delivered(_)))
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.error_summary().is_some()
    }

    /// Short diagnostic line for callers that surface errors over HTTP.
    pub fn error_summary(&self) -> Option<String> {
        self.outcomes.iter().find_map(|o| match o {
            DonationOutcome::Failed(err) => Some(err.to_string()),
            _ => None,
        })
    }
}

/// Everything needed to take one raw payload to a delivered tip.
pub struct Pipeline<S> {
    normalizer: Normalizer,
    forwarder: Forwarder<S>,
    rates: RateStore,
    policy: ForwardingPolicy,
    stale_after: Duration,
    refresh_hint: RateRefreshHintSender,
    dedup: Mutex<IdentityCache>,
}

impl<S: TipSink> Pipeline<S> {
    pub fn new(
        normalizer: Normalizer,
        forwarder: Forwarder<S>,
        rates: RateStore,
        policy: ForwardingPolicy,
        stale_after: Duration,
        refresh_hint: RateRefreshHintSender,
    ) -> Self {
        Self {
            normalizer,
            forwarder,
            rates,
            policy,
            stale_after,
            refresh_hint,
            dedup: Mutex::new(IdentityCache::new()),
        }
    }

    /// Process one raw event to completion, reporting per-donation
    /// outcomes in arrival order.
    pub async fn process(&self, transport: Transport, payload: &Value) -> BatchReport {
        let records = self.normalizer.normalize(transport, payload);
        if records.is_empty() {
            debug!(transport = %transport, "no donation entries in event");
        }

        let mut report = BatchReport::default();
        for record in records {
            report.outcomes.push(self.process_one(transport, record).await);
        }
        report
    }

    async fn process_one(
        &self,
        transport: Transport,
        record: CanonicalDonation,
    ) -> DonationOutcome {
        if let Some(only) = &self.policy.forward_only_currency {
            if record.currency != *only {
                info!(currency = %record.currency, "skipping donation outside forwarding policy");
                return DonationOutcome::Filtered {
                    currency: record.currency,
                };
            }
        }

        // Admitted before any network call, so a duplicate arriving while
        // this delivery is in flight is still rejected.
        if !self.dedup.lock().await.admit(&record.identity) {
            debug!(identity = %record.identity, "duplicate donation dropped");
            return DonationOutcome::Duplicate {
                identity: record.identity,
            };
        }

        let table = self.rates.current().await;
        if table.is_stale(OffsetDateTime::now_utc(), self.stale_after) {
            // Redundant hints are fine to drop.
            let _ = self.refresh_hint.try_send(RateRefreshHint);
        }

        let conversion = convert(
            record.amount,
            &record.currency,
            &self.policy.target_currency,
            &table,
        );
        let converted = record.converted(conversion.amount, conversion.currency);

        info!(
            donor = %converted.donor_name,
            amount = %converted.amount,
            currency = %converted.currency,
            transport = %transport,
            "forwarding donation"
        );

        match self.forwarder.deliver(&converted, transport.as_str()).await {
            Ok(delivery) => {
                info!(tip_id = %delivery.record.id, stage = %delivery.stage, "tip recorded");
                DonationOutcome::Delivered(delivery)
            }
            Err(err) => {
                warn!(
                    error = %err,
                    identity = %converted.identity,
                    "donation delivery exhausted all stages"
                );
                DonationOutcome::Failed(err)
            }
        }
    }
}
