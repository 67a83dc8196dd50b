//! Long-lived processors of the bridge.
//!
//! - `DonationProcessor`: drains raw ingress events through the pipeline,
//!   one event at a time
//! - `RateRefresher`: keeps the shared rate table fresh
//! - `Forwarder`: walks the delivery fallback chain against the tip API

pub mod donation_processor;
pub mod forwarder;
pub mod pipeline;
pub mod rate_refresher;

pub use donation_processor::DonationProcessor;
pub use forwarder::{Delivery, DeliveryError, DeliveryStage, Forwarder, TipSink};
pub use pipeline::{BatchReport, DonationOutcome, Pipeline};
pub use rate_refresher::RateRefresher;
