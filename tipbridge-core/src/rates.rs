//! Exchange-rate table snapshots.
//!
//! [`RateStore`] holds the latest [`RateTable`] behind an atomically
//! swapped `Arc`: readers clone the current snapshot and never observe a
//! partial update; the background refresher replaces the snapshot whole. A
//! version counter increments on every replacement.

use async_trait::async_trait;
use compact_str::CompactString;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;

use tipbridge_sdk::client::{ClientError, RatesClient};
use tipbridge_sdk::objects::rates::RateResponse;

/// Snapshot of exchange rates anchored to one base currency.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    pub base: CompactString,
    /// Units of the keyed currency per one unit of `base`.
    pub rates: HashMap<CompactString, Decimal>,
    /// When this table was produced (startup time for the bootstrap table).
    pub fetched_at: OffsetDateTime,
}

impl RateTable {
    /// Table built from a rate-source response. The base is always present
    /// at rate 1.
    pub fn from_response(resp: RateResponse, now: OffsetDateTime) -> Self {
        let mut rates = resp.rates;
        rates.insert(resp.base.clone(), Decimal::ONE);
        Self {
            base: resp.base,
            rates,
            fetched_at: now,
        }
    }

    /// Startup table: the base at rate 1 plus a hardcoded default rate for
    /// the target currency, so conversion stays operable even when the
    /// remote rate source is unreachable at boot.
    pub fn bootstrap(base: CompactString, target: CompactString, now: OffsetDateTime) -> Self {
        let mut rates = HashMap::new();
        rates.insert(base.clone(), Decimal::ONE);
        // 0.028 target units per base unit.
        rates.entry(target).or_insert_with(|| Decimal::new(28, 3));
        Self {
            base,
            rates,
            fetched_at: now,
        }
    }

    pub fn rate(&self, code: &str) -> Option<Decimal> {
        self.rates.get(code).copied()
    }

    /// Age of this snapshot at `now`.
    pub fn age(&self, now: OffsetDateTime) -> Duration {
        now - self.fetched_at
    }

    pub fn is_stale(&self, now: OffsetDateTime, threshold: Duration) -> bool {
        self.age(now) > threshold
    }
}

/// Shared, versioned holder of the current [`RateTable`].
#[derive(Clone)]
pub struct RateStore {
    inner: Arc<RateStoreInner>,
}

struct RateStoreInner {
    table: RwLock<Arc<RateTable>>,
    version: AtomicU64,
}

impl RateStore {
    pub fn new(initial: RateTable) -> Self {
        Self {
            inner: Arc::new(RateStoreInner {
                table: RwLock::new(Arc::new(initial)),
                version: AtomicU64::new(0),
            }),
        }
    }

    /// The current snapshot. Never fails; at worst this is the bootstrap
    /// table.
    pub async fn current(&self) -> Arc<RateTable> {
        self.inner.table.read().await.clone()
    }

    /// Replace the snapshot whole and bump the version. Returns the new
    /// version.
    pub async fn replace(&self, table: RateTable) -> u64 {
        let mut guard = self.inner.table.write().await;
        *guard = Arc::new(table);
        drop(guard);
        self.inner.version.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Relaxed)
    }
}

/// Remote source of exchange-rate tables.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_latest(&self, base: &str) -> Result<RateResponse, ClientError>;
}

#[async_trait]
impl RateSource for RatesClient {
    async fn fetch_latest(&self, base: &str) -> Result<RateResponse, ClientError> {
        self.latest(base).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()
    }

    #[test]
    fn test_bootstrap_is_never_empty() {
        let table = RateTable::bootstrap(
            CompactString::from("THB"),
            CompactString::from("USD"),
            now(),
        );
        assert_eq!(table.rate("THB"), Some(Decimal::ONE));
        assert_eq!(table.rate("USD"), Some(Decimal::new(28, 3)));
    }

    #[test]
    fn test_bootstrap_with_target_equal_to_base() {
        let table = RateTable::bootstrap(
            CompactString::from("USD"),
            CompactString::from("USD"),
            now(),
        );
        assert_eq!(table.rate("USD"), Some(Decimal::ONE));
        assert_eq!(table.rates.len(), 1);
    }

    #[test]
    fn test_from_response_inserts_base_rate() {
        let resp: RateResponse =
            serde_json::from_str(r#"{"base":"THB","rates":{"USD":0.028}}"#).unwrap();
        let table = RateTable::from_response(resp, now());
        assert_eq!(table.rate("THB"), Some(Decimal::ONE));
        assert_eq!(table.rate("USD"), Some(Decimal::new(28, 3)));
    }

    #[test]
    fn test_staleness() {
        let table = RateTable::bootstrap(
            CompactString::from("THB"),
            CompactString::from("USD"),
            now(),
        );
        let threshold = Duration::seconds(3600);
        assert!(!table.is_stale(now() + Duration::seconds(10), threshold));
        assert!(table.is_stale(now() + Duration::seconds(3601), threshold));
    }

    #[tokio::test]
    async fn test_store_replace_swaps_snapshot_and_bumps_version() {
        let store = RateStore::new(RateTable::bootstrap(
            CompactString::from("THB"),
            CompactString::from("USD"),
            now(),
        ));
        assert_eq!(store.version(), 0);

        let before = store.current().await;
        let resp: RateResponse =
            serde_json::from_str(r#"{"base":"THB","rates":{"USD":0.03}}"#).unwrap();
        let version = store.replace(RateTable::from_response(resp, now())).await;

        assert_eq!(version, 1);
        let after = store.current().await;
        assert_eq!(after.rate("USD"), Some(Decimal::new(3, 2)));
        // The old snapshot is still intact for anyone holding it.
        assert_eq!(before.rate("USD"), Some(Decimal::new(28, 3)));
    }
}
