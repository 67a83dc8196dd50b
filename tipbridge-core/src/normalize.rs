//! Raw event normalization.
//!
//! Maps heterogeneous inbound payloads (push-socket envelopes and webhook
//! bodies) into [`CanonicalDonation`] records. Provider formats alias the
//! same logical field under several names; the tables below enumerate the
//! recognized aliases per field in priority order, and extraction takes the
//! first non-empty match. Webhook bodies are additionally searched one
//! level under their `data` and `donation` keys, top level winning.

use compact_str::{CompactString, ToCompactString};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use time::OffsetDateTime;
use tracing::debug;

use crate::entities::CanonicalDonation;
use crate::entities::donation::{ANONYMOUS_DONOR, sanitize_donor_name};
use crate::events::Transport;
use tipbridge_sdk::objects::donation::SocketEnvelope;

/// Aliases for the explicit donation identifier.
pub const ID_ALIASES: &[&str] = &["donation_id", "id"];
/// Aliases for the donor display name.
pub const NAME_ALIASES: &[&str] = &["name", "display_name", "username", "donor"];
/// Aliases for the donated amount.
pub const AMOUNT_ALIASES: &[&str] = &["amount", "amount_paid"];
/// Aliases for the source currency code.
pub const CURRENCY_ALIASES: &[&str] = &["currency"];
/// Aliases for the free-form message.
pub const MESSAGE_ALIASES: &[&str] = &["message", "note"];

/// Keys a webhook body may nest its donation fields under, checked after
/// the top level, in order.
const NESTED_KEYS: &[&str] = &["data", "donation"];

/// Maps raw transport payloads to canonical donation records.
pub struct Normalizer {
    default_currency: CompactString,
}

impl Normalizer {
    /// `default_currency` is assumed for events that carry no currency
    /// field (the configured base currency).
    pub fn new(default_currency: CompactString) -> Self {
        Self { default_currency }
    }

    /// Map one raw payload to zero or more canonical records.
    ///
    /// Unrecognized events yield an empty batch; a malformed single entry
    /// is skipped without aborting the rest of its batch.
    pub fn normalize(&self, transport: Transport, payload: &Value) -> Vec<CanonicalDonation> {
        match transport {
            Transport::Socket => self.normalize_socket(payload),
            Transport::Webhook => self.normalize_webhook(payload).into_iter().collect(),
        }
    }

    /// Socket frames carry the `{type, message}` envelope; only donation
    /// envelopes are considered, and `message` may hold one entry or many.
    fn normalize_socket(&self, payload: &Value) -> Vec<CanonicalDonation> {
        let envelope: SocketEnvelope = match serde_json::from_value(payload.clone()) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!(error = %e, "dropping unrecognized socket frame");
                return Vec::new();
            }
        };
        if !envelope.is_donation() {
            return Vec::new();
        }

        envelope
            .entries()
            .iter()
            .filter_map(|entry| self.donation_from(&[entry]))
            .collect()
    }

    /// Webhook bodies hold a single record, flattened or nested one level.
    fn normalize_webhook(&self, body: &Value) -> Option<CanonicalDonation> {
        let mut scopes: Vec<&Value> = vec![body];
        for key in NESTED_KEYS {
            if let Some(nested) = body.get(key) {
                scopes.push(nested);
            }
        }
        self.donation_from(&scopes)
    }

    /// Build one record by searching the given scopes in priority order.
    /// Returns `None` when no scope is a JSON object.
    fn donation_from(&self, scopes: &[&Value]) -> Option<CanonicalDonation> {
        if !scopes.iter().any(|scope| scope.is_object()) {
            debug!("skipping malformed donation entry");
            return None;
        }

        let donor_name = first_string(scopes, NAME_ALIASES)
            .map(|name| sanitize_donor_name(&name))
            .unwrap_or_else(|| ANONYMOUS_DONOR.to_string());

        let amount = first_amount(scopes, AMOUNT_ALIASES).unwrap_or(Decimal::ZERO);

        let currency = first_string(scopes, CURRENCY_ALIASES)
            .map(|code| code.trim().to_uppercase().to_compact_string())
            .unwrap_or_else(|| self.default_currency.clone());

        let message = first_string(scopes, MESSAGE_ALIASES).unwrap_or_default();

        let identity = first_id(scopes).unwrap_or_else(|| {
            let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
            format!("{donor_name}-{amount}-{currency}-{millis}")
        });

        Some(CanonicalDonation {
            identity,
            donor_name,
            amount,
            currency,
            message,
        })
    }
}

/// First non-empty string among the aliases, searching every scope in
/// order; the earlier scope wins over the later alias.
fn first_string(scopes: &[&Value], aliases: &[&str]) -> Option<String> {
    for scope in scopes {
        for alias in aliases {
            if let Some(Value::String(s)) = scope.get(alias) {
                if !s.trim().is_empty() {
                    return Some(s.clone());
                }
            }
        }
    }
    None
}

/// First parseable amount among the aliases. Numbers are read exactly,
/// strings are parsed; negative values clamp to zero.
fn first_amount(scopes: &[&Value], aliases: &[&str]) -> Option<Decimal> {
    for scope in scopes {
        for alias in aliases {
            let parsed = match scope.get(alias) {
                Some(Value::Number(n)) => Decimal::from_str(&n.to_string()).ok(),
                Some(Value::String(s)) => Decimal::from_str(s.trim()).ok(),
                _ => None,
            };
            if let Some(amount) = parsed {
                return Some(amount.max(Decimal::ZERO));
            }
        }
    }
    None
}

/// Explicit donation identifier: a non-empty string or a number.
fn first_id(scopes: &[&Value]) -> Option<String> {
    for scope in scopes {
        for alias in ID_ALIASES {
            match scope.get(alias) {
                Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.clone()),
                Some(Value::Number(n)) => return Some(n.to_string()),
                _ => {}
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalizer() -> Normalizer {
        Normalizer::new(CompactString::from("THB"))
    }

    #[test]
    fn test_socket_single_donation_object() {
        let payload = json!({
            "type": "donation",
            "message": {
                "donation_id": "d-77",
                "name": "Alice",
                "amount": 100,
                "currency": "thb",
                "message": "hi"
            }
        });
        let records = normalizer().normalize(Transport::Socket, &payload);
        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec.identity, "d-77");
        assert_eq!(rec.donor_name, "Alice");
        assert_eq!(rec.amount, Decimal::new(100, 0));
        assert_eq!(rec.currency, "THB");
        assert_eq!(rec.message, "hi");
    }

    #[test]
    fn test_socket_array_with_one_malformed_entry() {
        let payload = json!({
            "type": "donation",
            "message": [
                {"id": 1, "name": "Bob", "amount": 5},
                "not an object",
                {"id": 2, "name": "Carol", "amount": "7.50"}
            ]
        });
        let records = normalizer().normalize(Transport::Socket, &payload);
        // The malformed entry is skipped, not the whole batch.
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].identity, "1");
        assert_eq!(records[1].amount, Decimal::new(750, 2));
    }

    #[test]
    fn test_socket_non_donation_type_is_dropped() {
        let payload = json!({"type": "follow", "message": {"name": "Bob"}});
        assert!(normalizer().normalize(Transport::Socket, &payload).is_empty());
    }

    #[test]
    fn test_alias_priority_first_non_empty_wins() {
        let payload = json!({
            "type": "donation",
            "message": {
                "name": "",
                "display_name": "StreamFan",
                "username": "fan123",
                "amount_paid": 3
            }
        });
        let records = normalizer().normalize(Transport::Socket, &payload);
        assert_eq!(records[0].donor_name, "StreamFan");
        assert_eq!(records[0].amount, Decimal::new(3, 0));
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let payload = json!({"type": "donation", "message": {}});
        let records = normalizer().normalize(Transport::Socket, &payload);
        let rec = &records[0];
        assert_eq!(rec.donor_name, ANONYMOUS_DONOR);
        assert_eq!(rec.amount, Decimal::ZERO);
        assert_eq!(rec.currency, "THB");
        assert_eq!(rec.message, "");
    }

    #[test]
    fn test_unparseable_amount_coerces_to_zero() {
        let payload = json!({
            "type": "donation",
            "message": {"name": "Bob", "amount": "lots"}
        });
        let records = normalizer().normalize(Transport::Socket, &payload);
        assert_eq!(records[0].amount, Decimal::ZERO);
    }

    #[test]
    fn test_negative_amount_clamps_to_zero() {
        let payload = json!({
            "type": "donation",
            "message": {"name": "Mallory", "amount": -5}
        });
        let records = normalizer().normalize(Transport::Socket, &payload);
        assert_eq!(records[0].amount, Decimal::ZERO);
    }

    #[test]
    fn test_composite_identity_without_explicit_id() {
        let payload = json!({
            "type": "donation",
            "message": {"name": "Alice", "amount": 5, "currency": "USD"}
        });
        let records = normalizer().normalize(Transport::Socket, &payload);
        assert!(records[0].identity.starts_with("Alice-5-USD-"));
    }

    #[test]
    fn test_webhook_flat_body() {
        let payload = json!({
            "name": "Alice",
            "amount": 100,
            "currency": "THB",
            "message": "hi"
        });
        let rec = normalizer().normalize(Transport::Webhook, &payload);
        assert_eq!(rec.len(), 1);
        assert_eq!(rec[0].donor_name, "Alice");
        assert_eq!(rec[0].amount, Decimal::new(100, 0));
    }

    #[test]
    fn test_webhook_nested_under_data_and_donation() {
        let payload = json!({
            "donor": "Dave",
            "data": {"amount": 42},
            "donation": {"currency": "eur", "note": "cheers"}
        });
        let rec = &normalizer().normalize(Transport::Webhook, &payload)[0];
        assert_eq!(rec.donor_name, "Dave");
        assert_eq!(rec.amount, Decimal::new(42, 0));
        assert_eq!(rec.currency, "EUR");
        assert_eq!(rec.message, "cheers");
    }

    #[test]
    fn test_webhook_top_level_wins_over_nested() {
        let payload = json!({
            "amount": 10,
            "data": {"amount": 99}
        });
        let rec = &normalizer().normalize(Transport::Webhook, &payload)[0];
        assert_eq!(rec.amount, Decimal::new(10, 0));
    }

    #[test]
    fn test_webhook_non_object_body_is_dropped() {
        let payload = json!("just a string");
        assert!(normalizer().normalize(Transport::Webhook, &payload).is_empty());
    }

    #[test]
    fn test_donor_name_is_sanitized_at_construction() {
        let payload = json!({
            "type": "donation",
            "message": {"name": "<script>Evil</script>", "amount": 1}
        });
        let rec = &normalizer().normalize(Transport::Socket, &payload)[0];
        assert_eq!(rec.donor_name, "scriptEvilscript");
    }
}
