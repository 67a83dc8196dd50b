//! Outbound tip-recording API shapes.

use compact_str::CompactString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Body for `POST /tips/{account_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipPayload {
    pub username: String,
    pub amount: Decimal,
    pub currency: CompactString,
    pub message: String,
    /// Origin tag so downstream dashboards can tell bridged tips apart.
    pub provider: CompactString,
}

/// Record returned by the tip API once a tip is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TipRecord {
    /// Identifier assigned by the downstream API.
    #[serde(alias = "_id")]
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tip_record_accepts_both_id_spellings() {
        let plain: TipRecord = serde_json::from_str(r#"{"id":"abc123"}"#).unwrap();
        assert_eq!(plain.id, "abc123");

        let underscored: TipRecord = serde_json::from_str(r#"{"_id":"abc123"}"#).unwrap();
        assert_eq!(underscored.id, "abc123");
    }

    #[test]
    fn test_tip_payload_serializes_amount_as_decimal() {
        let payload = TipPayload {
            username: "Alice".to_string(),
            amount: Decimal::new(280, 2),
            currency: CompactString::from("USD"),
            message: "hi".to_string(),
            provider: CompactString::from("webhook"),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["amount"], serde_json::json!("2.80"));
        assert_eq!(json["currency"], serde_json::json!("USD"));
    }
}
