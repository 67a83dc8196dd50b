//! Canonical donation record and donor-name sanitization.

use compact_str::CompactString;
use rust_decimal::Decimal;

/// Donor name used when the inbound event carries none.
pub const ANONYMOUS_DONOR: &str = "Anonymous";

/// Longest donor name forwarded downstream.
pub const MAX_DONOR_NAME_LEN: usize = 25;

/// Tighter bound used by the sanitized-name delivery fallback.
pub const STRICT_NAME_LEN: usize = 20;

/// Transport-independent representation of one donation event.
///
/// Immutable once constructed; currency conversion produces a new record
/// via [`converted`](CanonicalDonation::converted) and never mutates in
/// place.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalDonation {
    /// Deduplication identity: the explicit donation id when the event
    /// carries one, otherwise a best-effort composite.
    pub identity: String,
    pub donor_name: String,
    /// Non-negative amount denominated in `currency`.
    pub amount: Decimal,
    /// Uppercased ISO-like 3-letter code.
    pub currency: CompactString,
    pub message: String,
}

impl CanonicalDonation {
    /// New record with the amount and currency replaced.
    pub fn converted(&self, amount: Decimal, currency: CompactString) -> Self {
        Self {
            amount,
            currency,
            ..self.clone()
        }
    }
}

/// Bound the length and character set of a donor name before it goes to an
/// external API. Empty results fall back to the anonymous sentinel.
pub fn sanitize_donor_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-' | '.'))
        .take(MAX_DONOR_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        ANONYMOUS_DONOR.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Harsher reduction used by the delivery fallback: ASCII alphanumerics
/// only, tighter length bound.
pub fn strict_donor_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(STRICT_NAME_LEN)
        .collect();
    if cleaned.is_empty() {
        ANONYMOUS_DONOR.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converted_returns_new_record() {
        let original = CanonicalDonation {
            identity: "d-1".to_string(),
            donor_name: "Alice".to_string(),
            amount: Decimal::new(100, 0),
            currency: CompactString::from("THB"),
            message: "hi".to_string(),
        };
        let converted = original.converted(Decimal::new(280, 2), CompactString::from("USD"));

        assert_eq!(converted.amount, Decimal::new(280, 2));
        assert_eq!(converted.currency, "USD");
        assert_eq!(converted.identity, original.identity);
        assert_eq!(converted.message, original.message);
        // The source record is untouched.
        assert_eq!(original.amount, Decimal::new(100, 0));
        assert_eq!(original.currency, "THB");
    }

    #[test]
    fn test_sanitize_strips_disallowed_characters() {
        assert_eq!(sanitize_donor_name("Al<ice>!"), "Alice");
        assert_eq!(sanitize_donor_name("bob_the-1st."), "bob_the-1st.");
    }

    #[test]
    fn test_sanitize_bounds_length() {
        let long = "a".repeat(100);
        assert_eq!(sanitize_donor_name(&long).len(), MAX_DONOR_NAME_LEN);
    }

    #[test]
    fn test_sanitize_empty_falls_back_to_anonymous() {
        assert_eq!(sanitize_donor_name(""), ANONYMOUS_DONOR);
        assert_eq!(sanitize_donor_name("$$$"), ANONYMOUS_DONOR);
        assert_eq!(sanitize_donor_name("   "), ANONYMOUS_DONOR);
    }

    #[test]
    fn test_strict_name_is_ascii_alphanumeric_only() {
        assert_eq!(strict_donor_name("Al ice_99!"), "Alice99");
        assert_eq!(strict_donor_name("日本語"), ANONYMOUS_DONOR);
        assert_eq!(strict_donor_name(&"x".repeat(50)).len(), STRICT_NAME_LEN);
    }
}
