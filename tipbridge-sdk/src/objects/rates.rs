//! Exchange-rate source response shapes.

use compact_str::CompactString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Response of `GET /latest?base=<BASE>`.
///
/// `rates` maps a currency code to units of that currency per one unit of
/// `base`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateResponse {
    pub base: CompactString,
    pub rates: HashMap<CompactString, Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_response_parsing_ignores_extra_fields() {
        let resp: RateResponse = serde_json::from_str(
            r#"{"amount":1.0,"base":"THB","date":"2024-05-01","rates":{"USD":0.028,"EUR":0.026}}"#,
        )
        .unwrap();
        assert_eq!(resp.base, "THB");
        assert_eq!(resp.rates.get("USD").copied(), Some(Decimal::new(28, 3)));
        assert_eq!(resp.rates.len(), 2);
    }
}
