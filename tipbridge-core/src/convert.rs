//! Currency conversion against a base-anchored rate table.

use compact_str::{CompactString, ToCompactString};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::warn;

use crate::rates::RateTable;

/// Outcome of a conversion attempt: the amount to forward and the currency
/// it is actually denominated in. On a missing rate the amount passes
/// through unconverted and keeps its source currency label, so downstream
/// never sees it mislabeled under the target currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub amount: Decimal,
    pub currency: CompactString,
}

/// Convert `amount` from `from` into `to` using `table`.
///
/// The table maps each code to units of that currency per one unit of the
/// table's base: converting from the base multiplies by the target rate,
/// converting to the base divides by the source rate, and any other pair
/// crosses through the base. Identity conversions return the amount
/// untouched, with no rounding. Successful conversions are rounded to
/// 2 decimal places, half-up.
pub fn convert(amount: Decimal, from: &str, to: &str, table: &RateTable) -> Conversion {
    if from == to {
        return Conversion {
            amount,
            currency: to.to_compact_string(),
        };
    }

    let Some(in_base) = to_base(amount, from, table) else {
        warn!(from, to, "no usable rate for source currency, passing amount through");
        return Conversion {
            amount,
            currency: from.to_compact_string(),
        };
    };
    let Some(result) = from_base(in_base, to, table) else {
        warn!(from, to, "no usable rate for target currency, passing amount through");
        return Conversion {
            amount,
            currency: from.to_compact_string(),
        };
    };

    Conversion {
        amount: round_amount(result),
        currency: to.to_compact_string(),
    }
}

fn to_base(amount: Decimal, code: &str, table: &RateTable) -> Option<Decimal> {
    if code == table.base {
        return Some(amount);
    }
    let rate = table.rate(code)?;
    if rate.is_zero() {
        return None;
    }
    Some(amount / rate)
}

fn from_base(amount: Decimal, code: &str, table: &RateTable) -> Option<Decimal> {
    if code == table.base {
        Some(amount)
    } else {
        Some(amount * table.rate(code)?)
    }
}

/// Round to 2 decimal places, half-up.
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
