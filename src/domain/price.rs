//! Price Quotes
//!
//! Quantization and payload parsing for pricing-service responses.
//! A lookup yields `Some(price)` or `None` (unavailable); a zero price is a
//! real quote and never stands in for a missing one.

use std::str::FromStr;
use std::time::Duration;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;

/// Fractional digits every quote is quantized to
pub const PRICE_SCALE: u32 = 18;

#[derive(Debug, Deserialize)]
struct PricePayload {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<PriceData>,
}

#[derive(Debug, Deserialize)]
struct PriceData {
    #[serde(default)]
    value: Option<serde_json::Value>,
}

/// Round to 18 fractional digits (banker's rounding) and pad the scale.
///
/// Values too large to carry 18 digits keep the widest scale that fits.
pub fn quantize_price(value: Decimal) -> Decimal {
    let mut quantized = value.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointNearestEven);
    quantized.rescale(PRICE_SCALE);
    quantized
}

/// Extract `data.value` from a pricing response body.
///
/// Returns `None` unless the body is valid JSON with `success: true` and a
/// numeric (or numeric string) value.
pub fn parse_price_payload(body: &str) -> Option<Decimal> {
    let payload: PricePayload = serde_json::from_str(body).ok()?;
    if !payload.success {
        return None;
    }

    let value = payload.data?.value?;
    let decimal = match value {
        serde_json::Value::Number(n) => number_to_decimal(&n)?,
        serde_json::Value::String(s) => parse_decimal(s.trim())?,
        _ => return None,
    };

    Some(quantize_price(decimal))
}

fn number_to_decimal(n: &serde_json::Number) -> Option<Decimal> {
    if let Some(i) = n.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(Decimal::from(u));
    }
    parse_decimal(&n.to_string())
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    if text.contains(['e', 'E']) {
        Decimal::from_scientific(text).ok()
    } else {
        Decimal::from_str(text).ok()
    }
}

/// Parse a `Retry-After` header given in whole seconds.
///
/// Missing or non-numeric headers fall back to `default`.
pub fn parse_retry_after(header: Option<&str>, default: Duration) -> Duration {
    header
        .and_then(|h| h.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}
