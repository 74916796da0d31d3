use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

use super::default_schema_version;

/// Clock-skew tolerance for trade timestamps
const MAX_TRADE_AGE_MS: i64 = 24 * 60 * 60 * 1000;
const MAX_FUTURE_SKEW_MS: i64 = 60_000;

/// A single normalized trade from the exchange
///
/// Prices and quantities are decimals and serialize as decimal-preserving
/// strings on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub pair: String,
    pub price: Decimal,
    pub quantity: Decimal,
    pub timestamp_ms: i64,
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
}

impl Trade {
    pub fn new(pair: impl Into<String>, price: Decimal, quantity: Decimal, timestamp_ms: i64) -> Self {
        Self {
            pair: pair.into(),
            price,
            quantity,
            timestamp_ms,
            schema_version: default_schema_version(),
        }
    }

    /// Validate the trade against `now_ms`
    ///
    /// Rejects iff the price is non-positive, the quantity is negative,
    /// the pair is empty, or the timestamp falls outside
    /// `[now - 24h, now + 60s]`.
    pub fn validate(&self, now_ms: i64) -> Result<(), ValidationError> {
        if self.pair.trim().is_empty() {
            return Err(ValidationError::EmptyPair);
        }
        if self.price <= Decimal::ZERO {
            return Err(ValidationError::NonPositivePrice(self.price.to_string()));
        }
        if self.quantity < Decimal::ZERO {
            return Err(ValidationError::NegativeQuantity(self.quantity.to_string()));
        }
        let min_ms = now_ms - MAX_TRADE_AGE_MS;
        let max_ms = now_ms + MAX_FUTURE_SKEW_MS;
        if self.timestamp_ms < min_ms || self.timestamp_ms > max_ms {
            return Err(ValidationError::TimestampOutOfRange {
                timestamp_ms: self.timestamp_ms,
                min_ms,
                max_ms,
            });
        }
        Ok(())
    }
}
