use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

use super::default_schema_version;

/// An OHLCV candle over one tumbling window
///
/// Created by the first trade of a window, mutated by every subsequent
/// trade, and emitted as a "current" snapshot after each update. The
/// window is epoch-anchored: `window_start_ms` is a multiple of
/// `candle_seconds * 1000` and `window_end_ms - window_start_ms` equals
/// the window width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub pair: String,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub window_start_ms: i64,
    pub window_end_ms: i64,
    pub candle_seconds: u32,
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
}

impl Candle {
    /// Validate OHLC consistency and window bounds
    pub fn validate(&self) -> Result<(), ValidationError> {
        for value in [self.open, self.high, self.low, self.close] {
            if value <= Decimal::ZERO {
                return Err(ValidationError::NonPositivePrice(value.to_string()));
            }
        }
        if self.volume < Decimal::ZERO {
            return Err(ValidationError::NegativeQuantity(self.volume.to_string()));
        }
        if self.high < self.low {
            return Err(ValidationError::HighBelowLow {
                high: self.high.to_string(),
                low: self.low.to_string(),
            });
        }
        for (field, value) in [("open", self.open), ("close", self.close)] {
            if value < self.low || value > self.high {
                return Err(ValidationError::PriceOutsideRange {
                    field,
                    value: value.to_string(),
                    low: self.low.to_string(),
                    high: self.high.to_string(),
                });
            }
        }
        if self.window_end_ms <= self.window_start_ms {
            return Err(ValidationError::InvalidWindow {
                start_ms: self.window_start_ms,
                end_ms: self.window_end_ms,
            });
        }
        let width_ms = self.window_end_ms - self.window_start_ms;
        if width_ms != i64::from(self.candle_seconds) * 1000 {
            return Err(ValidationError::WindowWidthMismatch {
                actual_ms: width_ms,
                candle_seconds: self.candle_seconds,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use super::*;

    fn candle() -> Candle {
        Candle {
            pair: "BTC/USD".into(),
            open: dec!(100),
            high: dec!(120),
            low: dec!(90),
            close: dec!(110),
            volume: dec!(6),
            window_start_ms: 60_000,
            window_end_ms: 120_000,
            candle_seconds: 60,
            schema_version: default_schema_version(),
        }
    }

    #[test]
    fn accepts_consistent_candle() {
        assert!(candle().validate().is_ok());
    }

    #[test]
    fn rejects_high_below_low() {
        let mut c = candle();
        c.high = dec!(80);
        assert!(matches!(
            c.validate(),
            Err(ValidationError::HighBelowLow { .. })
        ));
    }

    #[test]
    fn rejects_open_outside_range() {
        let mut c = candle();
        c.open = dec!(130);
        assert!(matches!(
            c.validate(),
            Err(ValidationError::PriceOutsideRange { field: "open", .. })
        ));
    }

    #[test]
    fn rejects_inverted_window() {
        let mut c = candle();
        c.window_end_ms = c.window_start_ms;
        assert!(matches!(
            c.validate(),
            Err(ValidationError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn rejects_window_width_mismatch() {
        let mut c = candle();
        c.window_end_ms = c.window_start_ms + 30_000;
        assert!(matches!(
            c.validate(),
            Err(ValidationError::WindowWidthMismatch { .. })
        ));
    }

    #[test]
    fn round_trips_through_json_with_string_prices() {
        let json = serde_json::to_string(&candle()).unwrap();
        assert!(json.contains(r#""open":"100""#));
        let back: Candle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, candle());
    }

    #[test]
    fn ignores_extra_fields_on_input() {
        let json = r#"{
            "pair": "BTC/USD",
            "open": "100", "high": "120", "low": "90", "close": "110",
            "volume": "6",
            "window_start_ms": 60000, "window_end_ms": 120000,
            "candle_seconds": 60,
            "exchange": "kraken"
        }"#;
        let c: Candle = serde_json::from_str(json).unwrap();
        assert_eq!(c.pair, "BTC/USD");
        assert_eq!(c.schema_version, "1.0");
    }
}
