use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::default_schema_version;
use super::Candle;

/// A candle enriched with technical indicators
///
/// OHLCV fields are plain floats here: the record mirrors into a
/// streaming-SQL table whose columns are FLOAT. Indicator values sit in a
/// flattened map so the configured period set decides which `sma_p` /
/// `ema_p` / `rsi_p` keys exist; an indicator with insufficient history
/// (or a non-finite result) is simply absent from the JSON.
///
/// Keyed by `(pair, window_start_ms, window_end_ms)` downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRecord {
    pub pair: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub window_start_ms: i64,
    pub window_end_ms: i64,
    pub candle_seconds: u32,
    #[serde(flatten)]
    pub indicators: BTreeMap<String, f64>,
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
}

impl IndicatorRecord {
    /// Combine a candle with its computed indicator values
    pub fn from_candle(candle: &Candle, indicators: BTreeMap<String, f64>) -> Self {
        Self {
            pair: candle.pair.clone(),
            open: decimal_to_f64(candle.open),
            high: decimal_to_f64(candle.high),
            low: decimal_to_f64(candle.low),
            close: decimal_to_f64(candle.close),
            volume: decimal_to_f64(candle.volume),
            window_start_ms: candle.window_start_ms,
            window_end_ms: candle.window_end_ms,
            candle_seconds: candle.candle_seconds,
            indicators,
            schema_version: default_schema_version(),
        }
    }

    /// Look up an indicator value by its wire name (e.g. `rsi_14`)
    pub fn indicator(&self, name: &str) -> Option<f64> {
        self.indicators.get(name).copied()
    }
}

fn decimal_to_f64(value: rust_decimal::Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
