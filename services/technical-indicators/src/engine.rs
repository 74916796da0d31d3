//! Per-pair indicator computation driven by the candle stream

use rustc_hash::FxHashMap;
use services_common::{Candle, IndicatorRecord};
use tracing::debug;

use crate::buffer::CandleBuffer;
use crate::indicators::{compute_all, IndicatorPeriods};

/// Stateful indicator engine
///
/// Owns one bounded candle buffer per pair and recomputes the full
/// indicator set on every accepted candle. Candles for other window
/// widths are filtered out.
#[derive(Debug)]
pub struct IndicatorEngine {
    candle_seconds: u32,
    max_candles_in_state: usize,
    periods: IndicatorPeriods,
    buffers: FxHashMap<String, CandleBuffer>,
}

impl IndicatorEngine {
    pub fn new(candle_seconds: u32, max_candles_in_state: usize, periods: IndicatorPeriods) -> Self {
        Self {
            candle_seconds,
            max_candles_in_state,
            periods,
            buffers: FxHashMap::default(),
        }
    }

    /// Fold one candle into the pair's buffer and compute its record
    ///
    /// Returns `None` for candles whose `candle_seconds` does not match
    /// the configured value.
    pub fn process_candle(&mut self, candle: &Candle) -> Option<IndicatorRecord> {
        if candle.candle_seconds != self.candle_seconds {
            debug!(
                pair = %candle.pair,
                candle_seconds = candle.candle_seconds,
                "filtering out candle with mismatched interval"
            );
            return None;
        }

        let buffer = self
            .buffers
            .entry(candle.pair.clone())
            .or_insert_with(|| CandleBuffer::new(self.max_candles_in_state));
        buffer.push(candle);

        debug!(
            pair = %candle.pair,
            buffered = buffer.len(),
            window_start_ms = candle.window_start_ms,
            "computing indicators"
        );

        let indicators = compute_all(&buffer.closes(), &buffer.volumes(), &self.periods);
        Some(IndicatorRecord::from_candle(candle, indicators))
    }

    /// Number of pairs with buffered state
    pub fn tracked_pairs(&self) -> usize {
        self.buffers.len()
    }
}
