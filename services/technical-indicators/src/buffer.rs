//! Bounded per-pair candle history

use std::collections::VecDeque;

use rust_decimal::prelude::ToPrimitive;
use services_common::Candle;

/// One buffered window, reduced to what the indicator engine consumes
#[derive(Debug, Clone, PartialEq)]
pub struct BufferedCandle {
    pub window_start_ms: i64,
    pub close: f64,
    pub volume: f64,
}

impl From<&Candle> for BufferedCandle {
    fn from(candle: &Candle) -> Self {
        Self {
            window_start_ms: candle.window_start_ms,
            close: candle.close.to_f64().unwrap_or(0.0),
            volume: candle.volume.to_f64().unwrap_or(0.0),
        }
    }
}

/// FIFO buffer of the last N windows for one pair
///
/// Upstream emits "current" snapshots, so the same `window_start_ms` can
/// arrive repeatedly; the buffer keeps the most recent snapshot per
/// window (last-write-wins) and therefore always represents the latest
/// known state of the last N distinct windows.
#[derive(Debug)]
pub struct CandleBuffer {
    capacity: usize,
    candles: VecDeque<BufferedCandle>,
}

impl CandleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            candles: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    /// Append a candle, replacing an already-buffered snapshot of the
    /// same window; evicts the oldest window beyond capacity
    pub fn push(&mut self, candle: &Candle) {
        let snapshot = BufferedCandle::from(candle);

        if let Some(position) = self
            .candles
            .iter()
            .rposition(|c| c.window_start_ms == snapshot.window_start_ms)
        {
            self.candles[position] = snapshot;
            return;
        }

        self.candles.push_back(snapshot);
        if self.candles.len() > self.capacity {
            self.candles.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Close series, oldest first
    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// Volume series, oldest first
    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume).collect()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;
    use rust_decimal::Decimal;

    use super::*;

    fn candle(window_start_ms: i64, close: Decimal, volume: Decimal) -> Candle {
        Candle {
            pair: "BTC/USD".into(),
            open: close,
            high: close,
            low: close,
            close,
            volume,
            window_start_ms,
            window_end_ms: window_start_ms + 60_000,
            candle_seconds: 60,
            schema_version: "1.0".into(),
        }
    }

    #[test]
    fn appends_distinct_windows_in_order() {
        let mut buffer = CandleBuffer::new(10);
        buffer.push(&candle(0, dec!(10), dec!(1)));
        buffer.push(&candle(60_000, dec!(20), dec!(1)));
        assert_eq!(buffer.closes(), vec![10.0, 20.0]);
    }

    #[test]
    fn repeated_window_replaces_in_place() {
        let mut buffer = CandleBuffer::new(10);
        buffer.push(&candle(0, dec!(10), dec!(1)));
        buffer.push(&candle(0, dec!(11), dec!(2)));
        buffer.push(&candle(0, dec!(12), dec!(3)));

        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.closes(), vec![12.0]);
        assert_eq!(buffer.volumes(), vec![3.0]);
    }

    #[test]
    fn evicts_oldest_window_beyond_capacity() {
        let mut buffer = CandleBuffer::new(3);
        for i in 0..5 {
            buffer.push(&candle(i * 60_000, Decimal::from(i), dec!(1)));
        }
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.closes(), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn late_snapshot_of_buffered_window_still_replaces() {
        let mut buffer = CandleBuffer::new(10);
        buffer.push(&candle(0, dec!(10), dec!(1)));
        buffer.push(&candle(60_000, dec!(20), dec!(1)));
        // A final snapshot of the older window arrives after rollover.
        buffer.push(&candle(0, dec!(15), dec!(4)));

        assert_eq!(buffer.closes(), vec![15.0, 20.0]);
    }
}
