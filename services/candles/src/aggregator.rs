//! Per-pair window state and emission policy

use rustc_hash::FxHashMap;
use services_common::{models, Candle, Trade};
use tracing::debug;

use crate::reducer::{self, CandleState};
use crate::window::{window_start, window_width_ms};

/// One open window bucket for a pair
#[derive(Debug, Clone)]
struct OpenWindow {
    window_start_ms: i64,
    state: CandleState,
}

/// Stateful tumbling-window aggregator
///
/// Holds at most one open bucket per pair. A bucket closes when a
/// strictly later window first opens for the same pair; trades for
/// already-closed windows are dropped (allowed-lateness policy: within
/// the open window only).
///
/// With `emit_intermediate` (the default) a snapshot of the bucket is
/// emitted after every update; otherwise a single final candle is
/// emitted at rollover.
#[derive(Debug)]
pub struct CandleAggregator {
    candle_seconds: u32,
    emit_intermediate: bool,
    windows: FxHashMap<String, OpenWindow>,
}

impl CandleAggregator {
    pub fn new(candle_seconds: u32, emit_intermediate: bool) -> Self {
        Self {
            candle_seconds,
            emit_intermediate,
            windows: FxHashMap::default(),
        }
    }

    /// Fold one trade into its window; returns the candles to emit
    ///
    /// The window is derived from the payload's event time, never from
    /// log ingestion time.
    pub fn process_trade(&mut self, trade: &Trade) -> Vec<Candle> {
        let start_ms = window_start(trade.timestamp_ms, self.candle_seconds);
        let mut emissions = Vec::new();

        if let Some(open) = self.windows.get_mut(&trade.pair) {
            if open.window_start_ms == start_ms {
                reducer::update(&mut open.state, trade);
                if self.emit_intermediate {
                    emissions.push(to_candle(self.candle_seconds, open));
                }
            } else if start_ms > open.window_start_ms {
                if !self.emit_intermediate {
                    emissions.push(to_candle(self.candle_seconds, open));
                }
                *open = OpenWindow {
                    window_start_ms: start_ms,
                    state: reducer::init(trade),
                };
                if self.emit_intermediate {
                    emissions.push(to_candle(self.candle_seconds, open));
                }
            } else {
                debug!(
                    pair = %trade.pair,
                    timestamp_ms = trade.timestamp_ms,
                    open_window_start_ms = open.window_start_ms,
                    "dropping late trade for closed window"
                );
            }
            return emissions;
        }

        let open = OpenWindow {
            window_start_ms: start_ms,
            state: reducer::init(trade),
        };
        if self.emit_intermediate {
            emissions.push(to_candle(self.candle_seconds, &open));
        }
        self.windows.insert(trade.pair.clone(), open);

        emissions
    }

    /// Snapshots of every open bucket
    ///
    /// Used on shutdown when intermediate emission is disabled, so open
    /// windows are not lost.
    pub fn drain(&mut self) -> Vec<Candle> {
        let mut candles: Vec<Candle> = self
            .windows
            .values()
            .map(|open| to_candle(self.candle_seconds, open))
            .collect();
        candles.sort_by(|a, b| a.pair.cmp(&b.pair));
        self.windows.clear();
        candles
    }

    /// Number of open buckets
    pub fn open_windows(&self) -> usize {
        self.windows.len()
    }
}

/// Flatten the reducer state into the output record
fn to_candle(candle_seconds: u32, open: &OpenWindow) -> Candle {
    Candle {
        pair: open.state.pair.clone(),
        open: open.state.open,
        high: open.state.high,
        low: open.state.low,
        close: open.state.close,
        volume: open.state.volume,
        window_start_ms: open.window_start_ms,
        window_end_ms: open.window_start_ms + window_width_ms(candle_seconds),
        candle_seconds,
        schema_version: models::SCHEMA_VERSION.to_string(),
    }
}
