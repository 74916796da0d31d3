//! The pure OHLCV reducer
//!
//! Deliberately free of any windowing-runtime types: the aggregator
//! decides which window a trade belongs to and calls `init`/`update` on
//! the state it owns.

use rust_decimal::Decimal;
use services_common::Trade;

/// Running OHLCV state for one open window
#[derive(Debug, Clone, PartialEq)]
pub struct CandleState {
    pub pair: String,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// Initialize state from the first trade of a window
pub fn init(trade: &Trade) -> CandleState {
    CandleState {
        pair: trade.pair.clone(),
        open: trade.price,
        high: trade.price,
        low: trade.price,
        close: trade.price,
        volume: trade.quantity,
    }
}

/// Fold a subsequent trade into the state
///
/// `open` is never modified: the open price is strictly the first trade
/// observed for the window.
pub fn update(state: &mut CandleState, trade: &Trade) {
    state.high = state.high.max(trade.price);
    state.low = state.low.min(trade.price);
    state.close = trade.price;
    state.volume += trade.quantity;
}
