//! Trades ingestion service
//!
//! Streams raw trades from Kraken into the trades topic, keyed by pair.
//! Two source variants behind one capability trait: a live websocket
//! subscription and a historical REST backfill.

pub mod config;
pub mod kraken;
pub mod source;

pub use config::Settings;
pub use source::{SourceError, TradeSource};
