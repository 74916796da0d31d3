//! Canonical topic record types
//!
//! One strict schema per topic, each carrying a `schema_version` field.
//! Validation lives on the records themselves and returns explicit
//! results; the dataflow operators decide whether a failure means "drop
//! with warning" or "pass through unmodified".

mod candle;
mod indicator;
mod prediction;
mod trade;

pub use candle::Candle;
pub use indicator::IndicatorRecord;
pub use prediction::{Prediction, PredictionType};
pub use trade::Trade;

/// Wire schema version stamped on every outgoing record
pub const SCHEMA_VERSION: &str = "1.0";

pub(crate) fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}
