//! Common error types for services

use thiserror::Error;

/// Configuration errors, fatal at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration value `{0}`")]
    Missing(String),

    #[error("invalid value for `{key}`: {reason}")]
    Invalid { key: String, reason: String },
}

impl ConfigError {
    /// Build an `Invalid` error for the given key
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Record validation failures at service boundaries
///
/// Operators translate these into "drop with warning" or "pass through
/// unmodified" depending on the stage; they never stop the stream.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("pair cannot be empty")]
    EmptyPair,

    #[error("price must be positive: {0}")]
    NonPositivePrice(String),

    #[error("quantity cannot be negative: {0}")]
    NegativeQuantity(String),

    #[error("timestamp {timestamp_ms} outside accepted range [{min_ms}, {max_ms}]")]
    TimestampOutOfRange {
        timestamp_ms: i64,
        min_ms: i64,
        max_ms: i64,
    },

    #[error("high {high} cannot be less than low {low}")]
    HighBelowLow { high: String, low: String },

    #[error("{field} {value} must be between low {low} and high {high}")]
    PriceOutsideRange {
        field: &'static str,
        value: String,
        low: String,
        high: String,
    },

    #[error("window end {end_ms} must be after window start {start_ms}")]
    InvalidWindow { start_ms: i64, end_ms: i64 },

    #[error("window width {actual_ms}ms does not match candle_seconds {candle_seconds}")]
    WindowWidthMismatch {
        actual_ms: i64,
        candle_seconds: u32,
    },

    #[error("prediction value must be positive: {0}")]
    NonPositivePrediction(f64),

    #[error("confidence score must be between 0 and 1: {0}")]
    ConfidenceOutOfRange(f64),

    #[error("signal strength must be between -1 and 1: {0}")]
    SignalStrengthOutOfRange(f64),

    #[error("prediction horizon must be positive")]
    NonPositiveHorizon,

    #[error("features used cannot be empty")]
    EmptyFeatures,

    #[error("model name cannot be empty")]
    EmptyModelName,

    #[error("model version cannot be empty")]
    EmptyModelVersion,
}

/// Errors from the Kafka plumbing
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("message has no payload")]
    EmptyPayload,
}
