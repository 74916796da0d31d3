//! Shared building blocks for the market-data pipeline services
//!
//! Provides:
//! - Canonical topic record types (`Trade`, `Candle`, `IndicatorRecord`, `Prediction`)
//! - Environment-based configuration primitives with startup validation
//! - Kafka producer/consumer wrappers with at-least-once semantics
//! - Logging and graceful-shutdown helpers

pub mod config;
pub mod errors;
pub mod kafka;
pub mod logging;
pub mod models;
pub mod shutdown;

pub use config::{EnvLoader, LogFormat, LogLevel, ProcessingMode};
pub use errors::{ConfigError, StreamError, ValidationError};
pub use kafka::{JsonConsumer, JsonProducer};
pub use models::{Candle, IndicatorRecord, Prediction, PredictionType, Trade};
