//! Predictions service
//!
//! Applies a pluggable model to each indicator record and emits a
//! prediction per record. Stateless: a model failure suppresses the
//! record's output and the stream continues.

pub mod config;
pub mod model;
pub mod service;

pub use config::Settings;
pub use model::{ModelError, ModelOutput, PredictionModel, RsiThresholdModel};
