//! Predictions service configuration (environment prefix `PREDICTIONS_`)

use services_common::{ConfigError, EnvLoader, LogFormat, LogLevel, ProcessingMode};

use crate::model::RsiThresholdModel;

/// Immutable service settings, validated at startup
#[derive(Debug, Clone)]
pub struct Settings {
    pub app_name: String,
    pub log_level: LogLevel,
    pub log_format: LogFormat,
    pub kafka_broker_address: String,
    pub kafka_input_topic: String,
    pub kafka_output_topic: String,
    pub kafka_consumer_group: String,
    pub candle_seconds: u32,
    pub processing_mode: ProcessingMode,
    pub model_name: String,
    pub model_version: String,
    pub prediction_horizon_seconds: u32,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let env = EnvLoader::new("PREDICTIONS");

        let settings = Self {
            app_name: env.app_name("APP_NAME", "predictions")?,
            log_level: env.parse("LOG_LEVEL", LogLevel::Info)?,
            log_format: env.parse("LOG_FORMAT", LogFormat::Json)?,
            kafka_broker_address: env.broker_address("KAFKA_BROKER_ADDRESS", "localhost:9092")?,
            kafka_input_topic: env.topic("KAFKA_INPUT_TOPIC", "technical_indicators")?,
            kafka_output_topic: env.topic("KAFKA_OUTPUT_TOPIC", "predictions")?,
            kafka_consumer_group: env
                .consumer_group("KAFKA_CONSUMER_GROUP", "predictions_consumer_group")?,
            candle_seconds: env.int_in_range("CANDLE_SECONDS", 60, 1, 86_400)? as u32,
            processing_mode: env.parse("PROCESSING_MODE", ProcessingMode::Live)?,
            model_name: env.app_name("MODEL_NAME", RsiThresholdModel::NAME)?,
            model_version: env.string("MODEL_VERSION", "1.0.0"),
            prediction_horizon_seconds: env
                .int_in_range("PREDICTION_HORIZON_SECONDS", 300, 1, 86_400)?
                as u32,
        };

        if settings.model_name != RsiThresholdModel::NAME {
            return Err(ConfigError::invalid(
                "PREDICTIONS_MODEL_NAME",
                format!(
                    "unknown model `{}` (available: {})",
                    settings.model_name,
                    RsiThresholdModel::NAME
                ),
            ));
        }

        Ok(settings)
    }

    /// Horizon in whole minutes, as carried on the prediction record
    pub fn prediction_horizon_minutes(&self) -> u32 {
        (self.prediction_horizon_seconds / 60).max(1)
    }
}
