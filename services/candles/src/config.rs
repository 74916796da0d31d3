//! Candles service configuration (environment prefix `CANDLES_`)

use services_common::{ConfigError, EnvLoader, LogFormat, LogLevel, ProcessingMode};

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
    /// Emit a "current" snapshot after every update (`true`, the
    /// default) or only one final candle per window at rollover
    pub emit_intermediate: bool,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let env = EnvLoader::new("CANDLES");

        Ok(Self {
            app_name: env.app_name("APP_NAME", "candles")?,
            log_level: env.parse("LOG_LEVEL", LogLevel::Info)?,
            log_format: env.parse("LOG_FORMAT", LogFormat::Json)?,
            kafka_broker_address: env.broker_address("KAFKA_BROKER_ADDRESS", "localhost:9092")?,
            kafka_input_topic: env.topic("KAFKA_INPUT_TOPIC", "trades")?,
            kafka_output_topic: env.topic("KAFKA_OUTPUT_TOPIC", "candles")?,
            kafka_consumer_group: env.consumer_group("KAFKA_CONSUMER_GROUP", "candles_consumer_group")?,
            candle_seconds: env.int_in_range("CANDLE_SECONDS", 60, 1, 86_400)? as u32,
            processing_mode: env.parse("PROCESSING_MODE", ProcessingMode::Live)?,
            emit_intermediate: env.bool("EMIT_INTERMEDIATE", true)?,
        })
    }
}
