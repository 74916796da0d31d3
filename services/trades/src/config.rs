//! Trades service configuration (environment prefix `TRADES_`)

use services_common::{ConfigError, EnvLoader, LogFormat, LogLevel, ProcessingMode};

/// Immutable service settings, validated at startup
#[derive(Debug, Clone)]
pub struct Settings {
    pub app_name: String,
    pub log_level: LogLevel,
    pub log_format: LogFormat,
    pub kafka_broker_address: String,
    pub kafka_output_topic: String,
    pub processing_mode: ProcessingMode,
    pub product_ids: Vec<String>,
    pub last_n_days: u32,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let env = EnvLoader::new("TRADES");

        let settings = Self {
            app_name: env.app_name("APP_NAME", "trades")?,
            log_level: env.parse("LOG_LEVEL", LogLevel::Info)?,
            log_format: env.parse("LOG_FORMAT", LogFormat::Json)?,
            kafka_broker_address: env.broker_address("KAFKA_BROKER_ADDRESS", "localhost:9092")?,
            kafka_output_topic: env.topic("KAFKA_OUTPUT_TOPIC", "trades")?,
            processing_mode: env.parse("PROCESSING_MODE", ProcessingMode::Live)?,
            product_ids: env.product_ids("PRODUCT_IDS", &["BTC/USD"])?,
            last_n_days: env.int_in_range("LAST_N_DAYS", 1, 1, 3650)? as u32,
        };

        Ok(settings)
    }
}
