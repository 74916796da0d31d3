//! Technical-indicators service configuration
//! (environment prefix `TECHNICAL_INDICATORS_`)

use services_common::{ConfigError, EnvLoader, LogFormat, LogLevel, ProcessingMode};

use crate::indicators::IndicatorPeriods;
use crate::sink::RisingWaveConfig;

const DEFAULT_PERIODS: [usize; 4] = [7, 14, 21, 60];

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
    pub max_candles_in_state: usize,
    pub processing_mode: ProcessingMode,
    pub sma_periods: Vec<usize>,
    pub ema_periods: Vec<usize>,
    pub rsi_periods: Vec<usize>,
    pub table_name_in_risingwave: String,
    pub risingwave: RisingWaveConfig,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let env = EnvLoader::new("TECHNICAL_INDICATORS");

        Ok(Self {
            app_name: env.app_name("APP_NAME", "technical-indicators")?,
            log_level: env.parse("LOG_LEVEL", LogLevel::Info)?,
            log_format: env.parse("LOG_FORMAT", LogFormat::Json)?,
            kafka_broker_address: env.broker_address("KAFKA_BROKER_ADDRESS", "localhost:9092")?,
            kafka_input_topic: env.topic("KAFKA_INPUT_TOPIC", "candles")?,
            kafka_output_topic: env.topic("KAFKA_OUTPUT_TOPIC", "technical_indicators")?,
            kafka_consumer_group: env
                .consumer_group("KAFKA_CONSUMER_GROUP", "technical_indicators_consumer_group")?,
            candle_seconds: env.int_in_range("CANDLE_SECONDS", 60, 1, 86_400)? as u32,
            max_candles_in_state: env.int_in_range("MAX_CANDLES_IN_STATE", 70, 1, 10_000)? as usize,
            processing_mode: env.parse("PROCESSING_MODE", ProcessingMode::Live)?,
            sma_periods: env.periods("SMA_PERIODS", &DEFAULT_PERIODS)?,
            ema_periods: env.periods("EMA_PERIODS", &DEFAULT_PERIODS)?,
            rsi_periods: env.periods("RSI_PERIODS", &DEFAULT_PERIODS)?,
            table_name_in_risingwave: env
                .table_name("TABLE_NAME_IN_RISINGWAVE", "technical_indicators")?,
            risingwave: RisingWaveConfig {
                host: env.string("RISINGWAVE_HOST", "localhost"),
                port: env.int_in_range("RISINGWAVE_PORT", 4567, 1, 65_535)? as u16,
                user: env.string("RISINGWAVE_USER", "root"),
                password: env.string("RISINGWAVE_PASSWORD", ""),
                database: env.string("RISINGWAVE_DATABASE", "dev"),
            },
        })
    }

    pub fn indicator_periods(&self) -> IndicatorPeriods {
        IndicatorPeriods {
            sma: self.sma_periods.clone(),
            ema: self.ema_periods.clone(),
            rsi: self.rsi_periods.clone(),
        }
    }
}
