//! Environment-based configuration primitives
//!
//! Each service builds a single immutable `Settings` struct at startup from
//! environment variables carrying that service's prefix (e.g. `TRADES_`,
//! `CANDLES_`). Every accessor validates its value; any failure is a
//! [`ConfigError`] and fatal to the process.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::ConfigError;

static BROKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9\-\.]+:\d+$").unwrap());
static TOPIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9\-_\.]+$").unwrap());
static CONSUMER_GROUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9\-_]+$").unwrap());
static APP_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9\-_]+$").unwrap());
static PAIR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{2,10}[/\-]?[A-Z0-9]{2,10}$").unwrap());
static TABLE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_]*$").unwrap());

/// Log verbosity levels recognized by `LOG_LEVEL`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    ///
    /// `CRITICAL` has no tracing counterpart and maps to `error`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" => Ok(LogLevel::Critical),
            other => Err(format!(
                "must be one of DEBUG, INFO, WARNING, ERROR, CRITICAL (got `{other}`)"
            )),
        }
    }
}

/// Log output format recognized by `LOG_FORMAT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" => Ok(LogFormat::Text),
            other => Err(format!("must be either `json` or `text` (got `{other}`)")),
        }
    }
}

/// Processing mode recognized by `PROCESSING_MODE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingMode {
    Live,
    Historical,
}

impl ProcessingMode {
    /// Consumer starting position for this mode
    pub fn offset_reset(&self) -> &'static str {
        match self {
            ProcessingMode::Live => "latest",
            ProcessingMode::Historical => "earliest",
        }
    }
}

impl FromStr for ProcessingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "live" => Ok(ProcessingMode::Live),
            "historical" => Ok(ProcessingMode::Historical),
            other => Err(format!(
                "must be either `live` or `historical` (got `{other}`)"
            )),
        }
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingMode::Live => write!(f, "live"),
            ProcessingMode::Historical => write!(f, "historical"),
        }
    }
}

/// Reads prefixed environment variables with typed, validated accessors
///
/// ```no_run
/// use services_common::config::EnvLoader;
///
/// let env = EnvLoader::new("TRADES");
/// let broker = env.broker_address("KAFKA_BROKER_ADDRESS", "localhost:9092")?;
/// # Ok::<(), services_common::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct EnvLoader {
    prefix: String,
}

impl EnvLoader {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.trim_end_matches('_').to_string(),
        }
    }

    fn key(&self, name: &str) -> String {
        format!("{}_{}", self.prefix, name)
    }

    fn raw(&self, name: &str) -> Option<String> {
        std::env::var(self.key(name)).ok().filter(|v| !v.is_empty())
    }

    /// Plain string with a default, no validation
    pub fn string(&self, name: &str, default: &str) -> String {
        self.raw(name).unwrap_or_else(|| default.to_string())
    }

    /// Any `FromStr` value with a default
    pub fn parse<T>(&self, name: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.raw(name) {
            None => Ok(default),
            Some(v) => v
                .parse::<T>()
                .map_err(|e| ConfigError::invalid(self.key(name), e.to_string())),
        }
    }

    /// Integer constrained to an inclusive range
    pub fn int_in_range(
        &self,
        name: &str,
        default: i64,
        min: i64,
        max: i64,
    ) -> Result<i64, ConfigError> {
        let value = self.parse(name, default)?;
        if value < min || value > max {
            return Err(ConfigError::invalid(
                self.key(name),
                format!("must be between {min} and {max} (got {value})"),
            ));
        }
        Ok(value)
    }

    /// Boolean accepting `true/false/1/0` (case-insensitive)
    pub fn bool(&self, name: &str, default: bool) -> Result<bool, ConfigError> {
        match self.raw(name) {
            None => Ok(default),
            Some(v) => match v.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                other => Err(ConfigError::invalid(
                    self.key(name),
                    format!("must be a boolean (got `{other}`)"),
                )),
            },
        }
    }

    /// Application name: 1-100 chars, alphanumeric plus `-` and `_`
    pub fn app_name(&self, name: &str, default: &str) -> Result<String, ConfigError> {
        let value = self.string(name, default);
        if value.is_empty() || value.len() > 100 || !APP_NAME_RE.is_match(&value) {
            return Err(ConfigError::invalid(
                self.key(name),
                "must be 1-100 alphanumeric/hyphen/underscore characters",
            ));
        }
        Ok(value)
    }

    /// Kafka broker address in `host:port` form with a valid port
    pub fn broker_address(&self, name: &str, default: &str) -> Result<String, ConfigError> {
        let value = self.string(name, default);
        if !BROKER_RE.is_match(&value) {
            return Err(ConfigError::invalid(
                self.key(name),
                "must be in `host:port` format",
            ));
        }
        let port: u32 = value
            .rsplit(':')
            .next()
            .and_then(|p| p.parse().ok())
            .unwrap_or(0);
        if !(1..=65535).contains(&port) {
            return Err(ConfigError::invalid(
                self.key(name),
                "port must be between 1 and 65535",
            ));
        }
        Ok(value)
    }

    /// Kafka topic name: 1-255 chars, no leading `.` or `_`
    pub fn topic(&self, name: &str, default: &str) -> Result<String, ConfigError> {
        let value = self.string(name, default);
        if value.is_empty()
            || value.len() > 255
            || value.starts_with('.')
            || value.starts_with('_')
            || !TOPIC_RE.is_match(&value)
        {
            return Err(ConfigError::invalid(
                self.key(name),
                "topic must be 1-255 alphanumeric/hyphen/underscore/dot characters \
                 and cannot start with `.` or `_`",
            ));
        }
        Ok(value)
    }

    /// Kafka consumer group: 1-255 chars, alphanumeric plus `-` and `_`
    pub fn consumer_group(&self, name: &str, default: &str) -> Result<String, ConfigError> {
        let value = self.string(name, default);
        if value.is_empty() || value.len() > 255 || !CONSUMER_GROUP_RE.is_match(&value) {
            return Err(ConfigError::invalid(
                self.key(name),
                "consumer group must be 1-255 alphanumeric/hyphen/underscore characters",
            ));
        }
        Ok(value)
    }

    /// Comma-separated trading pairs, validated and upper-cased
    pub fn product_ids(&self, name: &str, default: &[&str]) -> Result<Vec<String>, ConfigError> {
        let raw = match self.raw(name) {
            Some(v) => v,
            None => return Ok(default.iter().map(|s| s.to_string()).collect()),
        };
        let pairs: Vec<String> = raw
            .split(',')
            .map(|p| p.trim().to_ascii_uppercase())
            .filter(|p| !p.is_empty())
            .collect();
        if pairs.is_empty() {
            return Err(ConfigError::invalid(self.key(name), "cannot be empty"));
        }
        for pair in &pairs {
            if !PAIR_RE.is_match(pair) {
                return Err(ConfigError::invalid(
                    self.key(name),
                    format!("`{pair}` is not a valid trading pair"),
                ));
            }
        }
        Ok(pairs)
    }

    /// Comma-separated positive integer periods, deduped and sorted
    pub fn periods(&self, name: &str, default: &[usize]) -> Result<Vec<usize>, ConfigError> {
        let mut periods: Vec<usize> = match self.raw(name) {
            None => default.to_vec(),
            Some(raw) => {
                let mut out = Vec::new();
                for part in raw.split(',') {
                    let part = part.trim();
                    if part.is_empty() {
                        continue;
                    }
                    let period: usize = part.parse().map_err(|_| {
                        ConfigError::invalid(
                            self.key(name),
                            "periods must be comma-separated integers",
                        )
                    })?;
                    out.push(period);
                }
                out
            }
        };
        if periods.is_empty() {
            return Err(ConfigError::invalid(
                self.key(name),
                "periods list cannot be empty",
            ));
        }
        if periods.iter().any(|&p| p == 0) {
            return Err(ConfigError::invalid(
                self.key(name),
                "all periods must be positive integers",
            ));
        }
        periods.sort_unstable();
        periods.dedup();
        Ok(periods)
    }

    /// SQL table name: starts with a letter, 1-63 chars
    pub fn table_name(&self, name: &str, default: &str) -> Result<String, ConfigError> {
        let value = self.string(name, default);
        if value.is_empty() || value.len() > 63 || !TABLE_NAME_RE.is_match(&value) {
            return Err(ConfigError::invalid(
                self.key(name),
                "table name must start with a letter and contain only \
                 alphanumerics and underscores (max 63 chars)",
            ));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader(prefix: &str) -> EnvLoader {
        EnvLoader::new(prefix)
    }

    #[test]
    fn log_level_parses_case_insensitively() {
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn critical_maps_to_error_filter() {
        assert_eq!(LogLevel::Critical.as_filter(), "error");
    }

    #[test]
    fn processing_mode_selects_offset_reset() {
        assert_eq!(ProcessingMode::Live.offset_reset(), "latest");
        assert_eq!(ProcessingMode::Historical.offset_reset(), "earliest");
    }

    #[test]
    fn broker_address_rejects_missing_port() {
        // Prefixes are unique per test: env vars are process-global.
        unsafe { std::env::set_var("T1_KAFKA_BROKER_ADDRESS", "localhost") };
        assert!(
            loader("T1")
                .broker_address("KAFKA_BROKER_ADDRESS", "localhost:9092")
                .is_err()
        );
    }

    #[test]
    fn broker_address_defaults_when_unset() {
        let broker = loader("T2")
            .broker_address("KAFKA_BROKER_ADDRESS", "localhost:9092")
            .unwrap();
        assert_eq!(broker, "localhost:9092");
    }

    #[test]
    fn topic_rejects_leading_dot() {
        unsafe { std::env::set_var("T3_KAFKA_OUTPUT_TOPIC", ".trades") };
        assert!(loader("T3").topic("KAFKA_OUTPUT_TOPIC", "trades").is_err());
    }

    #[test]
    fn product_ids_are_uppercased_and_validated() {
        unsafe { std::env::set_var("T4_PRODUCT_IDS", "btc/usd, eth/usd") };
        let pairs = loader("T4").product_ids("PRODUCT_IDS", &["BTC/USD"]).unwrap();
        assert_eq!(pairs, vec!["BTC/USD", "ETH/USD"]);

        unsafe { std::env::set_var("T5_PRODUCT_IDS", "not a pair!!") };
        assert!(loader("T5").product_ids("PRODUCT_IDS", &["BTC/USD"]).is_err());
    }

    #[test]
    fn periods_are_deduped_and_sorted() {
        unsafe { std::env::set_var("T6_SMA_PERIODS", "21,7,14,7") };
        let periods = loader("T6").periods("SMA_PERIODS", &[7, 14, 21, 60]).unwrap();
        assert_eq!(periods, vec![7, 14, 21]);
    }

    #[test]
    fn periods_reject_zero() {
        unsafe { std::env::set_var("T7_SMA_PERIODS", "0,7") };
        assert!(loader("T7").periods("SMA_PERIODS", &[7]).is_err());
    }

    #[test]
    fn int_in_range_enforces_bounds() {
        unsafe { std::env::set_var("T8_CANDLE_SECONDS", "90000") };
        assert!(loader("T8").int_in_range("CANDLE_SECONDS", 60, 1, 86400).is_err());
    }

    #[test]
    fn table_name_rejects_leading_digit() {
        unsafe { std::env::set_var("T9_TABLE_NAME_IN_RISINGWAVE", "1indicators") };
        assert!(
            loader("T9")
                .table_name("TABLE_NAME_IN_RISINGWAVE", "technical_indicators")
                .is_err()
        );
    }
}
