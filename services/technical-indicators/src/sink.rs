//! Streaming-SQL sink integration (RisingWave)
//!
//! RisingWave speaks the Postgres wire protocol. At startup the service
//! issues an idempotent schema-on-write DDL binding a table to the
//! indicators topic; from then on the store ingests the topic by itself.
//! Any failure here is logged and non-fatal: Kafka emission continues
//! without the SQL mirror.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::indicators::IndicatorPeriods;

/// Connection settings for the store
#[derive(Debug, Clone)]
pub struct RisingWaveConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl RisingWaveConfig {
    fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

/// Create the indicator table bound to the Kafka topic if it does not
/// already exist; returns `true` when the table is ready
pub async fn ensure_table(
    config: &RisingWaveConfig,
    table_name: &str,
    kafka_broker_address: &str,
    kafka_topic: &str,
    periods: &IndicatorPeriods,
) -> Result<bool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&config.connection_url())
        .await?;

    probe(&pool).await?;

    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_name = $1)",
    )
    .bind(table_name)
    .fetch_one(&pool)
    .await?;

    if exists {
        info!(table_name, "indicator table already exists");
        pool.close().await;
        return Ok(true);
    }

    let ddl = create_table_sql(table_name, kafka_topic, kafka_broker_address, periods);
    debug!(%ddl, "creating indicator table");
    sqlx::query(&ddl).execute(&pool).await?;
    info!(table_name, kafka_topic, "created indicator table bound to topic");

    pool.close().await;
    Ok(true)
}

/// Basic connectivity check
async fn probe(pool: &PgPool) -> Result<(), sqlx::Error> {
    let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;
    debug!(result = one, "store connectivity check passed");
    Ok(())
}

/// Render the schema-on-write DDL for the configured indicator set
pub fn create_table_sql(
    table_name: &str,
    kafka_topic: &str,
    kafka_broker_address: &str,
    periods: &IndicatorPeriods,
) -> String {
    let mut columns = vec![
        "pair VARCHAR".to_string(),
        "open FLOAT".to_string(),
        "high FLOAT".to_string(),
        "low FLOAT".to_string(),
        "close FLOAT".to_string(),
        "volume FLOAT".to_string(),
        "window_start_ms BIGINT".to_string(),
        "window_end_ms BIGINT".to_string(),
        "candle_seconds INT".to_string(),
    ];
    for period in &periods.sma {
        columns.push(format!("sma_{period} FLOAT"));
    }
    for period in &periods.ema {
        columns.push(format!("ema_{period} FLOAT"));
    }
    for period in &periods.rsi {
        columns.push(format!("rsi_{period} FLOAT"));
    }
    columns.push("macd_7 FLOAT".to_string());
    columns.push("macdsignal_7 FLOAT".to_string());
    columns.push("macdhist_7 FLOAT".to_string());
    columns.push("obv FLOAT".to_string());
    columns.push("PRIMARY KEY (pair, window_start_ms, window_end_ms)".to_string());

    format!(
        "CREATE TABLE {table_name} (\n    {columns}\n) WITH (\n    \
         connector='kafka',\n    topic='{kafka_topic}',\n    \
         properties.bootstrap.server='{kafka_broker_address}'\n) \
         FORMAT PLAIN ENCODE JSON;",
        columns = columns.join(",\n    ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ddl_lists_one_column_per_configured_indicator() {
        let ddl = create_table_sql(
            "technical_indicators",
            "technical_indicators",
            "localhost:9092",
            &IndicatorPeriods::default(),
        );

        assert!(ddl.starts_with("CREATE TABLE technical_indicators ("));
        for period in [7, 14, 21, 60] {
            assert!(ddl.contains(&format!("sma_{period} FLOAT")));
            assert!(ddl.contains(&format!("ema_{period} FLOAT")));
            assert!(ddl.contains(&format!("rsi_{period} FLOAT")));
        }
        assert!(ddl.contains("macd_7 FLOAT"));
        assert!(ddl.contains("macdsignal_7 FLOAT"));
        assert!(ddl.contains("macdhist_7 FLOAT"));
        assert!(ddl.contains("obv FLOAT"));
        assert!(ddl.contains("PRIMARY KEY (pair, window_start_ms, window_end_ms)"));
        assert!(ddl.contains("connector='kafka'"));
        assert!(ddl.contains("topic='technical_indicators'"));
        assert!(ddl.contains("properties.bootstrap.server='localhost:9092'"));
        assert!(ddl.ends_with("FORMAT PLAIN ENCODE JSON;"));
    }

    #[test]
    fn ddl_respects_custom_periods() {
        let periods = IndicatorPeriods {
            sma: vec![5],
            ema: vec![9],
            rsi: vec![14],
        };
        let ddl = create_table_sql("t", "topic", "broker:9092", &periods);
        assert!(ddl.contains("sma_5 FLOAT"));
        assert!(ddl.contains("ema_9 FLOAT"));
        assert!(ddl.contains("rsi_14 FLOAT"));
        assert!(!ddl.contains("sma_7"));
    }

    #[test]
    fn connection_url_includes_all_parts() {
        let config = RisingWaveConfig {
            host: "localhost".into(),
            port: 4567,
            user: "root".into(),
            password: "".into(),
            database: "dev".into(),
        };
        assert_eq!(config.connection_url(), "postgres://root:@localhost:4567/dev");
    }
}
