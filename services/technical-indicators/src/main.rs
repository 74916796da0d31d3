//! Technical Indicators Service
//!
//! Consumes candles, maintains a bounded per-pair history and produces
//! one enriched indicator record per accepted candle. On startup it
//! binds a RisingWave table to the output topic (schema-on-write) so the
//! indicator stream is queryable as a SQL table.

use anyhow::{Context, Result};
use services_common::shutdown::{shutdown_signal, DRAIN_DEADLINE};
use services_common::{logging, Candle, JsonConsumer, JsonProducer};
use technical_indicators::{sink, IndicatorEngine, Settings};
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let settings = Settings::load().context("invalid configuration")?;
    logging::init(settings.log_level, settings.log_format);

    info!(
        app_name = %settings.app_name,
        mode = %settings.processing_mode,
        broker = %settings.kafka_broker_address,
        input_topic = %settings.kafka_input_topic,
        output_topic = %settings.kafka_output_topic,
        consumer_group = %settings.kafka_consumer_group,
        candle_seconds = settings.candle_seconds,
        max_candles_in_state = settings.max_candles_in_state,
        table_name = %settings.table_name_in_risingwave,
        "starting technical indicators service"
    );

    // Sink-store failure is logged and non-fatal: the topic emission
    // continues without the SQL mirror.
    match sink::ensure_table(
        &settings.risingwave,
        &settings.table_name_in_risingwave,
        &settings.kafka_broker_address,
        &settings.kafka_output_topic,
        &settings.indicator_periods(),
    )
    .await
    {
        Ok(_) => info!(
            table_name = %settings.table_name_in_risingwave,
            "indicator table is ready for ingestion"
        ),
        Err(err) => warn!(
            %err,
            "RisingWave table initialization failed, continuing without the SQL mirror"
        ),
    }

    // The buffer reconstitutes by replaying the candles topic, so the
    // consumer always starts from the earliest offset.
    let consumer = JsonConsumer::with_offset_reset(
        &settings.kafka_broker_address,
        &settings.kafka_consumer_group,
        "earliest",
    )
    .context("failed to create Kafka consumer")?;
    consumer
        .subscribe(&settings.kafka_input_topic)
        .context("failed to subscribe to candles topic")?;

    let producer = JsonProducer::new(&settings.kafka_broker_address)
        .context("failed to create Kafka producer")?;

    let mut engine = IndicatorEngine::new(
        settings.candle_seconds,
        settings.max_candles_in_state,
        settings.indicator_periods(),
    );

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            received = consumer.recv() => {
                let message = match received {
                    Ok(message) => message,
                    Err(err) => {
                        error!(%err, "consumer error, retrying");
                        continue;
                    }
                };

                let candle: Candle = match JsonConsumer::decode(&message) {
                    Ok(candle) => candle,
                    Err(err) => {
                        warn!(%err, "dropping malformed candle message");
                        if let Err(err) = consumer.commit(&message) {
                            error!(%err, "failed to commit offset");
                        }
                        continue;
                    }
                };

                if let Some(record) = engine.process_candle(&candle) {
                    debug!(
                        pair = %record.pair,
                        window_start_ms = record.window_start_ms,
                        indicators = record.indicators.len(),
                        "emitting indicator record"
                    );
                    if let Err(err) = producer
                        .send(&settings.kafka_output_topic, &record.pair, &record)
                        .await
                    {
                        error!(%err, pair = %record.pair, "failed to produce indicator record");
                    }
                }

                if let Err(err) = consumer.commit(&message) {
                    error!(%err, "failed to commit offset");
                }
            }
        }
    }

    producer
        .flush(DRAIN_DEADLINE)
        .context("failed to flush producer on shutdown")?;
    info!("technical indicators service stopped");
    Ok(())
}
