//! Candles Service
//!
//! Consumes trades, folds them into tumbling event-time windows and
//! produces OHLCV candles. Historical mode reads the trades topic from
//! its earliest offset.

use anyhow::{Context, Result};
use candles::{CandleAggregator, Settings};
use services_common::shutdown::{shutdown_signal, DRAIN_DEADLINE};
use services_common::{logging, Candle, JsonConsumer, JsonProducer, Trade};
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
        emit_intermediate = settings.emit_intermediate,
        "starting candles service"
    );

    let consumer = JsonConsumer::new(
        &settings.kafka_broker_address,
        &settings.kafka_consumer_group,
        settings.processing_mode,
    )
    .context("failed to create Kafka consumer")?;
    consumer
        .subscribe(&settings.kafka_input_topic)
        .context("failed to subscribe to trades topic")?;

    let producer = JsonProducer::new(&settings.kafka_broker_address)
        .context("failed to create Kafka producer")?;

    let mut aggregator = CandleAggregator::new(settings.candle_seconds, settings.emit_intermediate);

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

                let trade: Trade = match JsonConsumer::decode(&message) {
                    Ok(trade) => trade,
                    Err(err) => {
                        warn!(%err, "dropping malformed trade message");
                        commit(&consumer, &message);
                        continue;
                    }
                };

                // Validation is advisory here: a suspicious trade is
                // logged and still aggregated.
                let now_ms = chrono::Utc::now().timestamp_millis();
                if let Err(err) = trade.validate(now_ms) {
                    warn!(%err, pair = %trade.pair, "trade failed validation, processing anyway");
                }

                for candle in aggregator.process_trade(&trade) {
                    emit(&producer, &settings.kafka_output_topic, &candle).await;
                }

                commit(&consumer, &message);
            }
        }
    }

    // With intermediate emission disabled the open buckets have never
    // been emitted; flush them before exiting.
    if !settings.emit_intermediate {
        for candle in aggregator.drain() {
            emit(&producer, &settings.kafka_output_topic, &candle).await;
        }
    }

    producer
        .flush(DRAIN_DEADLINE)
        .context("failed to flush producer on shutdown")?;
    info!("candles service stopped");
    Ok(())
}

/// Produce one candle, logging but never propagating validation failures
async fn emit(producer: &JsonProducer, topic: &str, candle: &Candle) {
    if let Err(err) = candle.validate() {
        error!(
            %err,
            pair = %candle.pair,
            window_start_ms = candle.window_start_ms,
            "candle failed validation, emitting unvalidated record"
        );
    }
    debug!(
        pair = %candle.pair,
        window_start_ms = candle.window_start_ms,
        close = %candle.close,
        "emitting candle"
    );
    if let Err(err) = producer.send(topic, &candle.pair, candle).await {
        error!(%err, pair = %candle.pair, "failed to produce candle");
    }
}

fn commit(consumer: &JsonConsumer, message: &services_common::kafka::BorrowedMessage<'_>) {
    if let Err(err) = consumer.commit(message) {
        error!(%err, "failed to commit offset");
    }
}
