//! Predictions Service
//!
//! Consumes indicator records, applies the configured model and produces
//! predictions keyed by pair. Model failures suppress the affected
//! record's output only; the stream never stalls.

use anyhow::{Context, Result};
use predictions::{service, RsiThresholdModel, Settings};
use services_common::shutdown::{shutdown_signal, DRAIN_DEADLINE};
use services_common::{logging, IndicatorRecord, JsonConsumer, JsonProducer};
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
        model_name = %settings.model_name,
        model_version = %settings.model_version,
        prediction_horizon_seconds = settings.prediction_horizon_seconds,
        "starting predictions service"
    );

    let model = RsiThresholdModel::new(
        settings.model_version.clone(),
        settings.prediction_horizon_minutes(),
    );

    let consumer = JsonConsumer::new(
        &settings.kafka_broker_address,
        &settings.kafka_consumer_group,
        settings.processing_mode,
    )
    .context("failed to create Kafka consumer")?;
    consumer
        .subscribe(&settings.kafka_input_topic)
        .context("failed to subscribe to indicators topic")?;

    let producer = JsonProducer::new(&settings.kafka_broker_address)
        .context("failed to create Kafka producer")?;

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

                let record: IndicatorRecord = match JsonConsumer::decode(&message) {
                    Ok(record) => record,
                    Err(err) => {
                        warn!(%err, "dropping malformed indicator message");
                        if let Err(err) = consumer.commit(&message) {
                            error!(%err, "failed to commit offset");
                        }
                        continue;
                    }
                };

                if record.candle_seconds != settings.candle_seconds {
                    debug!(
                        pair = %record.pair,
                        candle_seconds = record.candle_seconds,
                        "filtering out record with mismatched interval"
                    );
                    if let Err(err) = consumer.commit(&message) {
                        error!(%err, "failed to commit offset");
                    }
                    continue;
                }

                service::validate_record_optional(&record);

                let now_ms = chrono::Utc::now().timestamp_millis();
                if let Some(prediction) = service::predict_one(&model, &record, now_ms) {
                    debug!(
                        pair = %prediction.pair,
                        prediction_value = prediction.prediction_value,
                        confidence = prediction.confidence_score,
                        "emitting prediction"
                    );
                    if let Err(err) = producer
                        .send(&settings.kafka_output_topic, &prediction.pair, &prediction)
                        .await
                    {
                        error!(%err, pair = %prediction.pair, "failed to produce prediction");
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
    info!("predictions service stopped");
    Ok(())
}
