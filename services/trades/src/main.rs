//! Trades Ingestion Service
//!
//! Streams normalized trades from Kraken into the trades topic, keyed by
//! pair. Live mode holds a websocket subscription open indefinitely;
//! historical mode backfills the configured number of days over REST and
//! exits when every pair has caught up.

use anyhow::{Context, Result};
use services_common::shutdown::{shutdown_signal, DRAIN_DEADLINE};
use services_common::{logging, JsonProducer, ProcessingMode};
use tracing::{debug, error, info};
use trades::kraken::{KrakenRestClient, KrakenWebsocket};
use trades::{Settings, TradeSource};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let settings = Settings::load().context("invalid configuration")?;
    logging::init(settings.log_level, settings.log_format);

    info!(
        app_name = %settings.app_name,
        mode = %settings.processing_mode,
        broker = %settings.kafka_broker_address,
        topic = %settings.kafka_output_topic,
        pairs = ?settings.product_ids,
        "starting trades service"
    );

    let producer = JsonProducer::new(&settings.kafka_broker_address)
        .context("failed to create Kafka producer")?;

    let mut source: Box<dyn TradeSource> = match settings.processing_mode {
        ProcessingMode::Live => Box::new(
            KrakenWebsocket::connect(settings.product_ids.clone())
                .await
                .context("failed to subscribe to Kraken websocket")?,
        ),
        ProcessingMode::Historical => Box::new(KrakenRestClient::new(
            settings.product_ids.clone(),
            settings.last_n_days,
        )),
    };

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        if source.is_done() {
            info!("source exhausted, ingestion complete");
            break;
        }

        tokio::select! {
            _ = &mut shutdown => break,
            result = source.get_trades() => {
                let trades = match result {
                    Ok(trades) => trades,
                    Err(err) => {
                        error!(%err, "trade source failed");
                        continue;
                    }
                };
                for trade in trades {
                    debug!(pair = %trade.pair, timestamp_ms = trade.timestamp_ms, "ingested trade");
                    if let Err(err) = producer
                        .send(&settings.kafka_output_topic, &trade.pair, &trade)
                        .await
                    {
                        error!(%err, pair = %trade.pair, "failed to produce trade");
                    }
                }
            }
        }
    }

    source.close().await;
    producer
        .flush(DRAIN_DEADLINE)
        .context("failed to flush producer on shutdown")?;
    info!("trades service stopped");
    Ok(())
}
