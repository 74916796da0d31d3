use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use serde::Serialize;
use tracing::debug;

use crate::errors::StreamError;

/// Keyed JSON producer
///
/// Each `send` awaits broker acknowledgement before returning, so the
/// read rate of the upstream source is naturally throttled by the sink.
pub struct JsonProducer {
    inner: FutureProducer,
}

impl JsonProducer {
    pub fn new(broker_address: &str) -> Result<Self, StreamError> {
        let inner = ClientConfig::new()
            .set("bootstrap.servers", broker_address)
            .set("message.timeout.ms", "30000")
            .create()?;
        Ok(Self { inner })
    }

    /// Serialize `value` as JSON and produce it keyed by `key`
    pub async fn send<T: Serialize>(
        &self,
        topic: &str,
        key: &str,
        value: &T,
    ) -> Result<(), StreamError> {
        let payload = serde_json::to_vec(value)?;
        self.inner
            .send(
                FutureRecord::to(topic).key(key).payload(&payload),
                Timeout::After(Duration::from_secs(30)),
            )
            .await
            .map_err(|(err, _msg)| StreamError::Kafka(err))?;
        debug!(topic, key, "produced record");
        Ok(())
    }

    /// Flush outstanding deliveries, bounded by `timeout`
    pub fn flush(&self, timeout: Duration) -> Result<(), StreamError> {
        self.inner.flush(timeout)?;
        Ok(())
    }
}
