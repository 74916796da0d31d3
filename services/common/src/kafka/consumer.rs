use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Message};
use serde::de::DeserializeOwned;

use crate::config::ProcessingMode;
use crate::errors::StreamError;

/// JSON topic consumer with manual offset management
///
/// Offsets are committed by the caller only after a record's outputs have
/// been produced, which gives at-least-once delivery: after a crash the
/// last uncommitted batch is replayed.
pub struct JsonConsumer {
    inner: StreamConsumer,
}

impl JsonConsumer {
    /// Create a consumer whose starting position follows the processing
    /// mode: `historical` reads the topic from the earliest offset
    pub fn new(
        broker_address: &str,
        consumer_group: &str,
        mode: ProcessingMode,
    ) -> Result<Self, StreamError> {
        Self::with_offset_reset(broker_address, consumer_group, mode.offset_reset())
    }

    /// Create a consumer with an explicit `auto.offset.reset` policy
    pub fn with_offset_reset(
        broker_address: &str,
        consumer_group: &str,
        offset_reset: &str,
    ) -> Result<Self, StreamError> {
        let inner = ClientConfig::new()
            .set("bootstrap.servers", broker_address)
            .set("group.id", consumer_group)
            .set("enable.auto.commit", "false")
            .set("enable.partition.eof", "false")
            .set("auto.offset.reset", offset_reset)
            .set("session.timeout.ms", "6000")
            .create()?;
        Ok(Self { inner })
    }

    pub fn subscribe(&self, topic: &str) -> Result<(), StreamError> {
        self.inner.subscribe(&[topic])?;
        Ok(())
    }

    /// Await the next message from the subscribed topic
    pub async fn recv(&self) -> Result<BorrowedMessage<'_>, StreamError> {
        Ok(self.inner.recv().await?)
    }

    /// Commit the message's offset after its outputs are on the wire
    pub fn commit(&self, message: &BorrowedMessage<'_>) -> Result<(), StreamError> {
        self.inner.commit_message(message, CommitMode::Async)?;
        Ok(())
    }

    /// Deserialize the message payload as JSON
    pub fn decode<T: DeserializeOwned>(message: &BorrowedMessage<'_>) -> Result<T, StreamError> {
        let payload = message.payload().ok_or(StreamError::EmptyPayload)?;
        Ok(serde_json::from_slice(payload)?)
    }

    /// The record key as UTF-8, if present
    pub fn key_of<'a>(message: &'a BorrowedMessage<'_>) -> Option<&'a str> {
        message.key().and_then(|k| std::str::from_utf8(k).ok())
    }
}
