//! Kafka plumbing shared by every service
//!
//! Thin wrappers over rdkafka with the pipeline's delivery contract baked
//! in: keyed JSON produce awaited per record, manual offset commit after a
//! record's outputs are on the wire (at-least-once).

mod consumer;
mod producer;

pub use consumer::JsonConsumer;
pub use producer::JsonProducer;
pub use rdkafka::message::BorrowedMessage;
