//! Error types for the publisher.

use station_stream_provision::ProvisionError;
use thiserror::Error;

/// Construction-time publisher failures.
#[derive(Error, Debug)]
pub enum PublisherError {
    /// The target topic could not be provisioned.
    #[error(transparent)]
    Provision(#[from] ProvisionError),

    /// The underlying producer could not be created.
    #[error("failed to create producer: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),
}

/// Per-record send failures.
#[derive(Error, Debug)]
pub enum SendError {
    /// `send` was called after `close`; a programming error in the caller.
    #[error("publisher is closed")]
    Closed,

    /// Serialization or transport failure. The caller decides whether the
    /// record is retried.
    #[error("delivery failed: {0}")]
    DeliveryFailed(String),
}
