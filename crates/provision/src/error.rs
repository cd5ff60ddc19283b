//! Error types for topic provisioning.

use thiserror::Error;

/// Errors that can occur while ensuring a topic exists.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// The broker metadata query or admin request failed or timed out.
    /// Retrying with backoff is the caller's decision.
    #[error("broker unreachable: {0}")]
    Unreachable(String),

    /// The broker rejected the create-topic request, e.g. another caller
    /// created the topic first or the replication factor exceeds the
    /// cluster size.
    #[error("failed to create topic {topic}: {reason}")]
    CreateFailed { topic: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
