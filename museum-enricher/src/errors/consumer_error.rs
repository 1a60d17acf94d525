//! Consumer error types.

use thiserror::Error;

/// Errors raised by the notification source and its reader.
#[derive(Error, Debug)]
pub enum ConsumerError {
    /// The broker client reported an error.
    #[error("Kafka error: {0}")]
    KafkaError(String),

    /// The reader was closed; no further messages will arrive.
    #[error("Reader closed")]
    Closed,

    /// The operation is not allowed in the consumer's current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Acknowledging a message failed.
    #[error("Commit error: {0}")]
    CommitError(String),
}

impl ConsumerError {
    /// Create a Kafka error.
    pub fn kafka(msg: impl Into<String>) -> Self {
        Self::KafkaError(msg.into())
    }

    /// Create an invalid state error.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Create a commit error.
    pub fn commit(msg: impl Into<String>) -> Self {
        Self::CommitError(msg.into())
    }
}

impl From<rdkafka::error::KafkaError> for ConsumerError {
    fn from(err: rdkafka::error::KafkaError) -> Self {
        Self::KafkaError(err.to_string())
    }
}
