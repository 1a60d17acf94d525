//! Top-level enricher error.

use museum_repository::StorageError;
use thiserror::Error;

use super::{ConsumerError, StepError};

/// Errors that can occur while running the enrichment flow.
#[derive(Error, Debug)]
pub enum EnrichError {
    /// Error from the notification source.
    #[error("Consumer error: {0}")]
    Consumer(#[from] ConsumerError),

    /// Error from the object store.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A notification could not be decoded.
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// A pipeline step failed.
    #[error("Step error: {0}")]
    Step(#[from] StepError),

    /// Channel communication error.
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// The run was cancelled.
    #[error("Enrichment cancelled")]
    Cancelled,
}

impl EnrichError {
    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::DecodeError(msg.into())
    }

    /// Create a channel error.
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::ChannelError(msg.into())
    }
}
