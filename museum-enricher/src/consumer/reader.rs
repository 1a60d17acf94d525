//! Reader and iterator traits for the notification source.

use async_trait::async_trait;

use super::messages::SourceMessage;
use crate::errors::ConsumerError;

/// Low-level broker reader.
///
/// `read_message` returns [`ConsumerError::Closed`] once the reader has been
/// closed; any other error is treated as transient by the consumer loop.
#[async_trait]
pub trait MessageReader: Send + Sync {
    /// Wait for the next message.
    async fn read_message(&self) -> Result<SourceMessage, ConsumerError>;

    /// Acknowledge `message` and everything before it on its partition.
    async fn commit(&self, message: &SourceMessage) -> Result<(), ConsumerError>;

    /// Release the underlying connection.
    async fn close(&self) -> Result<(), ConsumerError>;
}

/// Pull-based view of a running consumer.
#[async_trait]
pub trait MessageIterator: Send + Sync {
    /// The next message, or `None` once the consumer has stopped.
    async fn next_message(&mut self) -> Option<SourceMessage>;

    /// Commit the offset of a message previously returned by `next_message`.
    async fn commit_offset(&self, message: &SourceMessage) -> Result<(), ConsumerError>;
}
