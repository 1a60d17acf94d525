//! Object ingestion iterator.
//!
//! Turns storage notifications into loaded objects. Messages are handled one
//! at a time and in arrival order; an offset is committed only after its
//! object was handed downstream.

use std::sync::Arc;

use museum_repository::ObjectLoader;
use museum_shared::StreamMessage;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::consumer::{MessageIterator, NotificationEvent, SourceMessage};
use crate::errors::EnrichError;

/// An object loaded in response to a notification.
#[derive(Debug, Clone)]
pub struct FetchedObject<T> {
    pub data: T,
    pub event: NotificationEvent,
}

/// Resolves notifications from a [`MessageIterator`] into objects through an
/// [`ObjectLoader`].
pub struct ObjectIterator<T, M> {
    messages: M,
    loader: Arc<dyn ObjectLoader<T>>,
}

impl<T, M> ObjectIterator<T, M>
where
    T: Send + 'static,
    M: MessageIterator + 'static,
{
    pub fn new(messages: M, loader: Arc<dyn ObjectLoader<T>>) -> Self {
        Self { messages, loader }
    }

    /// Start streaming loaded objects.
    ///
    /// A message that cannot be decoded or whose object cannot be loaded is
    /// logged and skipped without committing its offset. The stream ends with
    /// [`StreamMessage::End`] once the message source is exhausted.
    pub fn objects(self) -> mpsc::Receiver<StreamMessage<FetchedObject<T>>> {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(self.run(tx));
        rx
    }

    async fn run(mut self, tx: mpsc::Sender<StreamMessage<FetchedObject<T>>>) {
        while let Some(message) = self.messages.next_message().await {
            let fetched = match self.fetch(&message).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    warn!(
                        topic = %message.topic,
                        partition = message.partition,
                        offset = message.offset,
                        error = %e,
                        "Skipping notification"
                    );
                    continue;
                }
            };

            if tx.send(StreamMessage::Item(fetched)).await.is_err() {
                warn!("Object stream dropped, stopping iterator");
                return;
            }

            if let Err(e) = self.messages.commit_offset(&message).await {
                error!(
                    topic = %message.topic,
                    partition = message.partition,
                    offset = message.offset,
                    error = %e,
                    "Failed to commit offset"
                );
            }
        }

        info!("Message source exhausted, ending object stream");
        let _ = tx.send(StreamMessage::End).await;
    }

    async fn fetch(&self, message: &SourceMessage) -> Result<FetchedObject<T>, EnrichError> {
        let event = NotificationEvent::decode(message)?;
        let key = event.object_key()?;
        let data = self.loader.load(&event.bucket, &key).await?;

        debug!(bucket = %event.bucket, key = %key, offset = event.offset, "Loaded object");
        Ok(FetchedObject { data, event })
    }
}
