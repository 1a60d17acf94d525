//! Background consumer loop with ordered shutdown.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::messages::SourceMessage;
use super::reader::{MessageIterator, MessageReader};
use crate::errors::ConsumerError;

/// Lifecycle of a [`NotificationConsumer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Created,
    Consuming,
    Stopping,
    Stopped,
}

/// Configuration for the consumer loop.
#[derive(Debug, Clone)]
pub struct NotificationConsumerConfig {
    /// Pause after a failed read before trying again.
    pub read_backoff: Duration,
}

impl Default for NotificationConsumerConfig {
    fn default() -> Self {
        Self {
            read_backoff: Duration::from_secs(1),
        }
    }
}

/// Runs the read loop over a [`MessageReader`].
///
/// The loop reserves the single slot of the hand-off channel before it reads,
/// so at most one message is read but not yet taken by the downstream
/// consumer. Once [`stop`](Self::stop) is raised the stream yields nothing
/// more, even a message already sitting in the slot.
pub struct NotificationConsumer {
    reader: Arc<dyn MessageReader>,
    config: NotificationConsumerConfig,
    state: Mutex<ConsumerState>,
    stop_token: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationConsumer {
    /// Create a consumer with default configuration.
    pub fn new(reader: Arc<dyn MessageReader>) -> Self {
        Self::with_config(reader, NotificationConsumerConfig::default())
    }

    /// Create a consumer with custom configuration.
    pub fn with_config(reader: Arc<dyn MessageReader>, config: NotificationConsumerConfig) -> Self {
        Self {
            reader,
            config,
            state: Mutex::new(ConsumerState::Created),
            stop_token: CancellationToken::new(),
            handle: Mutex::new(None),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConsumerState {
        *self.lock_state()
    }

    fn lock_state(&self) -> MutexGuard<'_, ConsumerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn the read loop and return the stream it feeds.
    ///
    /// The loop ends when `shutdown` fires, when [`stop`](Self::stop) is
    /// called, or when the reader reports it was closed. The stream yields
    /// `None` afterwards.
    ///
    /// # Returns
    ///
    /// * `Ok(MessageStream)` - The consumer moved to `Consuming`
    /// * `Err(ConsumerError::InvalidState)` - If the consumer was already started or stopped
    pub fn start_consuming(
        &self,
        shutdown: CancellationToken,
    ) -> Result<MessageStream, ConsumerError> {
        {
            let mut state = self.lock_state();
            if *state != ConsumerState::Created {
                return Err(ConsumerError::invalid_state(format!(
                    "cannot start consuming while {:?}",
                    *state
                )));
            }
            *state = ConsumerState::Consuming;
        }

        let (tx, rx) = mpsc::channel(1);
        let handle = tokio::spawn(read_loop(
            self.reader.clone(),
            tx,
            shutdown,
            self.stop_token.clone(),
            self.config.read_backoff,
        ));
        *self.handle.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);

        info!("Notification consumer started");
        Ok(MessageStream::new(
            rx,
            self.reader.clone(),
            self.stop_token.clone(),
        ))
    }

    /// Stop the read loop, wait for it to exit, then close the reader.
    ///
    /// Calling `stop` again, or while another call is in progress, does
    /// nothing.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        {
            let mut state = self.lock_state();
            match *state {
                ConsumerState::Stopping | ConsumerState::Stopped => {
                    debug!(state = ?*state, "Consumer already stopping");
                    return;
                }
                _ => *state = ConsumerState::Stopping,
            }
        }

        info!("Stopping notification consumer");
        self.stop_token.cancel();

        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "Read loop task failed");
            }
        }

        if let Err(e) = self.reader.close().await {
            warn!(error = %e, "Failed to close reader");
        }

        *self.lock_state() = ConsumerState::Stopped;
        info!("Notification consumer stopped");
    }
}

async fn read_loop(
    reader: Arc<dyn MessageReader>,
    tx: mpsc::Sender<SourceMessage>,
    shutdown: CancellationToken,
    stop: CancellationToken,
    backoff: Duration,
) {
    debug!("Read loop started");

    loop {
        let permit = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("Shutdown signal received, stopping read loop");
                break;
            }
            _ = stop.cancelled() => {
                info!("Stop requested, stopping read loop");
                break;
            }
            permit = tx.reserve() => match permit {
                Ok(permit) => permit,
                Err(_) => {
                    info!("Message stream dropped, stopping read loop");
                    break;
                }
            },
        };

        let read = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("Shutdown signal received, stopping read loop");
                break;
            }
            _ = stop.cancelled() => {
                info!("Stop requested, stopping read loop");
                break;
            }
            read = reader.read_message() => read,
        };

        let message = match read {
            Ok(message) => message,
            Err(ConsumerError::Closed) => {
                info!("Reader closed, stopping read loop");
                break;
            }
            Err(e) => {
                warn!(
                    error = %e,
                    backoff_ms = backoff.as_millis() as u64,
                    "Failed to read message, backing off"
                );
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    _ = stop.cancelled() => break,
                    _ = tokio::time::sleep(backoff) => {}
                }
                continue;
            }
        };

        debug!(
            topic = %message.topic,
            partition = message.partition,
            offset = message.offset,
            "Message received"
        );
        permit.send(message);
    }

    debug!("Read loop exited");
}

/// Receiving end of a running consumer.
///
/// Yields `None` once the consumer is stopped, so nothing is handed out, and
/// later committed, after the reader has been closed.
pub struct MessageStream {
    rx: mpsc::Receiver<SourceMessage>,
    reader: Arc<dyn MessageReader>,
    stop: CancellationToken,
}

impl MessageStream {
    pub fn new(
        rx: mpsc::Receiver<SourceMessage>,
        reader: Arc<dyn MessageReader>,
        stop: CancellationToken,
    ) -> Self {
        Self { rx, reader, stop }
    }
}

#[async_trait]
impl MessageIterator for MessageStream {
    async fn next_message(&mut self) -> Option<SourceMessage> {
        tokio::select! {
            biased;
            _ = self.stop.cancelled() => None,
            message = self.rx.recv() => message,
        }
    }

    async fn commit_offset(&self, message: &SourceMessage) -> Result<(), ConsumerError> {
        if self.stop.is_cancelled() {
            return Err(ConsumerError::Closed);
        }
        debug!(
            topic = %message.topic,
            partition = message.partition,
            offset = message.offset,
            "Committing offset"
        );
        self.reader.commit(message).await
    }
}
