//! Bulk writer draining a museum stream into the store.
//!
//! Every museum received is written by its own task. The writer waits for all
//! of them before reporting, and the tally is kept in atomic counters shared
//! by those tasks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use museum_shared::{Museum, StreamMessage};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use crate::interfaces::PutOutcome;
use crate::museum_store::MuseumStore;

/// Configuration for the bulk writer.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Upper bound on writes in flight at the same time.
    pub max_concurrent_writes: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            max_concurrent_writes: 64,
        }
    }
}

/// Outcome of draining one stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSummary {
    /// Museums written for the first time.
    pub stored: usize,
    /// Museums whose key already existed.
    pub skipped_existing: usize,
    /// Museums whose write failed.
    pub failed: usize,
    /// Error elements the producer reported on the stream.
    pub stream_errors: usize,
}

impl StoreSummary {
    /// Total museums received from the stream.
    pub fn received(&self) -> usize {
        self.stored + self.skipped_existing + self.failed
    }
}

#[derive(Debug, Default)]
struct WriteCounters {
    stored: AtomicUsize,
    skipped_existing: AtomicUsize,
    failed: AtomicUsize,
}

/// Writes every museum of a stream to a bucket.
pub struct MuseumWriter {
    store: MuseumStore,
    bucket: String,
    config: WriterConfig,
}

impl MuseumWriter {
    /// Create a writer for the given bucket.
    pub fn new(store: MuseumStore, bucket: impl Into<String>) -> Self {
        Self::with_config(store, bucket, WriterConfig::default())
    }

    /// Create a writer with custom configuration.
    pub fn with_config(store: MuseumStore, bucket: impl Into<String>, config: WriterConfig) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            config,
        }
    }

    /// Drain `museums` into the store.
    ///
    /// Returns once the stream has ended (or its sender is gone) and every
    /// spawned write has completed.
    #[instrument(skip(self, museums), fields(bucket = %self.bucket))]
    pub async fn store_from_stream(
        &self,
        mut museums: mpsc::Receiver<StreamMessage<Museum>>,
    ) -> StoreSummary {
        let counters = Arc::new(WriteCounters::default());
        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_writes.max(1)));
        let mut writes = JoinSet::new();
        let mut stream_errors = 0;

        while let Some(message) = museums.recv().await {
            match message {
                StreamMessage::Item(museum) => {
                    let store = self.store.clone();
                    let bucket = self.bucket.clone();
                    let counters = counters.clone();
                    let permits = permits.clone();

                    writes.spawn(async move {
                        let _permit = permits.acquire_owned().await;
                        match store.store_museum(&bucket, &museum).await {
                            Ok(PutOutcome::Created) => {
                                counters.stored.fetch_add(1, Ordering::Relaxed);
                            }
                            Ok(PutOutcome::AlreadyExists) => {
                                counters.skipped_existing.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(e) => {
                                counters.failed.fetch_add(1, Ordering::Relaxed);
                                error!(name = %museum.name, error = %e, "Failed to store museum");
                            }
                        }
                    });
                }
                StreamMessage::Error(e) => {
                    stream_errors += 1;
                    warn!(error = %e, "Producer reported an error");
                }
                StreamMessage::End => {
                    debug!("Museum stream ended");
                    break;
                }
            }
        }

        while let Some(joined) = writes.join_next().await {
            if let Err(e) = joined {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                error!(error = %e, "Store task did not complete");
            }
        }

        let summary = StoreSummary {
            stored: counters.stored.load(Ordering::Relaxed),
            skipped_existing: counters.skipped_existing.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
            stream_errors,
        };

        info!(
            stored = summary.stored,
            skipped_existing = summary.skipped_existing,
            failed = summary.failed,
            stream_errors = summary.stream_errors,
            "Finished storing museums from stream"
        );

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StorageError;
    use crate::interfaces::ObjectStore;
    use crate::memory::InMemoryObjectStore;
    use async_trait::async_trait;

    async fn writer() -> (Arc<InMemoryObjectStore>, MuseumWriter) {
        let backend = Arc::new(InMemoryObjectStore::new());
        backend.ensure_bucket("museums").await.unwrap();
        let writer = MuseumWriter::new(MuseumStore::new(backend.clone()), "museums");
        (backend, writer)
    }

    #[tokio::test]
    async fn test_store_from_stream_counts_every_outcome() {
        let (backend, writer) = writer().await;
        let (tx, rx) = mpsc::channel(16);

        tx.send(StreamMessage::Item(Museum::new("Spain", "Prado")))
            .await
            .unwrap();
        tx.send(StreamMessage::Item(Museum::new("France", "Louvre")))
            .await
            .unwrap();
        tx.send(StreamMessage::Item(Museum::new("Spain", "Prado")))
            .await
            .unwrap();
        tx.send(StreamMessage::Error("listing failed".into()))
            .await
            .unwrap();
        tx.send(StreamMessage::End).await.unwrap();

        let summary = writer.store_from_stream(rx).await;

        assert_eq!(summary.stored, 2);
        assert_eq!(summary.skipped_existing, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.stream_errors, 1);
        assert_eq!(summary.received(), 3);
        assert_eq!(backend.object_count("museums").await, 2);
    }

    #[tokio::test]
    async fn test_store_from_stream_stops_when_sender_dropped() {
        let (_, writer) = writer().await;
        let (tx, rx) = mpsc::channel(4);

        tx.send(StreamMessage::Item(Museum::new("Peru", "Museo Larco")))
            .await
            .unwrap();
        drop(tx);

        let summary = writer.store_from_stream(rx).await;
        assert_eq!(summary.stored, 1);
    }

    struct FailingStore;

    #[async_trait]
    impl ObjectStore for FailingStore {
        async fn ensure_bucket(&self, _bucket: &str) -> Result<(), StorageError> {
            Ok(())
        }

        async fn put_object(
            &self,
            _bucket: &str,
            _key: &str,
            _body: Vec<u8>,
        ) -> Result<PutOutcome, StorageError> {
            Err(StorageError::io("disk full"))
        }

        async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
            Err(StorageError::not_found(bucket, key))
        }
    }

    #[tokio::test]
    async fn test_failed_writes_are_counted_not_fatal() {
        let writer = MuseumWriter::new(MuseumStore::new(Arc::new(FailingStore)), "museums");
        let (tx, rx) = mpsc::channel(4);

        for name in ["A", "B", "C"] {
            tx.send(StreamMessage::Item(Museum::new("Chile", name)))
                .await
                .unwrap();
        }
        tx.send(StreamMessage::End).await.unwrap();

        let summary = writer.store_from_stream(rx).await;
        assert_eq!(summary.failed, 3);
        assert_eq!(summary.stored, 0);
    }
}
