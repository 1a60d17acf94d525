//! Orchestrator for the enrichment flow.
//!
//! Coordinates the consumer, iterator, and pipeline components.

use std::sync::Arc;

use museum_repository::ObjectLoader;
use museum_shared::{Museum, StreamMessage};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::consumer::NotificationConsumer;
use crate::errors::EnrichError;
use crate::iterator::{FetchedObject, ObjectIterator};
use crate::pipeline::{Pipeline, PipelineItem};

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Size of the channels between iterator, pipeline and sink.
    pub channel_buffer_size: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: 16,
        }
    }
}

/// Counts reported when a run finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentSummary {
    /// Museums that went through every stage without a failed step.
    pub enriched: usize,
    /// Museums that left the pipeline with at least one failed step.
    pub incomplete: usize,
    /// Error elements seen on the stream.
    pub errors: usize,
}

/// Runs notifications through the iterator and the pipeline until the
/// consumer stops.
pub struct EnrichmentOrchestrator {
    consumer: Arc<NotificationConsumer>,
    loader: Arc<dyn ObjectLoader<Museum>>,
    pipeline: Arc<Pipeline<Museum>>,
    config: OrchestratorConfig,
}

impl EnrichmentOrchestrator {
    /// Create a new orchestrator with the given components.
    pub fn new(
        consumer: Arc<NotificationConsumer>,
        loader: Arc<dyn ObjectLoader<Museum>>,
        pipeline: Pipeline<Museum>,
    ) -> Self {
        Self::with_config(consumer, loader, pipeline, OrchestratorConfig::default())
    }

    /// Create a new orchestrator with custom configuration.
    pub fn with_config(
        consumer: Arc<NotificationConsumer>,
        loader: Arc<dyn ObjectLoader<Museum>>,
        pipeline: Pipeline<Museum>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            consumer,
            loader,
            pipeline: Arc::new(pipeline),
            config,
        }
    }

    /// Run until the notification stream ends.
    ///
    /// Cancelling `shutdown` stops the consumer loop, which drains the rest
    /// of the flow. The consumer is stopped before this returns.
    #[instrument(skip_all)]
    pub async fn run(&self, shutdown: CancellationToken) -> Result<EnrichmentSummary, EnrichError> {
        info!(stages = self.pipeline.stage_count(), "Starting enrichment orchestrator");

        let messages = self.consumer.start_consuming(shutdown.clone())?;
        let objects = ObjectIterator::new(messages, self.loader.clone()).objects();
        let items = into_pipeline_items(objects, self.config.channel_buffer_size);

        let (out_tx, mut out_rx) = mpsc::channel(self.config.channel_buffer_size.max(1));
        let pipeline = self.pipeline.clone();
        let ctx = shutdown.clone();
        let pipeline_handle =
            tokio::spawn(async move { pipeline.process(ctx, items, out_tx).await });

        let mut summary = EnrichmentSummary::default();
        while let Some(message) = out_rx.recv().await {
            match message {
                StreamMessage::Item(item) => {
                    if item.failed_steps() == 0 {
                        summary.enriched += 1;
                    } else {
                        summary.incomplete += 1;
                    }
                    log_enriched(&item);
                }
                StreamMessage::Error(e) => {
                    summary.errors += 1;
                    warn!(error = %e, "Error element on enrichment stream");
                }
                StreamMessage::End => break,
            }
        }

        if let Err(e) = pipeline_handle.await {
            error!(error = %e, "Pipeline task failed");
        }

        self.consumer.stop().await;

        info!(
            enriched = summary.enriched,
            incomplete = summary.incomplete,
            errors = summary.errors,
            "Enrichment orchestrator finished"
        );
        Ok(summary)
    }
}

/// Wrap every fetched object in a fresh [`PipelineItem`].
fn into_pipeline_items(
    mut objects: mpsc::Receiver<StreamMessage<FetchedObject<Museum>>>,
    buffer: usize,
) -> mpsc::Receiver<StreamMessage<PipelineItem<Museum>>> {
    let (tx, rx) = mpsc::channel(buffer.max(1));

    tokio::spawn(async move {
        while let Some(message) = objects.recv().await {
            let end = message.is_end();
            let message = message.map(|fetched| {
                debug!(
                    bucket = %fetched.event.bucket,
                    key = %fetched.event.key,
                    "Queued museum for enrichment"
                );
                PipelineItem::new(fetched.data)
            });

            if tx.send(message).await.is_err() || end {
                return;
            }
        }

        let _ = tx.send(StreamMessage::End).await;
    });

    rx
}

fn log_enriched(item: &PipelineItem<Museum>) {
    let museum = item.object();
    let results = item.results();
    let mut keys: Vec<_> = results.keys().map(String::as_str).collect();
    keys.sort_unstable();

    info!(
        country = %museum.country,
        name = %museum.name,
        failed_steps = item.failed_steps(),
        lat = ?results.get("lat"),
        lon = ?results.get("lon"),
        result_keys = ?keys,
        "Museum enriched"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::{MessageReader, SourceMessage};
    use crate::errors::ConsumerError;
    use crate::steps::museum_pipeline;
    use crate::steps::testing::{louvre, FixedGeocoder};
    use async_trait::async_trait;
    use museum_repository::{InMemoryObjectStore, MuseumStore, ObjectStore};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays queued messages, then reports the reader closed.
    struct QueueReader {
        queue: Mutex<VecDeque<SourceMessage>>,
        commits: Mutex<Vec<i64>>,
        closes: AtomicUsize,
    }

    #[async_trait]
    impl MessageReader for QueueReader {
        async fn read_message(&self) -> Result<SourceMessage, ConsumerError> {
            let next = self.queue.lock().unwrap().pop_front();
            next.ok_or(ConsumerError::Closed)
        }

        async fn commit(&self, message: &SourceMessage) -> Result<(), ConsumerError> {
            self.commits.lock().unwrap().push(message.offset);
            Ok(())
        }

        async fn close(&self) -> Result<(), ConsumerError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn notification(offset: i64, key: &str) -> SourceMessage {
        let payload = json!({
            "Records": [{"s3": {"bucket": {"name": "museums"}, "object": {"key": key}}}]
        });
        SourceMessage::new("minio.events", 0, offset, payload.to_string().into_bytes())
    }

    #[tokio::test]
    async fn test_enriches_notified_museums_and_stops_consumer() {
        let backend = Arc::new(InMemoryObjectStore::new());
        backend.ensure_bucket("museums").await.unwrap();
        let store = MuseumStore::new(backend);
        store
            .store_museum("museums", &Museum::new("France", "Louvre"))
            .await
            .unwrap();
        store
            .store_museum("museums", &Museum::new("France", "Musee d'Orsay"))
            .await
            .unwrap();

        let reader = Arc::new(QueueReader {
            queue: Mutex::new(VecDeque::from(vec![
                notification(0, "raw_data%2Ffrance%2Flouvre.json"),
                notification(1, "raw_data%2Ffrance%2Fmissing.json"),
                notification(2, "raw_data%2Ffrance%2Fmusee-d%27orsay.json"),
            ])),
            commits: Mutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
        });
        let consumer = Arc::new(NotificationConsumer::new(reader.clone()));
        let geocoder = Arc::new(FixedGeocoder::new(Some(louvre())));

        let orchestrator =
            EnrichmentOrchestrator::new(consumer.clone(), Arc::new(store), museum_pipeline(geocoder.clone()));

        let summary = orchestrator.run(CancellationToken::new()).await.unwrap();

        assert_eq!(
            summary,
            EnrichmentSummary {
                enriched: 2,
                incomplete: 0,
                errors: 0
            }
        );
        assert_eq!(*reader.commits.lock().unwrap(), vec![0, 2]);
        assert_eq!(geocoder.detail_calls(), 2);
        assert_eq!(reader.closes.load(Ordering::SeqCst), 1);
        assert_eq!(
            consumer.state(),
            crate::consumer::ConsumerState::Stopped
        );
    }

    #[tokio::test]
    async fn test_failed_steps_count_as_incomplete() {
        let backend = Arc::new(InMemoryObjectStore::new());
        backend.ensure_bucket("museums").await.unwrap();
        let store = MuseumStore::new(backend);
        store
            .store_museum("museums", &Museum::new("France", "Louvre"))
            .await
            .unwrap();

        let reader = Arc::new(QueueReader {
            queue: Mutex::new(VecDeque::from(vec![notification(
                0,
                "raw_data%2Ffrance%2Flouvre.json",
            )])),
            commits: Mutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
        });
        let consumer = Arc::new(NotificationConsumer::new(reader));
        let geocoder = Arc::new(FixedGeocoder::new(None));
        let orchestrator =
            EnrichmentOrchestrator::new(consumer, Arc::new(store), museum_pipeline(geocoder));

        let summary = orchestrator.run(CancellationToken::new()).await.unwrap();

        assert_eq!(
            summary,
            EnrichmentSummary {
                enriched: 0,
                incomplete: 1,
                errors: 0
            }
        );
    }

    #[tokio::test]
    async fn test_second_run_is_rejected() {
        let reader = Arc::new(QueueReader {
            queue: Mutex::new(VecDeque::new()),
            commits: Mutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
        });
        let consumer = Arc::new(NotificationConsumer::new(reader));
        let store = MuseumStore::new(Arc::new(InMemoryObjectStore::new()));
        let geocoder = Arc::new(FixedGeocoder::new(None));
        let orchestrator =
            EnrichmentOrchestrator::new(consumer, Arc::new(store), museum_pipeline(geocoder));

        let summary = orchestrator.run(CancellationToken::new()).await.unwrap();
        assert_eq!(summary, EnrichmentSummary::default());

        let err = orchestrator.run(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, EnrichError::Consumer(ConsumerError::InvalidState(_))));
    }
}
