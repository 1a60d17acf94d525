//! Dependency initialization and wiring for the parser and the enricher.

use std::sync::Arc;

use museum_crawler::{CategoryCrawler, WikiApi, WikipediaClient};
use museum_enricher::consumer::MessageReader;
use museum_enricher::steps::museum_pipeline;
use museum_enricher::{
    EnrichmentOrchestrator, EnrichmentSummary, Geocoder, KafkaReader, NominatimClient,
    NotificationConsumer,
};
use museum_repository::{
    FsObjectStore, MuseumStore, MuseumWriter, ObjectStore, S3ObjectStore, StoreSummary,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::config::Settings;
use crate::ServiceError;

/// The store named by `settings`: S3-compatible when a MinIO endpoint is
/// configured, the filesystem otherwise.
fn object_store(settings: &Settings) -> Arc<dyn ObjectStore> {
    match &settings.s3 {
        Some(s3) => {
            info!(endpoint = %s3.endpoint_url(), "Using S3-compatible object store");
            Arc::new(S3ObjectStore::new(s3))
        }
        None => {
            info!(root = %settings.storage.root_dir.display(), "Using filesystem object store");
            Arc::new(FsObjectStore::new(settings.storage.root_dir.clone()))
        }
    }
}

/// Everything the parser needs for one crawl.
pub struct ParserDependencies {
    crawler: CategoryCrawler,
    store: MuseumStore,
    writer: MuseumWriter,
    bucket: String,
    root_category: String,
}

impl ParserDependencies {
    /// Build the Wikipedia client and the object store from `settings`.
    pub fn new(settings: &Settings) -> Result<Self, ServiceError> {
        info!(
            api_url = %settings.crawler.api_url,
            root_category = %settings.crawler.root_category,
            bucket = %settings.storage.bucket,
            "Initializing parser dependencies"
        );

        let api = WikipediaClient::new(&settings.crawler)
            .map_err(|e| ServiceError::config(format!("Failed to create Wikipedia client: {}", e)))?;

        Ok(Self::from_parts(Arc::new(api), object_store(settings), settings))
    }

    /// Wire the parser over an explicit API and storage backend.
    pub fn from_parts(
        api: Arc<dyn WikiApi>,
        backend: Arc<dyn ObjectStore>,
        settings: &Settings,
    ) -> Self {
        let store = MuseumStore::new(backend);
        Self {
            crawler: CategoryCrawler::with_config(api, &settings.crawler),
            writer: MuseumWriter::new(store.clone(), settings.storage.bucket.clone()),
            store,
            bucket: settings.storage.bucket.clone(),
            root_category: settings.crawler.root_category.clone(),
        }
    }

    /// Crawl the root category and store every museum found.
    #[instrument(skip_all, fields(root = %self.root_category, bucket = %self.bucket))]
    pub async fn run(&self, shutdown: CancellationToken) -> Result<StoreSummary, ServiceError> {
        self.store.ensure_bucket(&self.bucket).await?;

        let museums = self.crawler.crawl(self.root_category.clone(), shutdown);
        Ok(self.writer.store_from_stream(museums).await)
    }
}

/// The configured enrichment orchestrator.
pub struct EnricherDependencies {
    pub orchestrator: EnrichmentOrchestrator,
}

impl EnricherDependencies {
    /// Build the Kafka consumer, the object store and the Nominatim client
    /// from `settings`.
    pub fn new(settings: &Settings) -> Result<Self, ServiceError> {
        info!(
            kafka_broker = %settings.kafka.brokers,
            kafka_topic = %settings.kafka.topic,
            kafka_group_id = %settings.kafka.group_id,
            nominatim_url = %settings.geocoder.base_url,
            "Initializing enricher dependencies"
        );

        let reader = KafkaReader::new(&settings.kafka)
            .map_err(|e| ServiceError::config(format!("Failed to create Kafka consumer: {}", e)))?;
        let geocoder = NominatimClient::new(&settings.geocoder)
            .map_err(|e| ServiceError::config(format!("Failed to create geocoder: {}", e)))?;
        let backend = object_store(settings);

        info!("Kafka consumer subscribed");

        Ok(Self::from_parts(
            Arc::new(reader),
            backend,
            Arc::new(geocoder),
            settings,
        ))
    }

    /// Wire the orchestrator over explicit collaborators.
    pub fn from_parts(
        reader: Arc<dyn MessageReader>,
        backend: Arc<dyn ObjectStore>,
        geocoder: Arc<dyn Geocoder>,
        settings: &Settings,
    ) -> Self {
        let consumer = Arc::new(NotificationConsumer::with_config(
            reader,
            settings.consumer.clone(),
        ));
        let loader = Arc::new(MuseumStore::new(backend));

        Self {
            orchestrator: EnrichmentOrchestrator::new(consumer, loader, museum_pipeline(geocoder)),
        }
    }

    /// Run the orchestrator until the stream ends or `shutdown` fires.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<EnrichmentSummary, ServiceError> {
        Ok(self.orchestrator.run(shutdown).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use museum_crawler::models::{
        CategoryMember, CategoryMembersResponse, CategoryQuery, Page, PageContentResponse,
        Revision,
    };
    use museum_crawler::CrawlError;
    use museum_enricher::consumer::SourceMessage;
    use museum_enricher::geocoding::{Place, PlaceDetails};
    use museum_enricher::{ConsumerError, GeocodeError};
    use museum_shared::Museum;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// One root category holding a single "Museums in Spain" page.
    struct SpainApi;

    #[async_trait]
    impl WikiApi for SpainApi {
        async fn fetch_category_members(
            &self,
            _title: &str,
            _cursor: Option<&str>,
        ) -> Result<CategoryMembersResponse, CrawlError> {
            Ok(CategoryMembersResponse {
                query: CategoryQuery {
                    category_members: vec![CategoryMember::new(7, 0, "Museums in Spain")],
                },
                ..Default::default()
            })
        }

        async fn fetch_page_content(&self, title: &str) -> Result<PageContentResponse, CrawlError> {
            let mut pages = PageContentResponse::default();
            pages.query.pages.insert(
                "7".to_string(),
                Page {
                    page_id: 7,
                    title: title.to_string(),
                    revisions: vec![Revision {
                        content: "* [[Museo del Prado]]\n* [[Category:Art]]\n# [[Guggenheim Museum Bilbao|Guggenheim]]"
                            .to_string(),
                    }],
                },
            );
            Ok(pages)
        }
    }

    #[tokio::test]
    async fn test_parser_stores_crawled_museums() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FsObjectStore::new(dir.path()));
        let settings = Settings::default();

        let parser = ParserDependencies::from_parts(Arc::new(SpainApi), backend.clone(), &settings);
        let summary = parser.run(CancellationToken::new()).await.unwrap();

        assert_eq!(summary.stored, 2);
        assert_eq!(summary.failed, 0);

        let store = MuseumStore::new(backend);
        let prado = store
            .get_museum("museums", "Spain", "Museo del Prado")
            .await
            .unwrap();
        assert_eq!(prado, Museum::new("Spain", "Museo del Prado"));

        let rerun = parser.run(CancellationToken::new()).await.unwrap();
        assert_eq!(rerun.stored, 0);
        assert_eq!(rerun.skipped_existing, 2);
    }

    #[tokio::test]
    async fn test_parser_writes_to_minio_when_configured() {
        use museum_repository::S3Config;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/museums"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"query": {"categorymembers": []}})),
            )
            .mount(&server)
            .await;

        let mut settings = Settings::default();
        settings.crawler.api_url = server.uri();
        settings.storage.root_dir = "/nonexistent/museum-data".into();
        settings.s3 = Some(S3Config::new(server.uri(), "minioadmin", "minioadmin"));

        let parser = ParserDependencies::new(&settings).unwrap();
        let summary = parser.run(CancellationToken::new()).await.unwrap();

        assert_eq!(summary.stored, 0);
        assert!(!std::path::Path::new("/nonexistent/museum-data").exists());
    }

    /// Replays queued messages, then reports the reader closed.
    struct QueueReader {
        queue: Mutex<VecDeque<SourceMessage>>,
        commits: AtomicUsize,
    }

    #[async_trait]
    impl MessageReader for QueueReader {
        async fn read_message(&self) -> Result<SourceMessage, ConsumerError> {
            let next = self.queue.lock().unwrap().pop_front();
            next.ok_or(ConsumerError::Closed)
        }

        async fn commit(&self, _message: &SourceMessage) -> Result<(), ConsumerError> {
            self.commits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn close(&self) -> Result<(), ConsumerError> {
            Ok(())
        }
    }

    /// Never finds anything.
    struct NoMatches;

    #[async_trait]
    impl Geocoder for NoMatches {
        async fn geocode(
            &self,
            _ctx: &CancellationToken,
            query: &str,
        ) -> Result<Place, GeocodeError> {
            Err(GeocodeError::NoResults(query.to_string()))
        }

        async fn place_details(
            &self,
            _ctx: &CancellationToken,
            _osm_type: &str,
            _osm_id: i64,
        ) -> Result<PlaceDetails, GeocodeError> {
            Err(GeocodeError::NoResults("details".to_string()))
        }
    }

    #[tokio::test]
    async fn test_enricher_survives_failed_geocoding() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FsObjectStore::new(dir.path()));
        let store = MuseumStore::new(backend.clone());
        store.ensure_bucket("museums").await.unwrap();
        store
            .store_museum("museums", &Museum::new("Peru", "Museo Larco"))
            .await
            .unwrap();

        let payload = serde_json::json!({
            "Records": [{"s3": {"bucket": {"name": "museums"},
                                "object": {"key": "raw_data%2Fperu%2Fmuseo-larco.json"}}}]
        });
        let reader = Arc::new(QueueReader {
            queue: Mutex::new(VecDeque::from(vec![SourceMessage::new(
                "minio.events",
                0,
                0,
                payload.to_string().into_bytes(),
            )])),
            commits: AtomicUsize::new(0),
        });

        let enricher = EnricherDependencies::from_parts(
            reader.clone(),
            backend,
            Arc::new(NoMatches),
            &Settings::default(),
        );
        let summary = enricher.run(CancellationToken::new()).await.unwrap();

        assert_eq!(summary.enriched, 0);
        assert_eq!(summary.incomplete, 1);
        assert_eq!(reader.commits.load(Ordering::SeqCst), 1);
    }
}
