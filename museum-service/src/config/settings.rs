//! Environment-driven settings.
//!
//! Every variable is optional. Unset or empty values fall back to the
//! component defaults. Setting `MINIO_ENDPOINT` selects the S3-compatible
//! store and then requires both MinIO keys; without it the filesystem store
//! under `STORAGE_ROOT` is used.

use std::time::Duration;

use museum_crawler::CrawlerConfig;
use museum_enricher::{GeocoderConfig, KafkaReaderConfig, NotificationConsumerConfig};
use museum_repository::{S3Config, StorageConfig};

use crate::ServiceError;

/// Settings shared by the parser and the enricher.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub storage: StorageConfig,
    /// Set when the objects live on an S3-compatible server.
    pub s3: Option<S3Config>,
    pub crawler: CrawlerConfig,
    pub geocoder: GeocoderConfig,
    pub kafka: KafkaReaderConfig,
    pub consumer: NotificationConsumerConfig,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ServiceError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServiceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut settings = Self::default();

        if let Some(bucket) = get("MUSEUM_BUCKET_NAME") {
            settings.storage.bucket = bucket;
        }
        if let Some(root) = get("STORAGE_ROOT") {
            settings.storage.root_dir = root.into();
        }
        if let Some(endpoint) = get("MINIO_ENDPOINT") {
            let required = |name: &str| {
                get(name).ok_or_else(|| {
                    ServiceError::config(format!("{} is required when MINIO_ENDPOINT is set", name))
                })
            };
            let mut s3 = S3Config::new(
                endpoint,
                required("MINIO_ACCESS_KEY")?,
                required("MINIO_SECRET_KEY")?,
            );
            s3.use_ssl = get("MINIO_USE_SSL").is_some_and(|v| v.eq_ignore_ascii_case("true"));
            if let Some(region) = get("MINIO_REGION") {
                s3.region = region;
            }
            settings.s3 = Some(s3);
        }

        if let Some(url) = get("WIKIPEDIA_API_URL") {
            settings.crawler.api_url = url;
        }
        if let Some(category) = get("CRAWL_ROOT_CATEGORY") {
            settings.crawler.root_category = category;
        }
        if let Some(blocklist) = get("CRAWL_BLOCKLIST") {
            settings.crawler.blocklist = blocklist
                .split(',')
                .map(str::trim)
                .filter(|prefix| !prefix.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(url) = get("NOMINATIM_URL") {
            settings.geocoder.base_url = url;
        }
        if let Some(agent) = get("HTTP_USER_AGENT") {
            settings.crawler.user_agent = agent.clone();
            settings.geocoder.user_agent = agent;
        }

        if let Some(broker) = get("KAFKA_BROKER") {
            settings.kafka.brokers = broker;
        }
        if let Some(topic) = get("KAFKA_TOPIC") {
            settings.kafka.topic = topic;
        }
        if let Some(group_id) = get("KAFKA_GROUP_ID") {
            settings.kafka.group_id = group_id;
        }
        if let Some(backoff) = get("CONSUMER_BACKOFF_MS") {
            let millis: u64 = backoff.parse().map_err(|e| {
                ServiceError::config(format!("CONSUMER_BACKOFF_MS must be an integer: {}", e))
            })?;
            settings.consumer.read_backoff = Duration::from_millis(millis);
        }

        Ok(settings)
    }
}
