//! Kafka-backed [`MessageReader`].

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rdkafka::{
    config::ClientConfig,
    consumer::{CommitMode, Consumer, StreamConsumer},
    message::Message as KafkaMessage,
    Offset, TopicPartitionList,
};
use tracing::{debug, info};

use super::messages::SourceMessage;
use super::reader::MessageReader;
use crate::errors::ConsumerError;

/// Default Kafka broker address.
pub const DEFAULT_KAFKA_BROKER: &str = "localhost:9092";

/// Default topic MinIO publishes bucket notifications to.
pub const DEFAULT_KAFKA_TOPIC: &str = "minio.events";

/// Default consumer group ID.
pub const DEFAULT_KAFKA_GROUP_ID: &str = "museum-enricher";

/// Connection settings for [`KafkaReader`].
#[derive(Debug, Clone)]
pub struct KafkaReaderConfig {
    /// Kafka broker addresses (comma-separated).
    pub brokers: String,
    pub topic: String,
    pub group_id: String,
    pub session_timeout_ms: u32,
}

impl Default for KafkaReaderConfig {
    fn default() -> Self {
        Self {
            brokers: DEFAULT_KAFKA_BROKER.to_string(),
            topic: DEFAULT_KAFKA_TOPIC.to_string(),
            group_id: DEFAULT_KAFKA_GROUP_ID.to_string(),
            session_timeout_ms: 6000,
        }
    }
}

/// Reads a single topic with manual offset commits.
pub struct KafkaReader {
    consumer: StreamConsumer,
    topic: String,
    closed: AtomicBool,
}

impl KafkaReader {
    /// Create a reader and subscribe it to the configured topic.
    ///
    /// # Returns
    ///
    /// * `Ok(KafkaReader)` - A subscribed reader
    /// * `Err(ConsumerError)` - If the client cannot be created or subscribed
    pub fn new(config: &KafkaReaderConfig) -> Result<Self, ConsumerError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", config.session_timeout_ms.to_string())
            .create()?;

        consumer.subscribe(&[config.topic.as_str()])?;

        info!(
            brokers = %config.brokers,
            topic = %config.topic,
            group_id = %config.group_id,
            "Created Kafka reader"
        );

        Ok(Self {
            consumer,
            topic: config.topic.clone(),
            closed: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl MessageReader for KafkaReader {
    async fn read_message(&self) -> Result<SourceMessage, ConsumerError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ConsumerError::Closed);
        }

        let msg = self.consumer.recv().await?;
        Ok(SourceMessage {
            topic: msg.topic().to_string(),
            partition: msg.partition(),
            offset: msg.offset(),
            payload: msg.payload().map(<[u8]>::to_vec).unwrap_or_default(),
        })
    }

    async fn commit(&self, message: &SourceMessage) -> Result<(), ConsumerError> {
        let mut tpl = TopicPartitionList::new();
        tpl.add_partition_offset(
            &message.topic,
            message.partition,
            Offset::Offset(message.offset + 1),
        )
        .map_err(|e| ConsumerError::commit(e.to_string()))?;

        self.consumer
            .commit(&tpl, CommitMode::Async)
            .map_err(|e| ConsumerError::commit(e.to_string()))?;

        debug!(
            topic = %message.topic,
            partition = message.partition,
            offset = message.offset,
            "Committed offset"
        );
        Ok(())
    }

    async fn close(&self) -> Result<(), ConsumerError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        self.consumer.unsubscribe();
        info!(topic = %self.topic, "Closed Kafka reader");
        Ok(())
    }
}
