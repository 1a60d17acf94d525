//! Message types for the consumer.
//!
//! Defines the raw broker message and the storage notification decoded from
//! it.

use serde::Deserialize;

use crate::errors::EnrichError;

/// A message read from the broker, with the coordinates needed to commit it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub payload: Vec<u8>,
}

impl SourceMessage {
    /// Create a message read from `topic`/`partition` at `offset`.
    pub fn new(topic: impl Into<String>, partition: i32, offset: i64, payload: Vec<u8>) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
            payload,
        }
    }
}

/// Bucket notification as published by MinIO.
#[derive(Debug, Deserialize)]
struct BucketNotification {
    #[serde(rename = "EventName", default)]
    event_name: String,
    #[serde(rename = "Records", default)]
    records: Vec<NotificationRecord>,
}

#[derive(Debug, Deserialize)]
struct NotificationRecord {
    #[serde(rename = "eventName", default)]
    event_name: String,
    s3: S3Entity,
}

#[derive(Debug, Deserialize)]
struct S3Entity {
    bucket: S3Bucket,
    object: S3Object,
}

#[derive(Debug, Deserialize)]
struct S3Bucket {
    name: String,
}

#[derive(Debug, Deserialize)]
struct S3Object {
    key: String,
}

/// A storage notification about a single object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub bucket: String,
    /// Object key exactly as carried by the notification (URL-escaped).
    pub key: String,
    pub event_name: String,
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

impl NotificationEvent {
    /// Decode the notification carried by `message`.
    ///
    /// Only the first record is used. A payload without records is malformed.
    pub fn decode(message: &SourceMessage) -> Result<Self, EnrichError> {
        let notification: BucketNotification = serde_json::from_slice(&message.payload)
            .map_err(|e| EnrichError::decode(format!("invalid notification: {}", e)))?;

        let record = notification
            .records
            .into_iter()
            .next()
            .ok_or_else(|| EnrichError::decode("notification has no records"))?;

        let event_name = if record.event_name.is_empty() {
            notification.event_name
        } else {
            record.event_name
        };

        Ok(Self {
            bucket: record.s3.bucket.name,
            key: record.s3.object.key,
            event_name,
            topic: message.topic.clone(),
            partition: message.partition,
            offset: message.offset,
        })
    }

    /// The object key with query escaping undone (`+` is a space).
    pub fn object_key(&self) -> Result<String, EnrichError> {
        urlencoding::decode(&self.key.replace('+', " "))
            .map(|key| key.into_owned())
            .map_err(|e| EnrichError::decode(format!("invalid object key {}: {}", self.key, e)))
    }
}
