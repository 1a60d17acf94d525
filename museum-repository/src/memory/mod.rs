//! In-memory object store.
//!
//! Keeps every bucket in a process-local map. Used by tests and by local runs
//! that do not need the records to outlive the process.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::errors::StorageError;
use crate::interfaces::{ObjectStore, PutOutcome};

/// Object store backed by a map of buckets.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    buckets: RwLock<HashMap<String, HashMap<String, Vec<u8>>>>,
}

impl InMemoryObjectStore {
    /// Create an empty store with no buckets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects stored in `bucket` (zero if it does not exist).
    pub async fn object_count(&self, bucket: &str) -> usize {
        self.buckets
            .read()
            .await
            .get(bucket)
            .map(|objects| objects.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        self.buckets
            .write()
            .await
            .entry(bucket.to_string())
            .or_default();
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> Result<PutOutcome, StorageError> {
        let mut buckets = self.buckets.write().await;
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::bucket_not_found(bucket))?;

        match objects.entry(key.to_string()) {
            Entry::Occupied(_) => {
                debug!(bucket = %bucket, key = %key, "Object already exists");
                Ok(PutOutcome::AlreadyExists)
            }
            Entry::Vacant(slot) => {
                slot.insert(body);
                Ok(PutOutcome::Created)
            }
        }
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let buckets = self.buckets.read().await;
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StorageError::bucket_not_found(bucket))?;

        objects
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(bucket, key))
    }
}
