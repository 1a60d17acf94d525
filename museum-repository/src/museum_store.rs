//! Museum codec on top of an object store.
//!
//! Encodes museums as JSON under their canonical key and decodes them back.
//! Malformed payloads surface as [`StorageError::DecodeError`]; they are never
//! replaced by a default value.

use std::sync::Arc;

use async_trait::async_trait;
use museum_shared::{storage_key, Museum};
use tracing::{debug, info, instrument};

use crate::errors::StorageError;
use crate::interfaces::{ObjectLoader, ObjectStore, PutOutcome};

/// Reads and writes museums through an [`ObjectStore`].
#[derive(Clone)]
pub struct MuseumStore {
    store: Arc<dyn ObjectStore>,
}

impl MuseumStore {
    /// Create a museum store over the given backend.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Create the bucket if needed.
    pub async fn ensure_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        self.store.ensure_bucket(bucket).await
    }

    /// Store a museum under its canonical key.
    ///
    /// Storing a museum whose key already exists leaves the original record in
    /// place and still succeeds.
    #[instrument(skip(self, museum), fields(name = %museum.name, country = %museum.country))]
    pub async fn store_museum(
        &self,
        bucket: &str,
        museum: &Museum,
    ) -> Result<PutOutcome, StorageError> {
        let key = museum.storage_key();
        let body = serde_json::to_vec(museum)
            .map_err(|e| StorageError::EncodeError(e.to_string()))?;

        let outcome = self.store.put_object(bucket, &key, body).await?;
        match outcome {
            PutOutcome::Created => {
                info!(bucket = %bucket, key = %key, "Stored new museum");
            }
            PutOutcome::AlreadyExists => {
                debug!(bucket = %bucket, key = %key, "Museum already stored, ignoring write");
            }
        }

        Ok(outcome)
    }

    /// Load and decode the museum stored under `key`.
    pub async fn get_object(&self, bucket: &str, key: &str) -> Result<Museum, StorageError> {
        let body = self.store.get_object(bucket, key).await?;
        let museum: Museum = serde_json::from_slice(&body)
            .map_err(|e| StorageError::decode(format!("{}/{}: {}", bucket, key, e)))?;

        debug!(bucket = %bucket, key = %key, name = %museum.name, "Loaded museum");
        Ok(museum)
    }

    /// Load a museum by its country and name.
    pub async fn get_museum(
        &self,
        bucket: &str,
        country: &str,
        name: &str,
    ) -> Result<Museum, StorageError> {
        self.get_object(bucket, &storage_key(country, name)).await
    }
}

#[async_trait]
impl ObjectLoader<Museum> for MuseumStore {
    async fn load(&self, bucket: &str, key: &str) -> Result<Museum, StorageError> {
        self.get_object(bucket, key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryObjectStore;

    async fn store() -> (Arc<InMemoryObjectStore>, MuseumStore) {
        let backend = Arc::new(InMemoryObjectStore::new());
        backend.ensure_bucket("museums").await.unwrap();
        (backend.clone(), MuseumStore::new(backend))
    }

    #[tokio::test]
    async fn test_store_and_load_round_trip() {
        let (_, store) = store().await;
        let museum = Museum::new("Spain", "Museo del Prado");

        store.store_museum("museums", &museum).await.unwrap();
        let loaded = store
            .get_museum("museums", "Spain", "Museo del Prado")
            .await
            .unwrap();

        assert_eq!(loaded, museum);
    }

    #[tokio::test]
    async fn test_second_put_keeps_first_value() {
        let (backend, store) = store().await;
        let first = Museum::new("United States", "Some Museum");
        // Same key, different casing in the stored value.
        let second = Museum::new("united states", "some museum");

        let a = store.store_museum("museums", &first).await.unwrap();
        let b = store.store_museum("museums", &second).await.unwrap();

        assert_eq!(a, PutOutcome::Created);
        assert_eq!(b, PutOutcome::AlreadyExists);
        assert_eq!(backend.object_count("museums").await, 1);

        let loaded = store
            .get_object("museums", "raw_data/united-states/some-museum.json")
            .await
            .unwrap();
        assert_eq!(loaded, first);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_decode_error() {
        let (backend, store) = store().await;
        backend
            .put_object("museums", "raw_data/x/broken.json", b"{not json".to_vec())
            .await
            .unwrap();

        let err = store
            .load("museums", "raw_data/x/broken.json")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::DecodeError(_)));
    }
}
