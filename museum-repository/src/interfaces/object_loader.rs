//! Object loader trait definition.

use async_trait::async_trait;

use crate::errors::StorageError;

/// Loads and decodes an object of type `T` from a bucket and key.
///
/// The ingestion iterator calls this once per storage notification.
/// Implementations should be read-only.
#[async_trait]
pub trait ObjectLoader<T>: Send + Sync {
    /// Load the object stored under `key` in `bucket`.
    async fn load(&self, bucket: &str, key: &str) -> Result<T, StorageError>;
}
