//! Object store trait definition.

use async_trait::async_trait;

use crate::errors::StorageError;

/// Result of an idempotent put.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The object did not exist and was written.
    Created,
    /// An object already lived under the key; it was left untouched.
    AlreadyExists,
}

/// Abstract interface for a bucketed, keyed object store.
///
/// Stored objects are permanent: `put_object` never overwrites an existing
/// key. Implementations must be `Send + Sync` so a single store can serve the
/// concurrent writes issued by the bulk writer.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create the bucket if it does not exist yet.
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), StorageError>;

    /// Store `body` under `key` unless the key already exists.
    ///
    /// # Returns
    ///
    /// * `Ok(PutOutcome::Created)` - The object was written
    /// * `Ok(PutOutcome::AlreadyExists)` - The key was taken; nothing changed
    /// * `Err(StorageError)` - The bucket is missing or the backend failed
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> Result<PutOutcome, StorageError>;

    /// Read the raw bytes stored under `key`.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<u8>)` - The stored payload
    /// * `Err(StorageError::NotFound)` - Nothing is stored under the key
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;
}
