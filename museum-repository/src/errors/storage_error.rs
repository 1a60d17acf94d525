//! Storage error types.
//!
//! This module defines the error types that can occur during object store
//! operations.

use thiserror::Error;

/// Errors that can occur during object store operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The requested bucket does not exist.
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    /// The requested object does not exist.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// The bucket name or object key cannot be used.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Reading from or writing to the backend failed.
    #[error("IO error: {0}")]
    IoError(String),

    /// Failed to encode a value for storage.
    #[error("Encode error: {0}")]
    EncodeError(String),

    /// A stored payload could not be decoded.
    #[error("Decode error: {0}")]
    DecodeError(String),
}

impl StorageError {
    /// Create a bucket-not-found error.
    pub fn bucket_not_found(bucket: impl Into<String>) -> Self {
        Self::BucketNotFound(bucket.into())
    }

    /// Create an object-not-found error for a bucket and key.
    pub fn not_found(bucket: &str, key: &str) -> Self {
        Self::NotFound(format!("{}/{}", bucket, key))
    }

    /// Create an invalid key error.
    pub fn invalid_key(msg: impl Into<String>) -> Self {
        Self::InvalidKey(msg.into())
    }

    /// Create an IO error.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::IoError(msg.into())
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::DecodeError(msg.into())
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}
