//! Error types for the museum repository.

mod storage_error;

pub use storage_error::StorageError;
