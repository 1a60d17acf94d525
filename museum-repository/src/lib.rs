//! # Museum Repository
//!
//! This crate provides traits and implementations for storing raw museum
//! records in a keyed object store. It includes definitions for errors,
//! interfaces, an in-memory store, a filesystem store, an S3-compatible store,
//! the museum codec on top of them and the bulk writer that drains a crawl
//! stream into the store.

pub mod config;
pub mod errors;
pub mod fs;
pub mod interfaces;
pub mod memory;
pub mod museum_store;
pub mod s3;
pub mod writer;

pub use config::{S3Config, StorageConfig};
pub use errors::StorageError;
pub use fs::FsObjectStore;
pub use interfaces::{ObjectLoader, ObjectStore, PutOutcome};
pub use memory::InMemoryObjectStore;
pub use museum_store::MuseumStore;
pub use s3::S3ObjectStore;
pub use writer::{MuseumWriter, StoreSummary, WriterConfig};
