//! # Museum Service
//!
//! Entry points and configuration for the museum parser and enricher.
//!
//! This crate reads settings from the environment, builds the crawler, the
//! store and the enrichment flow from them, and provides the logging and
//! shutdown plumbing shared by both binaries.

pub mod config;
pub mod shutdown;
pub mod telemetry;

pub use config::{EnricherDependencies, ParserDependencies, Settings};

use thiserror::Error;

/// Errors that can occur while starting or running a service.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Crawl error.
    #[error("Crawl error: {0}")]
    CrawlError(#[from] museum_crawler::CrawlError),

    /// Storage error.
    #[error("Storage error: {0}")]
    StorageError(#[from] museum_repository::StorageError),

    /// Enrichment error.
    #[error("Enrichment error: {0}")]
    EnrichError(#[from] museum_enricher::EnrichError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ServiceError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
