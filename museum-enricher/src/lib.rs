//! # Museum Enricher
//!
//! Reacts to storage notifications for newly stored museums and runs each of
//! them through a staged enrichment pipeline backed by a geocoder.
//!
//! ## Architecture
//!
//! 1. **Consumer**: reads bucket notifications from Kafka with manual commits
//! 2. **Iterator**: loads the notified object and commits its offset
//! 3. **Pipeline**: runs the enrichment stages for one item at a time
//! 4. **Steps**: geocoding and place details lookups
//! 5. **Orchestrator**: wires the flow together and shuts it down in order

pub mod consumer;
pub mod errors;
pub mod geocoding;
pub mod iterator;
pub mod orchestrator;
pub mod pipeline;
pub mod steps;

pub use consumer::{KafkaReader, KafkaReaderConfig, NotificationConsumer, NotificationConsumerConfig};
pub use errors::{ConsumerError, EnrichError, GeocodeError, StepError};
pub use geocoding::{Geocoder, GeocoderConfig, NominatimClient};
pub use iterator::{FetchedObject, ObjectIterator};
pub use orchestrator::{EnrichmentOrchestrator, EnrichmentSummary, OrchestratorConfig};
pub use pipeline::{Pipeline, PipelineItem, Stage, Step};
