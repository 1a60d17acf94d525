//! Error types for the enricher.

mod consumer_error;
mod enrich_error;
mod geocode_error;
mod step_error;

pub use consumer_error::ConsumerError;
pub use enrich_error::EnrichError;
pub use geocode_error::GeocodeError;
pub use step_error::StepError;
