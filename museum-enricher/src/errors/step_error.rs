//! Pipeline step error types.

use thiserror::Error;

use super::GeocodeError;

/// Errors a pipeline step can fail with. The pipeline logs them and moves on.
#[derive(Error, Debug)]
pub enum StepError {
    /// A geocoder call failed.
    #[error("Geocode error: {0}")]
    Geocode(#[from] GeocodeError),

    /// A value could not be merged into the item's results.
    #[error("Merge error: {0}")]
    MergeError(String),

    /// A result written by an earlier stage has an unexpected shape.
    #[error("Invalid result {key}: {reason}")]
    InvalidResult { key: String, reason: String },
}

impl StepError {
    /// Create a merge error.
    pub fn merge(msg: impl Into<String>) -> Self {
        Self::MergeError(msg.into())
    }

    /// Create an invalid result error.
    pub fn invalid_result(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResult {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
