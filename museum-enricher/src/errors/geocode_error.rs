//! Geocoding error types.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by a geocoder.
#[derive(Error, Debug)]
pub enum GeocodeError {
    /// The request could not be sent or timed out.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The service answered with a non-success status.
    #[error("Unexpected status: {0}")]
    Status(StatusCode),

    /// The response body could not be decoded.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The search matched nothing.
    #[error("No results for {0}")]
    NoResults(String),

    /// The request arguments cannot be sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The caller's cancellation fired while waiting.
    #[error("Geocoding cancelled")]
    Cancelled,
}

impl GeocodeError {
    /// Create an HTTP error.
    pub fn http(msg: impl Into<String>) -> Self {
        Self::HttpError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create an invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpError(_) => true,
            Self::Status(status) => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for GeocodeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::ParseError(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status(status)
        } else {
            Self::HttpError(err.to_string())
        }
    }
}
