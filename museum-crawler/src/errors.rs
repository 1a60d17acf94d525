//! Error types for the crawler.

use thiserror::Error;

/// Errors that can occur while crawling.
#[derive(Error, Debug)]
pub enum CrawlError {
    /// The HTTP request failed or returned an error status.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The API response could not be decoded.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The page exists but no revision carried content.
    #[error("No content for {0}")]
    NoContent(String),

    /// The consumer of the museum stream went away.
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// The crawl was cancelled.
    #[error("Crawl cancelled")]
    Cancelled,
}

impl CrawlError {
    /// Create an HTTP error.
    pub fn http(msg: impl Into<String>) -> Self {
        Self::HttpError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a channel error.
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::ChannelError(msg.into())
    }
}

impl From<reqwest::Error> for CrawlError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::ParseError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}
