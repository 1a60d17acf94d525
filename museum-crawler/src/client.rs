//! MediaWiki API client.
//!
//! Provides the category-listing and page-content collaborators behind the
//! [`WikiApi`] trait so the crawler can be driven by fixtures in tests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::CrawlerConfig;
use crate::errors::CrawlError;
use crate::models::{CategoryMembersResponse, PageContentResponse};

/// Maximum members returned per listing request.
const CATEGORY_MEMBERS_LIMIT: &str = "500";

/// The two MediaWiki queries the crawler needs.
#[async_trait]
pub trait WikiApi: Send + Sync {
    /// Fetch one page of members of `title`, resuming from `cursor`.
    async fn fetch_category_members(
        &self,
        title: &str,
        cursor: Option<&str>,
    ) -> Result<CategoryMembersResponse, CrawlError>;

    /// Fetch the latest revision of the page `title`.
    async fn fetch_page_content(&self, title: &str) -> Result<PageContentResponse, CrawlError>;
}

/// HTTP client for the MediaWiki query API.
pub struct WikipediaClient {
    http: Client,
    endpoint: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl WikipediaClient {
    /// Create a client from crawler configuration.
    pub fn new(config: &CrawlerConfig) -> Result<Self, CrawlError> {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            http,
            endpoint: format!("{}/w/api.php", config.api_url.trim_end_matches('/')),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    /// MediaWiki titles use underscores in place of spaces.
    fn api_title(title: &str) -> String {
        title.replace(' ', "_")
    }

    fn is_retryable_status(status: StatusCode) -> bool {
        status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
    }

    /// Issue a GET against the API endpoint, retrying transient failures with
    /// a fixed delay.
    async fn get_json<R: DeserializeOwned>(
        &self,
        params: &[(&str, &str)],
    ) -> Result<R, CrawlError> {
        let mut attempt = 0;

        loop {
            let result = self.http.get(&self.endpoint).query(params).send().await;

            let retryable = match result {
                Ok(response) if response.status().is_success() => {
                    return response.json::<R>().await.map_err(CrawlError::from);
                }
                Ok(response) => {
                    let status = response.status();
                    if !Self::is_retryable_status(status) {
                        return Err(CrawlError::http(format!("unexpected status {}", status)));
                    }
                    CrawlError::http(format!("unexpected status {}", status))
                }
                Err(e) if e.is_timeout() || e.is_connect() => CrawlError::from(e),
                Err(e) => return Err(CrawlError::from(e)),
            };

            if attempt >= self.max_retries {
                return Err(retryable);
            }
            attempt += 1;

            warn!(
                attempt = attempt,
                max_retries = self.max_retries,
                delay_ms = self.retry_delay.as_millis() as u64,
                error = %retryable,
                "Wikipedia request failed, retrying"
            );
            tokio::time::sleep(self.retry_delay).await;
        }
    }
}

#[async_trait]
impl WikiApi for WikipediaClient {
    async fn fetch_category_members(
        &self,
        title: &str,
        cursor: Option<&str>,
    ) -> Result<CategoryMembersResponse, CrawlError> {
        let title = Self::api_title(title);
        debug!(title = %title, cursor = ?cursor, "Fetching category members");

        let mut params = vec![
            ("action", "query"),
            ("list", "categorymembers"),
            ("cmtitle", title.as_str()),
            ("format", "json"),
            ("cmlimit", CATEGORY_MEMBERS_LIMIT),
        ];
        if let Some(cursor) = cursor {
            params.push(("cmcontinue", cursor));
        }

        self.get_json(&params).await
    }

    async fn fetch_page_content(&self, title: &str) -> Result<PageContentResponse, CrawlError> {
        let title = Self::api_title(title);
        debug!(title = %title, "Fetching page content");

        let params = [
            ("action", "query"),
            ("prop", "revisions"),
            ("rvprop", "content"),
            ("titles", title.as_str()),
            ("format", "json"),
        ];

        self.get_json(&params).await
    }
}
