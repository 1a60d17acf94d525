//! Category service.
//!
//! Turns the paginated MediaWiki API into whole-category and whole-page reads.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::client::WikiApi;
use crate::errors::CrawlError;
use crate::models::CategoryMember;

/// Reads category listings and page content through a [`WikiApi`].
#[derive(Clone)]
pub struct CategoryService {
    api: Arc<dyn WikiApi>,
}

impl CategoryService {
    /// Create a service over the given API.
    pub fn new(api: Arc<dyn WikiApi>) -> Self {
        Self { api }
    }

    /// Fetch every member of a category, following continuation cursors until
    /// the API stops returning one.
    #[instrument(skip(self))]
    pub async fn get_all_category_members(
        &self,
        title: &str,
    ) -> Result<Vec<CategoryMember>, CrawlError> {
        let mut members = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let resp = self
                .api
                .fetch_category_members(title, cursor.as_deref())
                .await?;
            pages += 1;
            members.extend(resp.query.category_members.iter().cloned());

            match resp.next_cursor() {
                Some(next) if cursor.as_deref() == Some(next) => {
                    warn!(cursor = %next, "Listing returned the same cursor twice, stopping");
                    break;
                }
                Some(next) => cursor = Some(next.to_string()),
                None => break,
            }
        }

        debug!(count = members.len(), pages = pages, "Fetched category members");
        Ok(members)
    }

    /// Fetch the raw wikitext of a page.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Content of the first available revision
    /// * `Err(CrawlError::NoContent)` - If the page has no revision
    #[instrument(skip(self))]
    pub async fn get_page_content(&self, title: &str) -> Result<String, CrawlError> {
        let resp = self.api.fetch_page_content(title).await?;
        resp.first_revision_content()
            .map(str::to_string)
            .ok_or_else(|| CrawlError::NoContent(title.to_string()))
    }
}
