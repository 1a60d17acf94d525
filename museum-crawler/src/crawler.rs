//! Recursive category crawler.
//!
//! Walks a category tree depth-first on a single task, extracts museum links
//! from every listing page it meets and streams them as they are found. Each
//! crawl owns its own [`CrawlState`], so a title is never processed twice
//! within one run and cycles in the category graph terminate.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use museum_shared::{Museum, StreamMessage};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::client::WikiApi;
use crate::config::CrawlerConfig;
use crate::errors::CrawlError;
use crate::extractor::MuseumExtractor;
use crate::geo::extract_country;
use crate::service::CategoryService;

/// Marker identifying a link that points at a further listing page.
const LIST_MARKER: &str = "List";

/// State of a single crawl invocation.
#[derive(Debug, Default)]
pub struct CrawlState {
    visited: HashSet<String>,
    /// Categories whose members were requested.
    pub categories: usize,
    /// Pages whose content was requested.
    pub pages: usize,
    /// Museums handed to the output stream.
    pub emitted: usize,
    /// Titles abandoned after a fetch error.
    pub errors: usize,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `title` as visited. Returns `false` if it already was.
    pub fn visit(&mut self, title: &str) -> bool {
        self.visited.insert(title.to_string())
    }

    /// Number of distinct titles seen so far.
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

/// Everything a walk mutates, owned by the crawl task.
struct Walk {
    state: CrawlState,
    tx: mpsc::Sender<StreamMessage<Museum>>,
    shutdown: CancellationToken,
}

impl Walk {
    fn ensure_running(&self) -> Result<(), CrawlError> {
        if self.shutdown.is_cancelled() {
            return Err(CrawlError::Cancelled);
        }
        Ok(())
    }

    async fn send(&self, message: StreamMessage<Museum>) -> Result<(), CrawlError> {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(CrawlError::Cancelled),
            res = self.tx.send(message) => res.map_err(|e| CrawlError::channel(e.to_string())),
        }
    }

    /// Await a fetch unless the crawl is cancelled first.
    async fn fetch<T>(
        &self,
        fut: impl Future<Output = Result<T, CrawlError>>,
    ) -> Result<T, CrawlError> {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(CrawlError::Cancelled),
            res = fut => res,
        }
    }

    /// Log a failed fetch and report it on the stream.
    async fn report(&mut self, kind: &str, title: &str, err: &CrawlError) -> Result<(), CrawlError> {
        self.state.errors += 1;
        warn!(title = %title, error = %err, "Failed to fetch {}, skipping", kind);
        self.send(StreamMessage::Error(format!("{} {}: {}", kind, title, err)))
            .await
    }
}

/// Depth-first crawler over a Wikipedia category tree.
#[derive(Clone)]
pub struct CategoryCrawler {
    service: CategoryService,
    extractor: MuseumExtractor,
    channel_buffer_size: usize,
}

impl CategoryCrawler {
    /// Create a crawler with the default output buffer.
    pub fn new(service: CategoryService, extractor: MuseumExtractor) -> Self {
        Self {
            service,
            extractor,
            channel_buffer_size: CrawlerConfig::default().channel_buffer_size,
        }
    }

    /// Create a crawler from configuration over the given API.
    pub fn with_config(api: Arc<dyn WikiApi>, config: &CrawlerConfig) -> Self {
        Self {
            service: CategoryService::new(api),
            extractor: MuseumExtractor::new(config.blocklist.clone()),
            channel_buffer_size: config.channel_buffer_size.max(1),
        }
    }

    /// Start crawling from the category `root`.
    ///
    /// Museums are streamed as they are discovered. Titles that cannot be
    /// fetched show up as [`StreamMessage::Error`] and the walk carries on.
    /// The stream always finishes with [`StreamMessage::End`], also when
    /// `shutdown` fires mid-crawl.
    pub fn crawl(
        &self,
        root: impl Into<String>,
        shutdown: CancellationToken,
    ) -> mpsc::Receiver<StreamMessage<Museum>> {
        let (tx, rx) = mpsc::channel(self.channel_buffer_size);
        let crawler = self.clone();
        let root = root.into();

        tokio::spawn(async move {
            info!(root = %root, "Starting crawl");

            let mut walk = Walk {
                state: CrawlState::new(),
                tx,
                shutdown,
            };

            match crawler.walk_category(&mut walk, root.clone()).await {
                Ok(()) => info!(
                    root = %root,
                    categories = walk.state.categories,
                    pages = walk.state.pages,
                    museums = walk.state.emitted,
                    errors = walk.state.errors,
                    visited = walk.state.visited_count(),
                    "Crawl completed"
                ),
                Err(CrawlError::Cancelled) => warn!(
                    root = %root,
                    museums = walk.state.emitted,
                    "Crawl cancelled"
                ),
                Err(e) => error!(root = %root, error = %e, "Crawl aborted"),
            }

            let _ = walk.tx.send(StreamMessage::End).await;
        });

        rx
    }

    fn walk_category<'a>(
        &'a self,
        walk: &'a mut Walk,
        title: String,
    ) -> BoxFuture<'a, Result<(), CrawlError>> {
        async move {
            walk.ensure_running()?;
            if !walk.state.visit(&title) {
                debug!(title = %title, "Category already visited");
                return Ok(());
            }
            walk.state.categories += 1;

            let listed = walk
                .fetch(self.service.get_all_category_members(&title))
                .await;
            let members = match listed {
                Ok(members) => members,
                Err(CrawlError::Cancelled) => return Err(CrawlError::Cancelled),
                Err(e) => return walk.report("category", &title, &e).await,
            };

            debug!(title = %title, members = members.len(), "Walking category");

            for member in members {
                if member.is_subcategory() {
                    self.walk_category(walk, member.title).await?;
                } else {
                    self.process_page(walk, member.title).await?;
                }
            }

            Ok(())
        }
        .boxed()
    }

    fn process_page<'a>(
        &'a self,
        walk: &'a mut Walk,
        title: String,
    ) -> BoxFuture<'a, Result<(), CrawlError>> {
        async move {
            walk.ensure_running()?;
            if !walk.state.visit(&title) {
                debug!(title = %title, "Page already visited");
                return Ok(());
            }
            walk.state.pages += 1;

            let fetched = walk.fetch(self.service.get_page_content(&title)).await;
            let content = match fetched {
                Ok(content) => content,
                Err(CrawlError::Cancelled) => return Err(CrawlError::Cancelled),
                Err(e) => return walk.report("page", &title, &e).await,
            };

            let country = extract_country(&title);
            let candidates = self.extractor.extract(&content);
            debug!(title = %title, country = %country, candidates = candidates.len(), "Processing page");

            for candidate in candidates {
                if candidate.contains(LIST_MARKER) {
                    self.process_page(walk, candidate).await?;
                    continue;
                }

                walk.state.emitted += 1;
                walk.send(StreamMessage::Item(Museum::new(country.clone(), candidate)))
                    .await?;
            }

            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CategoryMember, CategoryMembersResponse, CategoryQuery, Page, PageContentResponse,
        Revision,
    };
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Fixture-backed API counting every request by title.
    #[derive(Default)]
    struct FixtureApi {
        categories: HashMap<String, Vec<CategoryMember>>,
        pages: HashMap<String, String>,
        listings: Mutex<HashMap<String, usize>>,
        fetches: Mutex<HashMap<String, usize>>,
    }

    impl FixtureApi {
        fn category(mut self, title: &str, members: Vec<CategoryMember>) -> Self {
            self.categories.insert(title.to_string(), members);
            self
        }

        fn page(mut self, title: &str, content: &str) -> Self {
            self.pages.insert(title.to_string(), content.to_string());
            self
        }

        fn listings_of(&self, title: &str) -> usize {
            *self.listings.lock().unwrap().get(title).unwrap_or(&0)
        }

        fn fetches_of(&self, title: &str) -> usize {
            *self.fetches.lock().unwrap().get(title).unwrap_or(&0)
        }
    }

    #[async_trait]
    impl WikiApi for FixtureApi {
        async fn fetch_category_members(
            &self,
            title: &str,
            _cursor: Option<&str>,
        ) -> Result<CategoryMembersResponse, CrawlError> {
            *self
                .listings
                .lock()
                .unwrap()
                .entry(title.to_string())
                .or_default() += 1;

            let members = self
                .categories
                .get(title)
                .cloned()
                .ok_or_else(|| CrawlError::http("unexpected status 404 Not Found"))?;

            Ok(CategoryMembersResponse {
                query: CategoryQuery {
                    category_members: members,
                },
                ..Default::default()
            })
        }

        async fn fetch_page_content(&self, title: &str) -> Result<PageContentResponse, CrawlError> {
            *self
                .fetches
                .lock()
                .unwrap()
                .entry(title.to_string())
                .or_default() += 1;

            let mut resp = PageContentResponse::default();
            if let Some(content) = self.pages.get(title) {
                resp.query.pages.insert(
                    "1".to_string(),
                    Page {
                        page_id: 1,
                        title: title.to_string(),
                        revisions: vec![Revision {
                            content: content.clone(),
                        }],
                    },
                );
            }
            Ok(resp)
        }
    }

    fn subcategory(title: &str) -> CategoryMember {
        CategoryMember::new(0, 14, title)
    }

    fn article(title: &str) -> CategoryMember {
        CategoryMember::new(0, 0, title)
    }

    fn crawler(api: Arc<FixtureApi>) -> CategoryCrawler {
        CategoryCrawler::with_config(api, &CrawlerConfig::default())
    }

    /// Drain the stream, returning the museums and error messages seen
    /// before the end marker.
    async fn collect(
        mut rx: mpsc::Receiver<StreamMessage<Museum>>,
    ) -> (Vec<Museum>, Vec<String>) {
        let mut museums = Vec::new();
        let mut errors = Vec::new();

        while let Some(message) = rx.recv().await {
            match message {
                StreamMessage::Item(museum) => museums.push(museum),
                StreamMessage::Error(e) => errors.push(e),
                StreamMessage::End => return (museums, errors),
            }
        }

        panic!("stream closed without an end marker");
    }

    #[tokio::test]
    async fn test_cycle_terminates_and_lists_each_category_once() {
        let api = Arc::new(
            FixtureApi::default()
                .category("Category:A", vec![subcategory("Category:B")])
                .category("Category:B", vec![subcategory("Category:A")]),
        );

        let rx = crawler(api.clone()).crawl("Category:A", CancellationToken::new());
        let (museums, errors) = collect(rx).await;

        assert!(museums.is_empty());
        assert!(errors.is_empty());
        assert_eq!(api.listings_of("Category:A"), 1);
        assert_eq!(api.listings_of("Category:B"), 1);
    }

    #[tokio::test]
    async fn test_two_level_tree_infers_country_and_drops_blocklisted_links() {
        let api = Arc::new(
            FixtureApi::default()
                .category(
                    "Category:Root",
                    vec![subcategory("Category:Sub"), article("Museums in Spain")],
                )
                .category("Category:Sub", vec![article("Art collections")])
                .page("Art collections", "* [[Louvre]]")
                .page(
                    "Museums in Spain",
                    "Intro text\n* [[Museo del Prado]]\n* [[Category:Museums in Madrid]]\n# [[Guggenheim Museum Bilbao|Guggenheim]]",
                ),
        );

        let rx = crawler(api).crawl("Category:Root", CancellationToken::new());
        let (museums, errors) = collect(rx).await;

        assert!(errors.is_empty());
        assert_eq!(
            museums,
            vec![
                Museum::new("", "Louvre"),
                Museum::new("Spain", "Museo del Prado"),
                Museum::new("Spain", "Guggenheim Museum Bilbao"),
            ]
        );
    }

    #[tokio::test]
    async fn test_listing_error_is_reported_and_siblings_continue() {
        let api = Arc::new(
            FixtureApi::default()
                .category(
                    "Category:Root",
                    vec![subcategory("Category:Broken"), article("Museums in Peru")],
                )
                .page("Museums in Peru", "* [[Museo Larco]]"),
        );

        let rx = crawler(api).crawl("Category:Root", CancellationToken::new());
        let (museums, errors) = collect(rx).await;

        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Category:Broken"));
        assert_eq!(museums, vec![Museum::new("Peru", "Museo Larco")]);
    }

    #[tokio::test]
    async fn test_missing_page_content_is_reported() {
        let api = Arc::new(
            FixtureApi::default().category("Category:Root", vec![article("Museums in Nowhere")]),
        );

        let rx = crawler(api).crawl("Category:Root", CancellationToken::new());
        let (museums, errors) = collect(rx).await;

        assert!(museums.is_empty());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Museums in Nowhere"));
    }

    #[tokio::test]
    async fn test_list_links_are_followed_once() {
        let api = Arc::new(
            FixtureApi::default()
                .category("Category:Root", vec![article("Lists of museums in Europe")])
                .page(
                    "Lists of museums in Europe",
                    "* [[List of museums in France]]\n* [[List of museums in France|France]]",
                )
                .page("List of museums in France", "* [[Louvre]]\n* [[Lists of museums in Europe]]"),
        );

        let rx = crawler(api.clone()).crawl("Category:Root", CancellationToken::new());
        let (museums, errors) = collect(rx).await;

        assert!(errors.is_empty());
        assert_eq!(museums, vec![Museum::new("France", "Louvre")]);
        assert_eq!(api.fetches_of("List of museums in France"), 1);
        assert_eq!(api.fetches_of("Lists of museums in Europe"), 1);
    }

    #[tokio::test]
    async fn test_cancelled_crawl_still_ends_stream() {
        let api = Arc::new(
            FixtureApi::default()
                .category("Category:Root", vec![article("Museums in Peru")])
                .page("Museums in Peru", "* [[Museo Larco]]"),
        );
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let rx = crawler(api.clone()).crawl("Category:Root", shutdown);
        let (museums, _) = collect(rx).await;

        assert!(museums.is_empty());
        assert_eq!(api.listings_of("Category:Root"), 0);
    }

    #[test]
    fn test_crawl_state_visits_once() {
        let mut state = CrawlState::new();
        assert!(state.visit("Category:A"));
        assert!(!state.visit("Category:A"));
        assert!(state.visit("Category:B"));
        assert_eq!(state.visited_count(), 2);
    }
}
