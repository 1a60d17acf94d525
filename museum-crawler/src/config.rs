//! Configuration for the crawler and its API client.

/// Default MediaWiki host.
pub const DEFAULT_API_URL: &str = "https://en.wikipedia.org";

/// Default category the parser starts from.
pub const DEFAULT_ROOT_CATEGORY: &str = "Category:Lists_of_museums_by_country";

/// Default user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("museum-crawler/", env!("CARGO_PKG_VERSION"));

/// Link prefixes that never name a museum.
pub const DEFAULT_BLOCKLIST: &[&str] = &[
    "Category:",
    "File:",
    "Image:",
    "Tourism",
    "Culture",
    "History",
    "UNESCO",
];

/// Configuration for the crawler.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Base URL of the MediaWiki host (the client appends `/w/api.php`).
    pub api_url: String,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Category the crawl starts from.
    pub root_category: String,
    /// Link prefixes to discard (exact, case-sensitive prefix match).
    pub blocklist: Vec<String>,
    /// Capacity of the museum output channel.
    pub channel_buffer_size: usize,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Retries for transient HTTP failures.
    pub max_retries: u32,
    /// Fixed delay between retries in milliseconds.
    pub retry_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            root_category: DEFAULT_ROOT_CATEGORY.to_string(),
            blocklist: DEFAULT_BLOCKLIST.iter().map(|s| s.to_string()).collect(),
            channel_buffer_size: 100,
            request_timeout_ms: 30_000,
            max_retries: 3,
            retry_delay_ms: 1_000,
        }
    }
}
