//! # Museum Crawler
//!
//! Walks a Wikipedia category tree and streams the museums linked from its
//! listing pages.
//!
//! ## Architecture
//!
//! 1. **Client**: talks to the MediaWiki query API
//! 2. **Service**: follows pagination and picks page content
//! 3. **Extractor**: pulls museum links out of list markup
//! 4. **Geo**: infers a country from a listing page title
//! 5. **Crawler**: depth-first, cycle-safe traversal emitting museums

pub mod client;
pub mod config;
pub mod crawler;
pub mod errors;
pub mod extractor;
pub mod geo;
pub mod models;
pub mod service;

pub use client::{WikiApi, WikipediaClient};
pub use config::CrawlerConfig;
pub use crawler::{CategoryCrawler, CrawlState};
pub use errors::CrawlError;
pub use extractor::MuseumExtractor;
pub use service::CategoryService;
