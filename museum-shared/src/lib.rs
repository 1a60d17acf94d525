//! # Museum Shared
//!
//! Types shared by the crawler, the repository and the enricher:
//!
//! - [`Museum`]: the entity discovered by the crawler and enriched later
//! - [`storage_key`]: the canonical object key both writer and reader derive
//! - [`StreamMessage`]: the tagged element carried by every streaming channel

mod museum;
mod stream;

pub use museum::{normalize_key_segment, storage_key, Museum, RAW_DATA_PREFIX};
pub use stream::StreamMessage;
