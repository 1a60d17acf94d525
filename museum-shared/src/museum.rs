//! The museum entity and its canonical storage key.

use serde::{Deserialize, Serialize};

/// Prefix under which raw (not yet enriched) museum records are stored.
pub const RAW_DATA_PREFIX: &str = "raw_data";

/// A museum discovered from a category listing.
///
/// Records written by earlier versions of the parser used capitalised field
/// names, so both spellings are accepted when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Museum {
    /// Country inferred from the listing page title. May be empty.
    #[serde(alias = "Country")]
    pub country: String,
    /// Museum name as linked from the listing page.
    #[serde(alias = "Name")]
    pub name: String,
}

impl Museum {
    /// Create a new museum.
    pub fn new(country: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            name: name.into(),
        }
    }

    /// The canonical object key for this museum.
    pub fn storage_key(&self) -> String {
        storage_key(&self.country, &self.name)
    }
}

/// Normalize a single key segment: spaces become hyphens, then lower-case.
pub fn normalize_key_segment(segment: &str) -> String {
    segment.replace(' ', "-").to_lowercase()
}

/// Derive the canonical object key `raw_data/<country>/<name>.json`.
///
/// This is the only addressing scheme for stored museums; the crawler's writer
/// and the enricher's loader both go through it.
pub fn storage_key(country: &str, name: &str) -> String {
    format!(
        "{}/{}/{}.json",
        RAW_DATA_PREFIX,
        normalize_key_segment(country),
        normalize_key_segment(name)
    )
}
