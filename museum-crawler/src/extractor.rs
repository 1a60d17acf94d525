//! Museum link extraction from list wikitext.

use std::sync::LazyLock;

use regex::Regex;

/// Inline icon markers such as `:flag:` embedded in a link target.
static ICON_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":(.*?):").expect("valid regex"));

/// Extracts museum names from the bulleted and numbered lists of a page.
#[derive(Debug, Clone, Default)]
pub struct MuseumExtractor {
    blocklist: Vec<String>,
}

impl MuseumExtractor {
    /// Create an extractor discarding links that start with any of `blocklist`.
    pub fn new(blocklist: Vec<String>) -> Self {
        Self { blocklist }
    }

    /// Extract one candidate per qualifying list line.
    ///
    /// A line qualifies when, once trimmed, it starts with `*` or `#`. The
    /// first `[[...]]` link of the line is taken, its `|alias` suffix and any
    /// `:icon:` markers are removed, and blocklisted candidates are dropped.
    pub fn extract(&self, content: &str) -> Vec<String> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with('*') || line.starts_with('#'))
            .filter_map(first_link_target)
            .map(|target| {
                let target = target.split('|').next().unwrap_or_default();
                ICON_MARKER_RE.replace_all(target, "").trim().to_string()
            })
            .filter(|candidate| !candidate.is_empty() && self.include(candidate))
            .collect()
    }

    fn include(&self, candidate: &str) -> bool {
        !self
            .blocklist
            .iter()
            .any(|prefix| candidate.starts_with(prefix.as_str()))
    }
}

/// The text between the first `[[` and the first `]]` of a line.
fn first_link_target(line: &str) -> Option<&str> {
    let start = line.find("[[")?;
    let end = line.find("]]")?;
    (end > start).then(|| &line[start + 2..end])
}
