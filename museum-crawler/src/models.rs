//! MediaWiki API response types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Namespace of category pages.
pub const CATEGORY_NAMESPACE: i32 = 14;

/// Response of a `list=categorymembers` query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryMembersResponse {
    #[serde(default)]
    pub query: CategoryQuery,
    /// Pagination info; absent on the last page.
    #[serde(rename = "continue", default)]
    pub continuation: Continuation,
}

impl CategoryMembersResponse {
    /// The cursor for the next page, if there is one.
    pub fn next_cursor(&self) -> Option<&str> {
        Some(self.continuation.cmcontinue.as_str()).filter(|c| !c.is_empty())
    }
}

/// Continuation token for the next request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Continuation {
    #[serde(default)]
    pub cmcontinue: String,
    #[serde(rename = "continue", default)]
    pub marker: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryQuery {
    #[serde(rename = "categorymembers", default)]
    pub category_members: Vec<CategoryMember>,
}

/// A page or subcategory listed in a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMember {
    #[serde(rename = "pageid", default)]
    pub page_id: i64,
    /// 14 for categories, 0 for articles.
    #[serde(rename = "ns")]
    pub namespace: i32,
    pub title: String,
}

impl CategoryMember {
    /// Create a member entry.
    pub fn new(page_id: i64, namespace: i32, title: impl Into<String>) -> Self {
        Self {
            page_id,
            namespace,
            title: title.into(),
        }
    }

    /// Returns `true` if the member is itself a category.
    pub fn is_subcategory(&self) -> bool {
        self.namespace == CATEGORY_NAMESPACE
    }
}

/// Response of a `prop=revisions` query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageContentResponse {
    #[serde(default)]
    pub query: PageQuery,
}

impl PageContentResponse {
    /// Content of the first revision of the first page that has one.
    pub fn first_revision_content(&self) -> Option<&str> {
        self.query
            .pages
            .values()
            .find_map(|page| page.revisions.first())
            .map(|revision| revision.content.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub pages: BTreeMap<String, Page>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    #[serde(rename = "pageid", default)]
    pub page_id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub revisions: Vec<Revision>,
}

/// Wikitext of a single revision.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Revision {
    #[serde(rename = "*", default)]
    pub content: String,
}
