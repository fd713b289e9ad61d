//! Crawl output data model
//!
//! These records are created fresh on every run and discarded once returned.
//! Field names are camelCase on the wire so the display surface and the
//! offline snapshot file share one shape.

use serde::{Deserialize, Serialize};

/// One entry of the headline carousel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadlineItem {
    pub title: String,
    /// Absolute link to the headline article
    pub url: String,
}

/// One forum post extracted from a board listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub title: String,

    /// Natural key for state correlation; may be site-relative
    pub url: String,

    /// Site-native relative time text (e.g. "5分前")
    pub time: String,

    /// Preview text, empty when the row has none
    #[serde(default)]
    pub brief: String,

    /// Derived during reconciliation
    #[serde(default)]
    pub is_read: bool,
}

/// Posts of one watched board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardResult {
    pub name: String,
    pub posts: Vec<Post>,

    /// Set on placeholders for boards that could not be scraped; not part of
    /// the wire format
    #[serde(skip)]
    pub failed: bool,
}

impl BoardResult {
    pub fn new(name: impl Into<String>, posts: Vec<Post>) -> Self {
        Self {
            name: name.into(),
            posts,
            failed: false,
        }
    }

    /// Placeholder returned when scraping a board failed
    pub fn failed(placeholder: &str) -> Self {
        Self {
            name: format!("{} (Error)", placeholder),
            posts: Vec::new(),
            failed: true,
        }
    }
}

/// Root artifact of a crawl run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlResult {
    pub headlines: Vec<HeadlineItem>,
    pub boards: Vec<BoardResult>,
    pub generated_at: String,
}
