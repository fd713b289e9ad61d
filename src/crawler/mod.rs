//! Crawler module for browser-driven board scraping
//!
//! This module contains the core crawling logic, including:
//! - Obstacle handling (consent gates, challenge pages)
//! - Pure extraction over rendered HTML
//! - Pacing between board fetches
//! - Reconciliation against stored user actions
//! - Overall crawl coordination

mod board;
mod coordinator;
mod extract;
mod obstacle;
mod rate_limiter;
mod reconcile;

pub use board::BoardScraper;
pub use coordinator::{format_generated_at, Coordinator, RunPhase, GENERATED_AT_FORMAT};
pub use extract::{extract_board, extract_headlines, ExtractRules, Selectors};
pub use obstacle::{
    ChallengePageStrategy, ConsentGateStrategy, ObstacleHandler, ObstacleOutcome, ObstacleStrategy,
};
pub use rate_limiter::RateLimiter;
pub use reconcile::{disposition, reconcile, Disposition};

use crate::browser::BrowserError;
use thiserror::Error;

/// Reasons a single page scrape can fail
///
/// These never escape a crawl; they are logged and turned into placeholder
/// results.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Navigation to {url} failed: {source}")]
    Navigation {
        url: String,
        #[source]
        source: BrowserError,
    },

    #[error("Timed out waiting for '{selector}' on {url}")]
    SelectorTimeout { url: String, selector: String },

    #[error("Blocked by challenge page at {url}: {reason}")]
    Challenge { url: String, reason: String },

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),
}
