//! Browser session module
//!
//! The crawler never talks to a browser directly. It drives a [`PageDriver`]
//! obtained from a [`BrowserSession`], which a [`BrowserLauncher`] acquires
//! once per run. The chromiumoxide-backed implementation lives in `chrome`;
//! tests substitute in-memory fakes.

mod chrome;

pub use chrome::{ChromeLauncher, ChromePage, ChromeSession};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by browser operations
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Timed out after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Browser protocol error: {0}")]
    Protocol(String),
}

impl BrowserError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// One browser tab, as seen by the scraper
///
/// Every operation that can block carries its own timeout.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigates to `url` and waits for the load to finish
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), BrowserError>;

    /// Current document title, if any
    async fn title(&self) -> Result<Option<String>, BrowserError>;

    /// Waits until `selector` matches at least one element
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), BrowserError>;

    /// Whether `selector` currently matches an element
    async fn has_element(&self, selector: &str) -> Result<bool, BrowserError>;

    /// Clicks the first match of `selector`, then waits for the navigation it triggers
    async fn click_and_settle(&self, selector: &str, timeout: Duration) -> Result<(), BrowserError>;

    /// Serialized HTML of the current document
    async fn content(&self) -> Result<String, BrowserError>;
}

/// A running browser owned by one crawl
#[async_trait]
pub trait BrowserSession: Send {
    /// The tab all navigation happens in
    fn page(&self) -> &dyn PageDriver;

    /// Shuts the browser down
    ///
    /// Only the first call has an effect.
    async fn release(&mut self);
}

/// Starts browser sessions
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Launches a browser and opens a configured tab
    ///
    /// Failure here is fatal for the crawl.
    async fn acquire(&self) -> Result<Box<dyn BrowserSession>, BrowserError>;
}
