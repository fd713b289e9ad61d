//! Page-level scraping: navigation, obstacles, waits, extraction
//!
//! Headline and board failures never abort a run. Headlines degrade to an
//! empty list and a failed board degrades to a placeholder result.

use crate::browser::PageDriver;
use crate::config::Config;
use crate::crawler::extract::{extract_board, extract_headlines, ExtractRules, Selectors};
use crate::crawler::obstacle::{ObstacleHandler, ObstacleOutcome};
use crate::crawler::ScrapeError;
use crate::model::{BoardResult, HeadlineItem};
use std::time::Duration;
use url::Url;

/// Scrapes the headline page and individual boards through one tab
pub struct BoardScraper<'a> {
    config: &'a Config,
    selectors: Selectors,
    rules: &'a ExtractRules,
    obstacles: &'a ObstacleHandler,
}

impl<'a> BoardScraper<'a> {
    /// Creates a scraper, compiling the configured selectors
    pub fn new(
        config: &'a Config,
        rules: &'a ExtractRules,
        obstacles: &'a ObstacleHandler,
    ) -> Result<Self, crate::ConfigError> {
        Ok(Self {
            config,
            selectors: Selectors::compile(&config.selectors)?,
            rules,
            obstacles,
        })
    }

    /// Scrapes the headline carousel, best effort
    pub async fn scrape_headlines(&self, page: &dyn PageDriver) -> Vec<HeadlineItem> {
        match self.try_scrape_headlines(page).await {
            Ok(headlines) => {
                tracing::info!("Found {} headlines", headlines.len());
                headlines
            }
            Err(e) => {
                tracing::warn!("Headline scrape failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn try_scrape_headlines(
        &self,
        page: &dyn PageDriver,
    ) -> Result<Vec<HeadlineItem>, ScrapeError> {
        let base_url = &self.config.site.base_url;
        let base = Url::parse(base_url)
            .map_err(|e| ScrapeError::Extraction(format!("bad base url: {}", e)))?;

        self.navigate(page, base_url, self.config.timeouts.page_load())
            .await?;

        // The carousel is optional; extract whatever is present
        let wrapper = &self.config.selectors.headline_wrapper;
        if let Err(e) = page
            .wait_for_selector(wrapper, self.config.timeouts.selector_wait())
            .await
        {
            tracing::debug!("Headline wrapper not found: {}", e);
        }

        let html = page.content().await?;
        Ok(extract_headlines(&html, &self.selectors, &base))
    }

    /// Scrapes one board; any failure yields a placeholder result
    pub async fn scrape_board(&self, page: &dyn PageDriver, board_id: &str) -> BoardResult {
        let placeholder = self.config.site.placeholder_name(board_id);

        match self.try_scrape_board(page, board_id, &placeholder).await {
            Ok(board) => {
                tracing::info!(
                    "Board {} ({}): {} posts",
                    board_id,
                    board.name,
                    board.posts.len()
                );
                board
            }
            Err(e) => {
                tracing::warn!("Board {} failed: {}", board_id, e);
                BoardResult::failed(&placeholder)
            }
        }
    }

    async fn try_scrape_board(
        &self,
        page: &dyn PageDriver,
        board_id: &str,
        placeholder: &str,
    ) -> Result<BoardResult, ScrapeError> {
        let url = self.config.site.board_url(board_id);
        self.navigate(page, &url, self.config.timeouts.board_load())
            .await?;

        let row = &self.config.selectors.row;
        page.wait_for_selector(row, self.config.timeouts.selector_wait())
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ScrapeError::SelectorTimeout {
                        url: url.clone(),
                        selector: row.clone(),
                    }
                } else {
                    ScrapeError::Browser(e)
                }
            })?;

        let html = page.content().await?;
        Ok(extract_board(&html, &self.selectors, self.rules, placeholder))
    }

    /// Navigates and clears obstacles, retrying challenge pages with backoff
    async fn navigate(
        &self,
        page: &dyn PageDriver,
        url: &str,
        timeout: Duration,
    ) -> Result<(), ScrapeError> {
        let retries = self.config.obstacles.challenge_retries;
        let backoff = Duration::from_millis(self.config.obstacles.challenge_backoff_ms);
        let mut attempt = 0;

        loop {
            tracing::debug!("Navigating to {}", url);
            page.goto(url, timeout)
                .await
                .map_err(|source| ScrapeError::Navigation {
                    url: url.to_string(),
                    source,
                })?;

            match self.obstacles.clear(page).await {
                ObstacleOutcome::Absent => return Ok(()),
                ObstacleOutcome::Cleared => {
                    tracing::debug!("Obstacle cleared on {}", url);
                    return Ok(());
                }
                ObstacleOutcome::Failed {
                    retryable: true, ..
                } if attempt < retries => {
                    attempt += 1;
                    tracing::warn!(
                        "Challenge on {}, retry {}/{} in {:?}",
                        url,
                        attempt,
                        retries,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                ObstacleOutcome::Failed { reason, .. } => {
                    return Err(ScrapeError::Challenge {
                        url: url.to_string(),
                        reason,
                    });
                }
            }
        }
    }
}
