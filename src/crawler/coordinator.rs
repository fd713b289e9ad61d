//! Crawler coordinator - one full crawl per call
//!
//! A run moves through these phases:
//! - acquire a browser session (the only fatal step)
//! - scrape the headline page
//! - scrape every watched board in order, pausing between boards
//! - load the state snapshot and reconcile
//! - stamp the result and release the session

use crate::browser::{BrowserLauncher, PageDriver};
use crate::config::Config;
use crate::crawler::board::BoardScraper;
use crate::crawler::extract::ExtractRules;
use crate::crawler::obstacle::ObstacleHandler;
use crate::crawler::rate_limiter::RateLimiter;
use crate::crawler::reconcile::reconcile;
use crate::model::{BoardResult, CrawlResult, HeadlineItem};
use crate::storage::{snapshot_or_empty, SharedStore};
use crate::SiftError;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Format of `generatedAt`, e.g. `2026/10/19 08:05:09`
pub const GENERATED_AT_FORMAT: &str = "%Y/%-m/%-d %H:%M:%S";

/// Lifecycle of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    SessionAcquired,
    HeadlinesDone,
    BoardsDone,
    Reconciled,
    Released,
    Failed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::SessionAcquired => "session-acquired",
            Self::HeadlinesDone => "headlines-done",
            Self::BoardsDone => "boards-done",
            Self::Reconciled => "reconciled",
            Self::Released => "released",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    launcher: Box<dyn BrowserLauncher>,
    store: Option<SharedStore>,
    rules: ExtractRules,
    limiter: RateLimiter,
    obstacles: ObstacleHandler,

    /// Phase of the current or most recent run
    phase: Mutex<RunPhase>,
}

impl Coordinator {
    /// Creates a coordinator for the live crawl
    ///
    /// # Arguments
    ///
    /// * `config` - The shared configuration
    /// * `launcher` - Starts the browser session for each run
    /// * `store` - State store consulted during reconciliation
    pub fn new(config: Arc<Config>, launcher: Box<dyn BrowserLauncher>, store: SharedStore) -> Self {
        Self {
            rules: ExtractRules::live(&config),
            limiter: RateLimiter::from_config(&config.rate_limit),
            obstacles: ObstacleHandler::from_config(&config),
            store: Some(store),
            config,
            launcher,
            phase: Mutex::new(RunPhase::Idle),
        }
    }

    /// Creates a coordinator for the snapshot batch job
    ///
    /// Uses the batch fetch limit, the merged ban list and a fixed delay, and
    /// skips reconciliation.
    pub fn for_snapshot(config: Arc<Config>, launcher: Box<dyn BrowserLauncher>) -> Self {
        Self {
            rules: ExtractRules::snapshot(&config),
            limiter: RateLimiter::fixed(Duration::from_millis(config.snapshot.delay_ms)),
            obstacles: ObstacleHandler::from_config(&config),
            store: None,
            config,
            launcher,
            phase: Mutex::new(RunPhase::Idle),
        }
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_obstacles(mut self, obstacles: ObstacleHandler) -> Self {
        self.obstacles = obstacles;
        self
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Phase reached by the current or most recent run
    pub fn phase(&self) -> RunPhase {
        self.phase
            .lock()
            .map(|phase| *phase)
            .unwrap_or(RunPhase::Failed)
    }

    fn advance(&self, next: RunPhase) {
        if let Ok(mut phase) = self.phase.lock() {
            tracing::debug!("Crawl phase: {} -> {}", *phase, next);
            *phase = next;
        }
    }

    /// Runs one crawl
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlResult)` - Every watched board appears, in configured order
    /// * `Err(SiftError)` - The browser session could not be acquired
    pub async fn run(&self) -> Result<CrawlResult, SiftError> {
        self.advance(RunPhase::Idle);
        let scraper = BoardScraper::new(&self.config, &self.rules, &self.obstacles)?;

        let mut session = match self.launcher.acquire().await {
            Ok(session) => session,
            Err(e) => {
                self.advance(RunPhase::Failed);
                tracing::error!("Could not start browser: {}", e);
                return Err(e.into());
            }
        };
        self.advance(RunPhase::SessionAcquired);

        let (headlines, boards) = self.collect(&scraper, session.page()).await;

        let boards = match &self.store {
            Some(store) => reconcile(boards, &snapshot_or_empty(store, Utc::now())),
            None => boards,
        };
        self.advance(RunPhase::Reconciled);

        let generated_at = format_generated_at(Utc::now(), &self.config.site.timezone);

        session.release().await;
        self.advance(RunPhase::Released);

        Ok(CrawlResult {
            headlines,
            boards,
            generated_at,
        })
    }

    async fn collect(
        &self,
        scraper: &BoardScraper<'_>,
        page: &dyn PageDriver,
    ) -> (Vec<HeadlineItem>, Vec<BoardResult>) {
        let headlines = scraper.scrape_headlines(page).await;
        self.advance(RunPhase::HeadlinesDone);

        let board_ids = &self.config.watch.boards;
        let mut boards = Vec::with_capacity(board_ids.len());

        for (i, board_id) in board_ids.iter().enumerate() {
            if i > 0 {
                self.limiter.delay().await;
            }
            tracing::info!("Scraping board {} ({}/{})", board_id, i + 1, board_ids.len());
            boards.push(scraper.scrape_board(page, board_id).await);
        }
        self.advance(RunPhase::BoardsDone);

        (headlines, boards)
    }
}

/// Formats a timestamp in the given IANA timezone
///
/// Falls back to UTC when the timezone name does not parse.
pub fn format_generated_at(now: DateTime<Utc>, timezone: &str) -> String {
    match timezone.parse::<Tz>() {
        Ok(tz) => now.with_timezone(&tz).format(GENERATED_AT_FORMAT).to_string(),
        Err(_) => {
            tracing::warn!("Unknown timezone '{}', using UTC", timezone);
            now.format(GENERATED_AT_FORMAT).to_string()
        }
    }
}
