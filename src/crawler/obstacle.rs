//! Consent-gate and bot-challenge handling
//!
//! Obstacles are checked after navigation and before waiting for content.
//! Each [`ObstacleStrategy`] is tried in order. A challenge page stops the
//! sequence and is reported to the caller as a retryable failure; any error
//! raised while handling an obstacle is logged and swallowed.

use crate::browser::{BrowserError, PageDriver};
use crate::config::Config;
use async_trait::async_trait;
use std::time::Duration;

/// Result of an obstacle check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObstacleOutcome {
    /// An obstacle was present and has been dismissed
    Cleared,

    /// No obstacle detected
    Absent,

    /// An obstacle blocks the page
    Failed { retryable: bool, reason: String },
}

/// One kind of obstacle and how to get past it
#[async_trait]
pub trait ObstacleStrategy: Send + Sync {
    fn name(&self) -> &str;

    async fn attempt(&self, page: &dyn PageDriver) -> Result<ObstacleOutcome, BrowserError>;
}

/// Detects bot-challenge pages by their title
pub struct ChallengePageStrategy {
    signatures: Vec<String>,
}

impl ChallengePageStrategy {
    pub fn new(signatures: Vec<String>) -> Self {
        Self { signatures }
    }
}

#[async_trait]
impl ObstacleStrategy for ChallengePageStrategy {
    fn name(&self) -> &str {
        "challenge-page"
    }

    async fn attempt(&self, page: &dyn PageDriver) -> Result<ObstacleOutcome, BrowserError> {
        let title = page.title().await?.unwrap_or_default();

        match self.signatures.iter().find(|sig| title.contains(sig.as_str())) {
            Some(signature) => Ok(ObstacleOutcome::Failed {
                retryable: true,
                reason: format!("challenge page detected (title matches '{}')", signature),
            }),
            None => Ok(ObstacleOutcome::Absent),
        }
    }
}

/// Clicks through an age/consent gate
pub struct ConsentGateStrategy {
    selectors: Vec<String>,
    timeout: Duration,
}

impl ConsentGateStrategy {
    pub fn new(selectors: Vec<String>, timeout: Duration) -> Self {
        Self { selectors, timeout }
    }
}

#[async_trait]
impl ObstacleStrategy for ConsentGateStrategy {
    fn name(&self) -> &str {
        "consent-gate"
    }

    async fn attempt(&self, page: &dyn PageDriver) -> Result<ObstacleOutcome, BrowserError> {
        for selector in &self.selectors {
            if page.has_element(selector).await? {
                tracing::info!("Consent gate found ({}), accepting", selector);
                page.click_and_settle(selector, self.timeout).await?;
                return Ok(ObstacleOutcome::Cleared);
            }
        }

        Ok(ObstacleOutcome::Absent)
    }
}

/// Ordered list of obstacle strategies
pub struct ObstacleHandler {
    strategies: Vec<Box<dyn ObstacleStrategy>>,
}

impl ObstacleHandler {
    /// Handler with no strategies; every page is obstacle-free
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Challenge detection first, then the consent gate
    pub fn from_config(config: &Config) -> Self {
        Self::empty()
            .with_strategy(ChallengePageStrategy::new(
                config.obstacles.challenge_titles.clone(),
            ))
            .with_strategy(ConsentGateStrategy::new(
                config.obstacles.consent_selectors.clone(),
                config.timeouts.consent(),
            ))
    }

    /// Appends a strategy to the end of the list
    pub fn with_strategy(mut self, strategy: impl ObstacleStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Runs every strategy against the current page
    ///
    /// Returns the first `Failed` outcome, otherwise `Cleared` if any strategy
    /// dismissed something, otherwise `Absent`. Never returns an error.
    pub async fn clear(&self, page: &dyn PageDriver) -> ObstacleOutcome {
        let mut cleared = false;

        for strategy in &self.strategies {
            match strategy.attempt(page).await {
                Ok(ObstacleOutcome::Cleared) => cleared = true,
                Ok(ObstacleOutcome::Absent) => {}
                Ok(failed @ ObstacleOutcome::Failed { .. }) => {
                    tracing::warn!("Obstacle '{}' blocks the page: {:?}", strategy.name(), failed);
                    return failed;
                }
                Err(e) => {
                    tracing::warn!("Obstacle '{}' handling failed, ignoring: {}", strategy.name(), e);
                }
            }
        }

        if cleared {
            ObstacleOutcome::Cleared
        } else {
            ObstacleOutcome::Absent
        }
    }
}
