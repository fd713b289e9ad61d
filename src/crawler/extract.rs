//! Pure extraction over a rendered page's HTML
//!
//! The browser hands over the serialized document; everything below works on a
//! parsed `scraper::Html` and never touches the network.

use crate::config::{Config, SelectorConfig};
use crate::model::{BoardResult, HeadlineItem, Post};
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Compiled form of the `[selectors]` section
#[derive(Debug, Clone)]
pub struct Selectors {
    headline_item: Selector,
    headline_title: Selector,
    headline_link: Selector,
    board_name: Selector,
    row: Selector,
    sticky_class: String,
    row_title: Selector,
    row_time: Selector,
    row_brief: Selector,
}

impl Selectors {
    pub fn compile(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            headline_item: parse_selector(&config.headline_item)?,
            headline_title: parse_selector(&config.headline_title)?,
            headline_link: parse_selector(&config.headline_link)?,
            board_name: parse_selector(&config.board_name)?,
            row: parse_selector(&config.row)?,
            sticky_class: config.sticky_class.clone(),
            row_title: parse_selector(&config.row_title)?,
            row_time: parse_selector(&config.row_time)?,
            row_brief: parse_selector(&config.row_brief)?,
        })
    }
}

fn parse_selector(raw: &str) -> Result<Selector, ConfigError> {
    Selector::parse(raw)
        .map_err(|e| ConfigError::Validation(format!("Invalid selector '{}': {:?}", raw, e)))
}

/// Post filtering rules applied during extraction
#[derive(Debug, Clone)]
pub struct ExtractRules {
    pub limit: usize,
    pub exclude_keywords: Vec<String>,
    pub freshness_keywords: Vec<String>,
}

impl ExtractRules {
    /// Rules of the live crawl
    pub fn live(config: &Config) -> Self {
        Self {
            limit: config.watch.fetch_limit,
            exclude_keywords: config.watch.exclude_keywords.clone(),
            freshness_keywords: config.watch.freshness_keywords.clone(),
        }
    }

    /// Rules of the snapshot batch job: larger limit and the merged ban list
    pub fn snapshot(config: &Config) -> Self {
        let mut exclude_keywords = config.watch.exclude_keywords.clone();
        for keyword in &config.snapshot.extra_ban_keywords {
            if !exclude_keywords.contains(keyword) {
                exclude_keywords.push(keyword.clone());
            }
        }

        Self {
            limit: config.snapshot.fetch_limit,
            exclude_keywords,
            freshness_keywords: config.watch.freshness_keywords.clone(),
        }
    }

    fn is_excluded(&self, title: &str) -> bool {
        self.exclude_keywords
            .iter()
            .any(|keyword| title.contains(keyword.as_str()))
    }

    fn is_fresh(&self, time: &str) -> bool {
        self.freshness_keywords
            .iter()
            .any(|keyword| time.contains(keyword.as_str()))
    }
}

/// Extracts the posts of one board listing
///
/// Rows are visited in document order. Pinned rows, rows lacking a title or
/// time element, excluded titles and stale times are skipped. Extraction stops
/// once `rules.limit` posts are kept.
///
/// # Arguments
///
/// * `html` - Serialized document of the board listing
/// * `selectors` - Compiled page selectors
/// * `rules` - Limit and keyword filters
/// * `placeholder` - Board name used when the page carries none
pub fn extract_board(
    html: &str,
    selectors: &Selectors,
    rules: &ExtractRules,
    placeholder: &str,
) -> BoardResult {
    let document = Html::parse_document(html);

    let name = document
        .select(&selectors.board_name)
        .next()
        .map(element_text)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| placeholder.to_string());

    let mut posts = Vec::new();

    for row in document.select(&selectors.row) {
        if posts.len() >= rules.limit {
            break;
        }

        if row.value().classes().any(|c| c == selectors.sticky_class) {
            continue;
        }

        let Some(title_el) = row.select(&selectors.row_title).next() else {
            continue;
        };
        let Some(time_el) = row.select(&selectors.row_time).next() else {
            continue;
        };

        let title = element_text(title_el);
        let time = element_text(time_el);

        if rules.is_excluded(&title) || !rules.is_fresh(&time) {
            continue;
        }

        let brief = row
            .select(&selectors.row_brief)
            .next()
            .map(element_text)
            .unwrap_or_default();

        posts.push(Post {
            title,
            url: title_el.value().attr("href").unwrap_or_default().to_string(),
            time,
            brief,
            is_read: false,
        });
    }

    BoardResult::new(name, posts)
}

/// Extracts the headline carousel
///
/// Items missing a title or a link are skipped. Links are resolved against
/// `base_url`.
pub fn extract_headlines(html: &str, selectors: &Selectors, base_url: &Url) -> Vec<HeadlineItem> {
    let document = Html::parse_document(html);

    document
        .select(&selectors.headline_item)
        .filter_map(|item| {
            let title = item
                .select(&selectors.headline_title)
                .next()
                .map(element_text)
                .filter(|t| !t.is_empty())?;
            let href = item
                .select(&selectors.headline_link)
                .next()
                .and_then(|link| link.value().attr("href"))?;

            match base_url.join(href) {
                Ok(url) => Some(HeadlineItem {
                    title,
                    url: url.to_string(),
                }),
                Err(e) => {
                    tracing::debug!("Skipping headline with bad link '{}': {}", href, e);
                    None
                }
            }
        })
        .collect()
}

/// Visible text of an element with runs of whitespace collapsed
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
