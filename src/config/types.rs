use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Forum-Sift
///
/// Loaded once before a run and shared read-only (usually behind an `Arc`).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub watch: WatchConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub browser: BrowserOptions,
    #[serde(rename = "rate-limit", default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub obstacles: ObstacleConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    pub state: StateConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
}

/// Target site addresses and labels
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Page carrying the headline carousel
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Board listing URL, `{board}` is replaced by the board id
    #[serde(rename = "board-url-template")]
    pub board_url_template: String,

    /// Prefix of synthesized board names (`"<label> <boardId>"`)
    #[serde(rename = "board-label", default = "default_board_label")]
    pub board_label: String,

    /// IANA timezone used to stamp `generatedAt`
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl SiteConfig {
    /// Builds the listing URL of one board
    pub fn board_url(&self, board_id: &str) -> String {
        self.board_url_template.replace("{board}", board_id)
    }

    /// Placeholder name used when the page exposes no board title
    pub fn placeholder_name(&self, board_id: &str) -> String {
        format!("{} {}", self.board_label, board_id)
    }
}

/// Watched boards and post filtering rules
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// Board ids, scraped in this order
    pub boards: Vec<String>,

    /// Posts whose title contains any of these are dropped
    #[serde(rename = "exclude-keywords", default)]
    pub exclude_keywords: Vec<String>,

    /// Posts whose time text contains none of these are dropped
    #[serde(rename = "freshness-keywords")]
    pub freshness_keywords: Vec<String>,

    /// Maximum number of posts kept per board
    #[serde(rename = "fetch-limit", default = "default_fetch_limit")]
    pub fetch_limit: usize,
}

/// Per-operation timeouts (milliseconds)
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutConfig {
    #[serde(rename = "page-load-ms", default = "default_page_load_ms")]
    pub page_load_ms: u64,

    #[serde(rename = "selector-wait-ms", default = "default_selector_wait_ms")]
    pub selector_wait_ms: u64,

    #[serde(rename = "board-load-ms", default = "default_board_load_ms")]
    pub board_load_ms: u64,

    #[serde(rename = "consent-ms", default = "default_consent_ms")]
    pub consent_ms: u64,
}

impl TimeoutConfig {
    pub fn page_load(&self) -> Duration {
        Duration::from_millis(self.page_load_ms)
    }

    pub fn selector_wait(&self) -> Duration {
        Duration::from_millis(self.selector_wait_ms)
    }

    pub fn board_load(&self) -> Duration {
        Duration::from_millis(self.board_load_ms)
    }

    pub fn consent(&self) -> Duration {
        Duration::from_millis(self.consent_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            page_load_ms: default_page_load_ms(),
            selector_wait_ms: default_selector_wait_ms(),
            board_load_ms: default_board_load_ms(),
            consent_ms: default_consent_ms(),
        }
    }
}

/// Which browser binary to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserMode {
    /// Visible desktop browser installed on the developer machine
    Local,
    /// Minimal headless binary bundled with the deployment
    Hosted,
}

/// Browser launch and evasion settings
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserOptions {
    #[serde(default = "default_browser_mode")]
    pub mode: BrowserMode,

    /// Explicit binary path; platform default (local) or auto-detection (hosted) otherwise
    #[serde(rename = "executable-path", default)]
    pub executable_path: Option<PathBuf>,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(rename = "viewport-width", default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(rename = "viewport-height", default = "default_viewport_height")]
    pub viewport_height: u32,

    #[serde(rename = "accept-language", default = "default_accept_language")]
    pub accept_language: String,

    /// Skip images, stylesheets, fonts and media
    #[serde(rename = "block-resources", default = "default_true")]
    pub block_resources: bool,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            mode: default_browser_mode(),
            executable_path: None,
            user_agent: default_user_agent(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            accept_language: default_accept_language(),
            block_resources: true,
        }
    }
}

/// Delay inserted between successive board fetches
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(rename = "min-delay-ms", default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    #[serde(rename = "max-delay-ms", default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Consent-gate and bot-challenge heuristics
#[derive(Debug, Clone, Deserialize)]
pub struct ObstacleConfig {
    /// Title substrings that identify a bot-challenge page
    #[serde(rename = "challenge-titles", default = "default_challenge_titles")]
    pub challenge_titles: Vec<String>,

    /// Controls that dismiss a consent gate, tried in order
    #[serde(rename = "consent-selectors", default = "default_consent_selectors")]
    pub consent_selectors: Vec<String>,

    #[serde(rename = "challenge-retries", default = "default_challenge_retries")]
    pub challenge_retries: u32,

    #[serde(rename = "challenge-backoff-ms", default = "default_challenge_backoff_ms")]
    pub challenge_backoff_ms: u64,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            challenge_titles: default_challenge_titles(),
            consent_selectors: default_consent_selectors(),
            challenge_retries: default_challenge_retries(),
            challenge_backoff_ms: default_challenge_backoff_ms(),
        }
    }
}

/// CSS selectors for the headline page and board listings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SelectorConfig {
    pub headline_wrapper: String,
    pub headline_item: String,
    pub headline_title: String,
    pub headline_link: String,
    pub board_name: String,
    pub row: String,
    /// Class (without the dot) marking pinned rows
    pub sticky_class: String,
    pub row_title: String,
    pub row_time: String,
    pub row_brief: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            headline_wrapper: ".headline-news__wrapper".to_string(),
            headline_item: ".headline-news__wrapper .swiper-slide".to_string(),
            headline_title: ".headline-news__title".to_string(),
            headline_link: "a.headline-news__content".to_string(),
            board_name: r#"a[data-gtm="選單-看板名稱"]"#.to_string(),
            row: "tr.b-list__row".to_string(),
            sticky_class: "b-list__row--sticky".to_string(),
            row_title: ".b-list__main__title".to_string(),
            row_time: ".b-list__time__edittime a".to_string(),
            row_brief: ".b-list__brief".to_string(),
        }
    }
}

/// State store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateBackend {
    File,
    Sqlite,
}

/// Read/delete marker persistence
#[derive(Debug, Clone, Deserialize)]
pub struct StateConfig {
    pub backend: StateBackend,

    /// Directory holding the file backend's history files
    #[serde(default = "default_state_directory")]
    pub directory: PathBuf,

    /// SQLite database file for the relational backend
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: PathBuf,

    #[serde(rename = "read-ttl-days", default = "default_read_ttl_days")]
    pub read_ttl_days: u32,

    #[serde(rename = "delete-ttl-days", default = "default_delete_ttl_days")]
    pub delete_ttl_days: u32,
}

/// Offline snapshot batch job
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    #[serde(rename = "output-path", default = "default_snapshot_path")]
    pub output_path: PathBuf,

    #[serde(rename = "fetch-limit", default = "default_snapshot_fetch_limit")]
    pub fetch_limit: usize,

    /// Merged with `watch.exclude-keywords` for the batch job
    #[serde(rename = "extra-ban-keywords", default)]
    pub extra_ban_keywords: Vec<String>,

    #[serde(rename = "delay-ms", default = "default_snapshot_delay_ms")]
    pub delay_ms: u64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            output_path: default_snapshot_path(),
            fetch_limit: default_snapshot_fetch_limit(),
            extra_ban_keywords: Vec::new(),
            delay_ms: default_snapshot_delay_ms(),
        }
    }
}

fn default_board_label() -> String {
    "Board".to_string()
}

fn default_timezone() -> String {
    "Asia/Taipei".to_string()
}

fn default_fetch_limit() -> usize {
    20
}

fn default_page_load_ms() -> u64 {
    30_000
}

fn default_selector_wait_ms() -> u64 {
    5_000
}

fn default_board_load_ms() -> u64 {
    30_000
}

fn default_consent_ms() -> u64 {
    10_000
}

fn default_browser_mode() -> BrowserMode {
    BrowserMode::Hosted
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36".to_string()
}

fn default_viewport_width() -> u32 {
    1366
}

fn default_viewport_height() -> u32 {
    768
}

fn default_accept_language() -> String {
    "zh-TW,zh;q=0.9,en-US;q=0.8,en;q=0.7".to_string()
}

fn default_true() -> bool {
    true
}

fn default_min_delay_ms() -> u64 {
    3_000
}

fn default_max_delay_ms() -> u64 {
    6_000
}

fn default_challenge_titles() -> Vec<String> {
    vec![
        "Just a moment".to_string(),
        "Attention Required".to_string(),
        "請稍候".to_string(),
    ]
}

fn default_consent_selectors() -> Vec<String> {
    vec!["button.btn-yes".to_string(), "a.agree-btn".to_string()]
}

fn default_challenge_retries() -> u32 {
    1
}

fn default_challenge_backoff_ms() -> u64 {
    5_000
}

fn default_state_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("forum-sift.db")
}

fn default_read_ttl_days() -> u32 {
    7
}

fn default_delete_ttl_days() -> u32 {
    30
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("public/daily-news.json")
}

fn default_snapshot_fetch_limit() -> usize {
    30
}

fn default_snapshot_delay_ms() -> u64 {
    2_000
}
