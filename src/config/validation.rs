use crate::config::types::{
    Config, ObstacleConfig, RateLimitConfig, SelectorConfig, SiteConfig, SnapshotConfig,
    StateBackend, StateConfig, TimeoutConfig, WatchConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_watch_config(&config.watch)?;
    validate_timeouts(&config.timeouts)?;
    validate_rate_limit(&config.rate_limit)?;
    validate_obstacles(&config.obstacles)?;
    validate_selectors(&config.selectors)?;
    validate_state_config(&config.state)?;
    validate_snapshot_config(&config.snapshot)?;
    Ok(())
}

/// Validates target site addresses
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_http_url("base-url", &config.base_url)?;

    if !config.board_url_template.contains("{board}") {
        return Err(ConfigError::Validation(format!(
            "board-url-template must contain '{{board}}', got '{}'",
            config.board_url_template
        )));
    }
    validate_http_url("board-url-template", &config.board_url("0"))?;

    if config.board_label.trim().is_empty() {
        return Err(ConfigError::Validation(
            "board-label cannot be empty".to_string(),
        ));
    }

    config.timezone.parse::<chrono_tz::Tz>().map_err(|_| {
        ConfigError::Validation(format!("Unknown timezone '{}'", config.timezone))
    })?;

    Ok(())
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}

/// Validates the watched boards and filtering rules
fn validate_watch_config(config: &WatchConfig) -> Result<(), ConfigError> {
    if config.boards.is_empty() {
        return Err(ConfigError::Validation(
            "watch.boards must list at least one board".to_string(),
        ));
    }

    if let Some(board) = config.boards.iter().find(|b| b.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "watch.boards contains a blank id: '{}'",
            board
        )));
    }

    // An empty freshness list would reject every post
    if config.freshness_keywords.is_empty() {
        return Err(ConfigError::Validation(
            "freshness-keywords cannot be empty".to_string(),
        ));
    }

    if config
        .exclude_keywords
        .iter()
        .chain(config.freshness_keywords.iter())
        .any(|k| k.is_empty())
    {
        return Err(ConfigError::Validation(
            "keywords cannot be empty strings".to_string(),
        ));
    }

    if config.fetch_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "fetch-limit must be >= 1, got {}",
            config.fetch_limit
        )));
    }

    Ok(())
}

/// Validates per-operation timeouts
fn validate_timeouts(config: &TimeoutConfig) -> Result<(), ConfigError> {
    let fields = [
        ("page-load-ms", config.page_load_ms),
        ("selector-wait-ms", config.selector_wait_ms),
        ("board-load-ms", config.board_load_ms),
        ("consent-ms", config.consent_ms),
    ];

    for (name, value) in fields {
        if value == 0 {
            return Err(ConfigError::Validation(format!("{} must be > 0", name)));
        }
    }

    Ok(())
}

fn validate_rate_limit(config: &RateLimitConfig) -> Result<(), ConfigError> {
    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min-delay-ms ({}) cannot exceed max-delay-ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    Ok(())
}

fn validate_obstacles(config: &ObstacleConfig) -> Result<(), ConfigError> {
    if config.challenge_titles.iter().any(|t| t.is_empty()) {
        return Err(ConfigError::Validation(
            "challenge-titles cannot contain empty strings".to_string(),
        ));
    }

    for selector in &config.consent_selectors {
        validate_selector("consent-selectors", selector)?;
    }

    Ok(())
}

/// Validates that every configured selector parses
fn validate_selectors(config: &SelectorConfig) -> Result<(), ConfigError> {
    let selectors = [
        ("headline-wrapper", &config.headline_wrapper),
        ("headline-item", &config.headline_item),
        ("headline-title", &config.headline_title),
        ("headline-link", &config.headline_link),
        ("board-name", &config.board_name),
        ("row", &config.row),
        ("row-title", &config.row_title),
        ("row-time", &config.row_time),
        ("row-brief", &config.row_brief),
    ];

    for (name, selector) in selectors {
        validate_selector(name, selector)?;
    }

    if config.sticky_class.is_empty() || config.sticky_class.contains(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "sticky-class must be a single class name, got '{}'",
            config.sticky_class
        )));
    }

    Ok(())
}

fn validate_selector(field: &str, selector: &str) -> Result<(), ConfigError> {
    scraper::Selector::parse(selector).map_err(|e| {
        ConfigError::Validation(format!("Invalid {} selector '{}': {:?}", field, selector, e))
    })?;
    Ok(())
}

/// Validates state store settings for the selected backend
fn validate_state_config(config: &StateConfig) -> Result<(), ConfigError> {
    match config.backend {
        StateBackend::File => {
            if config.directory.as_os_str().is_empty() {
                return Err(ConfigError::Validation(
                    "state.directory cannot be empty".to_string(),
                ));
            }
        }
        StateBackend::Sqlite => {
            if config.database_path.as_os_str().is_empty() {
                return Err(ConfigError::Validation(
                    "state.database-path cannot be empty".to_string(),
                ));
            }
        }
    }

    if config.read_ttl_days < 1 || config.delete_ttl_days < 1 {
        return Err(ConfigError::Validation(format!(
            "TTLs must be >= 1 day, got read={} delete={}",
            config.read_ttl_days, config.delete_ttl_days
        )));
    }

    Ok(())
}

fn validate_snapshot_config(config: &SnapshotConfig) -> Result<(), ConfigError> {
    if config.fetch_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "snapshot.fetch-limit must be >= 1, got {}",
            config.fetch_limit
        )));
    }

    if config.output_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "snapshot.output-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
