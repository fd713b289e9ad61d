use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable that replaces `[watch].boards` (comma-separated ids)
pub const BOARDS_ENV: &str = "FORUM_SIFT_BOARDS";

/// Loads and parses a configuration file from the given path
///
/// The watched-board list may be overridden through [`BOARDS_ENV`]; the
/// override is applied once here and never consulted again.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use forum_sift::config::load_config;
///
/// let config = load_config(Path::new("forum-sift.toml")).unwrap();
/// println!("Watching {} boards", config.watch.boards.len());
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let mut config: Config = toml::from_str(&content)?;

    if let Ok(value) = std::env::var(BOARDS_ENV) {
        apply_board_override(&mut config, &value);
    }

    validate(&config)?;

    Ok(config)
}

/// Parses and validates configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Replaces the watched-board list with a comma-separated override
///
/// Blank entries are ignored; an override with no ids leaves the list as is.
pub fn apply_board_override(config: &mut Config, value: &str) {
    let boards: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if !boards.is_empty() {
        tracing::info!("Board list overridden from {}: {:?}", BOARDS_ENV, boards);
        config.watch.boards = boards;
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a crawl can be matched to the configuration it ran with.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
