//! Configuration module for Forum-Sift
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! The resulting [`Config`] is immutable for the duration of a run.
//!
//! # Example
//!
//! ```no_run
//! use forum_sift::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("forum-sift.toml")).unwrap();
//! println!("Fetch limit per board: {}", config.watch.fetch_limit);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserMode, BrowserOptions, Config, ObstacleConfig, RateLimitConfig, SelectorConfig,
    SiteConfig, SnapshotConfig, StateBackend, StateConfig, TimeoutConfig, WatchConfig,
};

// Re-export parser functions
pub use parser::{
    apply_board_override, compute_config_hash, load_config, load_config_with_hash, parse_config,
    BOARDS_ENV,
};
