//! Output module for crawl results
//!
//! This module handles:
//! - Writing and loading the offline snapshot file
//! - Summarizing a crawl result for the terminal

mod snapshot;
mod summary;

pub use snapshot::{load_snapshot, write_snapshot};
pub use summary::{print_statistics, summarize, CrawlStatistics};
