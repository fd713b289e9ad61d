//! Snapshot file: a serialized [`CrawlResult`] for offline display

use crate::model::CrawlResult;
use crate::SiftError;
use std::path::Path;

/// Writes a crawl result as pretty-printed JSON, creating parent directories
pub fn write_snapshot(result: &CrawlResult, path: &Path) -> Result<(), SiftError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(path, json)?;

    tracing::info!(
        "Snapshot written to {} ({} boards, {} headlines)",
        path.display(),
        result.boards.len(),
        result.headlines.len()
    );
    Ok(())
}

/// Loads a snapshot from a local path or an http(s) URL
pub async fn load_snapshot(source: &str) -> Result<CrawlResult, SiftError> {
    if is_remote(source) {
        tracing::debug!("Fetching snapshot from {}", source);
        let response = reqwest::get(source).await?.error_for_status()?;
        return Ok(response.json::<CrawlResult>().await?);
    }

    tracing::debug!("Reading snapshot from {}", source);
    let content = std::fs::read_to_string(source)
        .map_err(|e| SiftError::Snapshot(format!("cannot read {}: {}", source, e)))?;
    Ok(serde_json::from_str(&content)?)
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
