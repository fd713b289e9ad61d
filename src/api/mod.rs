//! Request handlers behind the display surface
//!
//! Each handler returns an [`ApiReply`]: an HTTP status plus the JSON envelope
//! `{success, data?, error?}`. Handlers never return `Err`; failures are
//! folded into the envelope.

use crate::crawler::{reconcile, Coordinator};
use crate::model::CrawlResult;
use crate::output::load_snapshot;
use crate::state::StateStatus;
use crate::storage::{self, snapshot_or_empty, SharedStore};
use chrono::Utc;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Error text returned when a mark request carries no URL
pub const URL_REQUIRED: &str = "URL required";

/// Error text returned for unexpected server-side failures
pub const SERVER_ERROR: &str = "Server Error";

/// Response body shared by every handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

impl ApiResponse<()> {
    /// Success without a payload, serialized as `{"success":true}`
    pub fn done() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }
}

/// Status code plus envelope
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply<T> {
    pub status: StatusCode,
    pub body: ApiResponse<T>,
}

impl<T> ApiReply<T> {
    fn new(status: StatusCode, body: ApiResponse<T>) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        self.body.success
    }
}

impl<T: Serialize> ApiReply<T> {
    /// Serialized envelope
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.body)
            .unwrap_or_else(|_| format!(r#"{{"success":false,"error":"{}"}}"#, SERVER_ERROR))
    }
}

/// Body of a mark-state request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarkRequest {
    #[serde(default)]
    pub url: Option<String>,

    /// `"delete"` or `"read"`; anything else counts as read
    #[serde(default)]
    pub action: Option<String>,
}

/// Runs one crawl
///
/// Board-level failures stay inside the result. Only a failure to start the
/// browser produces `success: false`.
pub async fn trigger_crawl(coordinator: &Coordinator) -> ApiReply<CrawlResult> {
    match coordinator.run().await {
        Ok(result) => ApiReply::new(StatusCode::OK, ApiResponse::ok(result)),
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            ApiReply::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiResponse::failure(e.to_string()),
            )
        }
    }
}

/// Records a read or delete marker for a URL
pub fn mark_state(store: &SharedStore, request: &MarkRequest) -> ApiReply<()> {
    let url = match request.url.as_deref() {
        Some(url) if !url.trim().is_empty() => url,
        _ => return ApiReply::new(StatusCode::BAD_REQUEST, ApiResponse::failure(URL_REQUIRED)),
    };

    let status = StateStatus::from_action(request.action.as_deref());

    match storage::put(store, url, status) {
        Ok(()) => {
            tracing::info!("Marked {} as {}", url, status);
            ApiReply::new(StatusCode::OK, ApiResponse::done())
        }
        Err(e) => {
            tracing::error!("Failed to mark {} as {}: {}", url, status, e);
            ApiReply::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiResponse::failure(SERVER_ERROR),
            )
        }
    }
}

/// Mark-state entry point for a raw JSON body
pub fn mark_state_json(store: &SharedStore, body: &str) -> ApiReply<()> {
    match serde_json::from_str::<MarkRequest>(body) {
        Ok(request) => mark_state(store, &request),
        Err(e) => {
            tracing::error!("Unreadable mark request: {}", e);
            ApiReply::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiResponse::failure(SERVER_ERROR),
            )
        }
    }
}

/// Loads an offline snapshot and reconciles it against the store
pub async fn load_offline(store: &SharedStore, source: &str) -> ApiReply<CrawlResult> {
    match load_snapshot(source).await {
        Ok(mut result) => {
            result.boards = reconcile(result.boards, &snapshot_or_empty(store, Utc::now()));
            ApiReply::new(StatusCode::OK, ApiResponse::ok(result))
        }
        Err(e) => {
            tracing::error!("Failed to load offline snapshot from {}: {}", source, e);
            ApiReply::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiResponse::failure(e.to_string()),
            )
        }
    }
}
