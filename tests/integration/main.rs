//! Integration tests for Forum-Sift
//!
//! Browser access is replaced by an in-memory fake; wiremock serves offline
//! snapshots over HTTP.

mod api_tests;
mod crawl_tests;
mod snapshot_tests;
