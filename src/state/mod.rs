//! State module for user-action markers
//!
//! This module defines the per-URL "read" and "deleted" markers and the
//! time window that decides whether a marker still affects a crawl.
//!
//! # Components
//!
//! - `StateStatus`: Kind of marker (read or deleted)
//! - `StateRecord`: One stored marker with its write time
//! - `StateSnapshot`: Active read/deleted URL sets at a point in time
//! - `TtlPolicy`: The shared activity predicate used by every storage backend

mod status;
mod ttl;

// Re-export main types
pub use status::{StateRecord, StateSnapshot, StateStatus};
pub use ttl::TtlPolicy;
