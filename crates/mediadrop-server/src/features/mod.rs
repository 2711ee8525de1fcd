//! Feature modules implementing the mediadrop API
//!
//! Each feature is a vertical slice:
//! - `commands/` - write operations
//! - `queries/` - read operations
//! - `routes.rs` - HTTP route definitions

pub mod downloads;

use axum::Router;
use std::sync::Arc;

use crate::jobs::JobEngine;

/// Creates the API router with all feature routes mounted
pub fn router(engine: Arc<JobEngine>) -> Router<()> {
    Router::new().merge(downloads::downloads_routes().with_state(engine))
}
