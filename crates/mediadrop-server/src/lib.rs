//! mediadrop server library
//!
//! HTTP service that accepts asynchronous media download jobs.
//!
//! # Overview
//!
//! - **Admission** (`POST /download`): validates the request, checks a storage
//!   destination live against the provider, records a `queued` job and returns
//!   `202` without waiting for the work
//! - **Lifecycle** ([`jobs::JobEngine`]): one tokio task per job moving it
//!   through `queued -> in_progress -> success | failed`, then firing the
//!   completion callback
//! - **Streaming** ([`pipeline`]): retrieval tool stdout piped straight into a
//!   storage upload, never touching disk
//! - **Local downloads**: the retrieval tool writes into the download directory
//! - **Status** (`GET /status/:job_id`): the current job record
//!
//! # Architecture
//!
//! Feature slices under [`features`] split writes (`commands/`) from reads
//! (`queries/`). External collaborators sit behind traits so tests can swap
//! them: [`jobs::JobStore`], [`retrieval::MediaFetcher`] and
//! [`storage::StorageProvider`].
//!
//! Jobs live in memory only and are lost on restart.

pub mod api;
pub mod config;
pub mod error;
pub mod features;
pub mod jobs;
pub mod middleware;
pub mod pipeline;
pub mod retrieval;
pub mod storage;

// Re-export commonly used types
pub use error::AppError;
