//! mediadrop common library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the mediadrop workspace.
//!
//! # Overview
//!
//! - **Types**: request-level enums shared by the server and its tests
//!   ([`Quality`], [`OutputFormat`])
//! - **Sanitizing**: turning media titles into filesystem-safe names
//! - **Logging**: centralized `tracing` setup
//! - **Error Handling**: the common error type
//!
//! # Example
//!
//! ```
//! use mediadrop_common::{sanitize::sanitize_filename, Quality};
//!
//! let quality: Quality = "720p".parse().unwrap();
//! assert_eq!(quality.max_height(), Some(720));
//! assert_eq!(sanitize_filename("a/b: c"), "a_b_ c");
//! ```

pub mod error;
pub mod logging;
pub mod sanitize;
pub mod types;

// Re-export commonly used types
pub use error::{CommonError, Result};
pub use types::{OutputFormat, Quality};
