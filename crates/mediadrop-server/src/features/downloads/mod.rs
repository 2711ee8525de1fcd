//! Download jobs: submission and status polling

pub mod commands;
pub mod queries;
pub mod routes;

pub use routes::downloads_routes;
