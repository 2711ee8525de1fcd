use crate::config::Config;
use crate::features;
use crate::jobs::{InMemoryJobStore, JobEngine, Notifier};
use crate::middleware::tracing_layer;
use crate::retrieval::YtDlp;
use crate::storage::DriveStorage;
use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<JobEngine>,
}

impl AppState {
    /// Production wiring: in-memory store, yt-dlp, Google Drive
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let notifier = Notifier::new(Duration::from_secs(config.callback.timeout_secs))?;
        let engine = JobEngine::new(
            Arc::new(InMemoryJobStore::new()),
            Arc::new(YtDlp::new(&config.downloader.binary_path)),
            Arc::new(DriveStorage::new(config.drive.clone())),
            notifier,
            &config.downloader.output_dir,
        );

        Ok(Self {
            engine: Arc::new(engine),
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(state.clone())
        .merge(features::router(state.engine))
        .layer(tracing_layer())
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "mediadrop",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "jobs": state.engine.store().count().await,
    }))
}
