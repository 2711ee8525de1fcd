//! Download API routes
//!
//! - `POST /download` - Submit a download job
//! - `GET /status/:job_id` - Current state of a job

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use super::{
    commands::{self, SubmitDownloadCommand},
    queries::{self, GetJobStatusQuery},
};
use crate::error::AppError;
use crate::jobs::JobEngine;

pub fn downloads_routes() -> Router<Arc<JobEngine>> {
    Router::new()
        .route("/download", post(submit_download))
        .route("/status/:job_id", get(get_job_status))
}

/// Submit a download job
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
///   "quality": "720p",
///   "format": "mp4",
///   "callbackUrl": "https://hooks.example.com/mediadrop",
///   "storageDestination": {
///     "credentials": { "type": "oauth", "client_id": "...", "client_secret": "...", "refresh_token": "..." },
///     "destinationId": "1AbCdEfGh"
///   }
/// }
/// ```
///
/// # Response
///
/// - `202 Accepted` - `{ "jobId": "...", "status": "queued" }`
/// - `400 Bad Request` - Malformed body or validation error
/// - `422 Unprocessable Entity` - Storage destination failed the live check
async fn submit_download(
    State(engine): State<Arc<JobEngine>>,
    payload: Result<Json<SubmitDownloadCommand>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(command) = payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;

    let response = commands::submit::handle(engine, command).await?;

    tracing::info!(job_id = %response.job_id, "Download job accepted via API");

    Ok((StatusCode::ACCEPTED, Json(response)).into_response())
}

/// Current state of a job
///
/// # Response
///
/// - `200 OK` - The job record
/// - `404 Not Found` - No job with that id
async fn get_job_status(
    State(engine): State<Arc<JobEngine>>,
    Path(job_id): Path<String>,
) -> Result<Response, AppError> {
    let record = queries::get_status::handle(engine.store(), GetJobStatusQuery { job_id }).await?;

    Ok(Json(record).into_response())
}
