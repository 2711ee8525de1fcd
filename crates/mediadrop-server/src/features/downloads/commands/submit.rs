//! Submit download command
//!
//! Validates a download request, checks a storage destination live against the
//! provider, then admits the job. The job itself runs in the background; the
//! handler returns as soon as the record exists.
//!
//! Validation stops at the first violation, in this order:
//!
//! 1. `url` present and non-blank
//! 2. `quality`, when given, is a known quality
//! 3. `format`, when given, is `mp4`
//! 4. `callbackUrl`, when given, is an absolute http(s) URL
//! 5. `storageDestination`, when given, has well-formed credentials and a
//!    `destinationId`
//! 6. the destination passes the live provider check

use mediadrop_common::{CommonError, OutputFormat, Quality};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

use crate::error::AppError;
use crate::jobs::{DownloadRequest, JobEngine, JobId, JobStatus, StoreError};
use crate::storage::{CredentialsError, RawCredentials, StorageDestination, StorageError};

/// Request body of `POST /download`
///
/// Every field is optional at the wire level so missing values are reported
/// in validation order instead of as a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitDownloadCommand {
    pub url: Option<String>,
    pub quality: Option<String>,
    pub format: Option<String>,
    pub callback_url: Option<String>,
    pub storage_destination: Option<StorageDestinationInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageDestinationInput {
    pub credentials: Option<RawCredentials>,
    #[serde(alias = "folderId")]
    pub destination_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitDownloadResponse {
    pub job_id: JobId,
    pub status: JobStatus,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitDownloadError {
    #[error("url is required")]
    UrlRequired,

    #[error(transparent)]
    Quality(CommonError),

    #[error(transparent)]
    Format(CommonError),

    #[error("callbackUrl must be an absolute http or https URL: {0}")]
    CallbackUrl(String),

    #[error("storageDestination.credentials is required")]
    CredentialsRequired,

    #[error("storageDestination.{0}")]
    Credentials(#[from] CredentialsError),

    #[error("storageDestination.destinationId is required")]
    DestinationIdRequired,

    #[error("Storage destination check failed: {0}")]
    DestinationUnreachable(#[from] StorageError),

    #[error("Could not record job: {0}")]
    Store(#[from] StoreError),
}

impl From<SubmitDownloadError> for AppError {
    fn from(err: SubmitDownloadError) -> Self {
        match err {
            SubmitDownloadError::DestinationUnreachable(_) => AppError::Destination(err.to_string()),
            SubmitDownloadError::Store(_) => AppError::Internal(err.to_string()),
            _ => AppError::Validation(err.to_string()),
        }
    }
}

fn parse_callback_url(raw: &str) -> Result<Url, SubmitDownloadError> {
    let url = Url::parse(raw.trim()).map_err(|e| SubmitDownloadError::CallbackUrl(e.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(SubmitDownloadError::CallbackUrl(raw.to_string())),
    }
}

impl SubmitDownloadCommand {
    /// Structural checks; no I/O
    #[tracing::instrument(skip_all)]
    pub fn validate(self) -> Result<DownloadRequest, SubmitDownloadError> {
        let url = self
            .url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or(SubmitDownloadError::UrlRequired)?;

        let quality = match self.quality {
            Some(q) => q.parse::<Quality>().map_err(SubmitDownloadError::Quality)?,
            None => Quality::default(),
        };

        let format = match self.format {
            Some(f) => f.parse::<OutputFormat>().map_err(SubmitDownloadError::Format)?,
            None => OutputFormat::default(),
        };

        let callback_url = self
            .callback_url
            .as_deref()
            .map(parse_callback_url)
            .transpose()?;

        let destination = match self.storage_destination {
            Some(input) => {
                let credentials = input
                    .credentials
                    .ok_or(SubmitDownloadError::CredentialsRequired)?
                    .validate()?;
                let destination_id = input
                    .destination_id
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty())
                    .ok_or(SubmitDownloadError::DestinationIdRequired)?;
                Some(StorageDestination {
                    credentials,
                    destination_id,
                })
            },
            None => None,
        };

        tracing::debug!("Command validation passed");
        Ok(DownloadRequest {
            url,
            quality,
            format,
            destination,
            callback_url,
        })
    }
}

/// Validate, verify the destination, and admit the job
#[tracing::instrument(skip_all)]
pub async fn handle(
    engine: Arc<JobEngine>,
    command: SubmitDownloadCommand,
) -> Result<SubmitDownloadResponse, SubmitDownloadError> {
    let request = command.validate()?;

    if let Some(destination) = &request.destination {
        engine.storage().verify_destination(destination).await?;
    }

    let record = engine.admit(request).await?;

    Ok(SubmitDownloadResponse {
        job_id: record.job_id(),
        status: record.status(),
    })
}
