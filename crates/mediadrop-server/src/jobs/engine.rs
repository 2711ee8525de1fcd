//! Job lifecycle engine
//!
//! Each admitted job runs as its own tokio task:
//!
//! 1. `queued -> in_progress`
//! 2. fetch metadata and record the title
//! 3. stream to remote storage when a destination was given, otherwise
//!    download to the local output directory
//! 4. commit `success` or `failed`
//! 5. notify the callback URL, if any, with the final record
//!
//! Errors and panics in steps 2-3 become `failed`; a job never stays
//! `in_progress` once its task has finished.

use futures::FutureExt;
use mediadrop_common::sanitize::sanitize_filename;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::model::{DownloadRequest, JobId, JobRecord, JobResult, JobUpdate};
use super::notifier::Notifier;
use super::store::{JobStore, StoreError};
use crate::pipeline;
use crate::retrieval::{local_file_stem, MediaFetcher};
use crate::storage::StorageProvider;

pub struct JobEngine {
    store: Arc<dyn JobStore>,
    fetcher: Arc<dyn MediaFetcher>,
    storage: Arc<dyn StorageProvider>,
    notifier: Notifier,
    output_dir: PathBuf,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl JobEngine {
    pub fn new(
        store: Arc<dyn JobStore>,
        fetcher: Arc<dyn MediaFetcher>,
        storage: Arc<dyn StorageProvider>,
        notifier: Notifier,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            fetcher,
            storage,
            notifier,
            output_dir: output_dir.into(),
        }
    }

    pub fn store(&self) -> &dyn JobStore {
        self.store.as_ref()
    }

    pub fn storage(&self) -> &dyn StorageProvider {
        self.storage.as_ref()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Record a new queued job and start its lifecycle without waiting for it
    pub async fn admit(self: &Arc<Self>, request: DownloadRequest) -> Result<JobRecord, StoreError> {
        let record = JobRecord::new(Uuid::new_v4());
        let job_id = record.job_id();
        self.store.create(record.clone()).await?;

        info!(
            %job_id,
            url = %request.url,
            quality = %request.quality,
            remote = request.destination.is_some(),
            "Job admitted"
        );

        let engine = Arc::clone(self);
        tokio::spawn(async move { engine.run(job_id, request).await });

        Ok(record)
    }

    #[instrument(skip_all, fields(job_id = %job_id))]
    async fn run(&self, job_id: JobId, request: DownloadRequest) {
        let outcome = AssertUnwindSafe(self.execute(job_id, &request))
            .catch_unwind()
            .await;

        let update = match outcome {
            Ok(Ok(result)) => JobUpdate::Succeed(result),
            Ok(Err(message)) => JobUpdate::Fail(message),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(panic = %message, "Job task panicked");
                JobUpdate::Fail(format!("Internal error: {message}"))
            },
        };

        let record = match self.store.update(job_id, update).await {
            Ok(record) => record,
            Err(e) => {
                error!(error = %e, "Could not commit final job state");
                match self.store.get(job_id).await {
                    Some(record) => record,
                    None => return,
                }
            },
        };

        match record.error() {
            Some(message) => warn!(status = %record.status(), error = message, "Job finished"),
            None => info!(status = %record.status(), "Job finished"),
        }

        if let Some(callback_url) = &request.callback_url {
            self.notifier.notify(callback_url, &record).await;
        }
    }

    async fn execute(&self, job_id: JobId, request: &DownloadRequest) -> Result<JobResult, String> {
        self.store
            .update(job_id, JobUpdate::Start)
            .await
            .map_err(|e| e.to_string())?;

        let metadata = self
            .fetcher
            .fetch_metadata(&request.url)
            .await
            .map_err(|e| e.to_string())?;
        let title = metadata.display_title().to_string();
        self.store
            .update(job_id, JobUpdate::Title(title.clone()))
            .await
            .map_err(|e| e.to_string())?;

        match &request.destination {
            Some(destination) => {
                let name = format!("{}.{}", sanitize_filename(&title), request.format.extension());
                let command = self.fetcher.stream_command(&request.url, request.quality);
                let uploaded =
                    pipeline::stream_to_storage(command, self.storage.as_ref(), destination, &name)
                        .await
                        .map_err(|e| e.to_string())?;

                Ok(JobResult::Remote {
                    remote_url: uploaded.url,
                    remote_file_id: uploaded.file_id,
                })
            },
            None => {
                let local_path = self
                    .fetcher
                    .materialize(
                        &request.url,
                        request.quality,
                        &self.output_dir,
                        &local_file_stem(&title, job_id),
                    )
                    .await
                    .map_err(|e| e.to_string())?;

                Ok(JobResult::Local { local_path })
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("index out of bounds");
        assert_eq!(panic_message(payload.as_ref()), "index out of bounds");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");

        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
