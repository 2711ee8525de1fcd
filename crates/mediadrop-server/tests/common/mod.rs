//! Shared fixtures for integration tests
//!
//! Fakes stand in for the retrieval tool and the storage provider. Behavior is
//! selected by markers in the request: URLs containing `fail-metadata`,
//! `fail-download`, `fail-stream` or `panic`, and destination ids `missing`
//! (fails the live check) or `full` (rejects uploads).

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use futures::TryStreamExt;
use mediadrop_common::Quality;
use mediadrop_server::{
    api::{create_router, AppState},
    jobs::{InMemoryJobStore, JobEngine, Notifier},
    retrieval::{FetchError, MediaFetcher, MediaMetadata},
    storage::{ByteStream, StorageDestination, StorageError, StorageProvider, UploadedObject},
};
use parking_lot::Mutex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tower::ServiceExt;

pub struct FakeFetcher;

fn native_id(url: &str) -> String {
    url.rsplit('/').next().unwrap_or(url).to_string()
}

#[async_trait]
impl MediaFetcher for FakeFetcher {
    async fn fetch_metadata(&self, url: &str) -> Result<MediaMetadata, FetchError> {
        if url.contains("panic") {
            panic!("fetcher exploded");
        }
        if url.contains("fail-metadata") {
            return Err(FetchError::Exited {
                action: "Metadata fetch",
                status: "exit status: 1".to_string(),
                stderr: "ERROR: Unsupported URL".to_string(),
            });
        }
        let id = native_id(url);
        Ok(MediaMetadata {
            title: Some(format!("Clip {id}")),
            id,
        })
    }

    fn stream_command(&self, url: &str, _quality: Quality) -> Command {
        let script = if url.contains("fail-stream") {
            "echo 'ERROR: stream broke' >&2; exit 1".to_string()
        } else {
            format!("printf 'bytes-for-{}'", native_id(url))
        };
        let mut command = Command::new("sh");
        command.arg("-c").arg(script);
        command
    }

    async fn materialize(
        &self,
        url: &str,
        quality: Quality,
        output_dir: &Path,
        file_stem: &str,
    ) -> Result<PathBuf, FetchError> {
        if url.contains("fail-download") {
            return Err(FetchError::Exited {
                action: "Download",
                status: "exit status: 1".to_string(),
                stderr: "ERROR: Requested format is not available".to_string(),
            });
        }
        tokio::fs::create_dir_all(output_dir).await?;
        let dir = tokio::fs::canonicalize(output_dir).await?;
        let path = dir.join(format!("{file_stem}.mp4"));
        tokio::fs::write(&path, format!("{quality} {url}")).await?;
        Ok(path)
    }
}

#[derive(Default)]
pub struct FakeStorage {
    pub uploads: Mutex<Vec<(String, String, Vec<u8>)>>,
    pub published: Mutex<Vec<String>>,
    pub verified: Mutex<Vec<String>>,
}

#[async_trait]
impl StorageProvider for FakeStorage {
    async fn verify_destination(&self, destination: &StorageDestination) -> Result<(), StorageError> {
        self.verified.lock().push(destination.destination_id.clone());
        if destination.destination_id == "missing" {
            return Err(StorageError::Provider("File not found: missing.".to_string()));
        }
        Ok(())
    }

    async fn upload_stream(
        &self,
        destination: &StorageDestination,
        name: &str,
        body: ByteStream,
    ) -> Result<UploadedObject, StorageError> {
        if destination.destination_id == "full" {
            return Err(StorageError::Provider(
                "The user's Drive storage quota has been exceeded.".to_string(),
            ));
        }
        let chunks: Vec<bytes::Bytes> = body
            .try_collect()
            .await
            .map_err(|e| StorageError::Provider(e.to_string()))?;
        let mut uploads = self.uploads.lock();
        let file_id = format!("file-{}", uploads.len() + 1);
        uploads.push((
            destination.destination_id.clone(),
            name.to_string(),
            chunks.concat(),
        ));
        Ok(UploadedObject {
            url: format!("https://drive.google.com/file/d/{file_id}/view"),
            file_id,
        })
    }

    async fn make_public(&self, _: &StorageDestination, file_id: &str) -> Result<(), StorageError> {
        self.published.lock().push(file_id.to_string());
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub engine: Arc<JobEngine>,
    pub storage: Arc<FakeStorage>,
    pub output_dir: tempfile::TempDir,
}

pub fn test_app() -> TestApp {
    let output_dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FakeStorage::default());
    let engine = Arc::new(JobEngine::new(
        Arc::new(InMemoryJobStore::new()),
        Arc::new(FakeFetcher),
        storage.clone(),
        Notifier::new(Duration::from_secs(5)).unwrap(),
        output_dir.path().join("downloads"),
    ));
    let router = create_router(AppState {
        engine: engine.clone(),
    });

    TestApp {
        router,
        engine,
        storage,
        output_dir,
    }
}

pub fn oauth_destination(destination_id: &str) -> Value {
    serde_json::json!({
        "credentials": {
            "type": "oauth",
            "client_id": "client-id",
            "client_secret": "client-secret",
            "refresh_token": "refresh-token",
        },
        "destinationId": destination_id,
    })
}

/// Send a GET request, returning status and raw body
pub async fn get_request(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, String::from_utf8(body.to_vec()).unwrap())
}

/// Send a POST request with a raw body
pub async fn post_raw(app: &Router, uri: &str, body: impl Into<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .method("POST")
                .header("content-type", "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    post_raw(app, uri, body.to_string()).await
}

/// Poll `GET /status/{id}` until the job is terminal
pub async fn wait_for_terminal(app: &Router, job_id: &str) -> Value {
    for _ in 0..400 {
        let (status, body) = get_request(app, &format!("/status/{job_id}")).await;
        assert_eq!(status, StatusCode::OK);
        let record: Value = serde_json::from_str(&body).unwrap();
        if matches!(record["status"].as_str(), Some("success") | Some("failed")) {
            return record;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("job {job_id} never reached a terminal state");
}

pub async fn job_count(app: &Router) -> u64 {
    let (_, body) = get_request(app, "/health").await;
    let health: Value = serde_json::from_str(&body).unwrap();
    health["jobs"].as_u64().unwrap()
}
