//! Remote storage provider
//!
//! The provider is reached through [`StorageProvider`] so the lifecycle engine
//! and the streaming pipeline never see HTTP details. [`drive::DriveStorage`]
//! is the production implementation.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

pub mod auth;
pub mod config;
pub mod credentials;
pub mod drive;

pub use credentials::{CredentialsError, RawCredentials, StorageCredentials};
pub use drive::DriveStorage;

/// Byte stream consumed incrementally by an upload
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send + 'static>>;

/// Where uploaded bytes go: credentials plus the destination folder id
#[derive(Debug, Clone)]
pub struct StorageDestination {
    pub credentials: StorageCredentials,
    pub destination_id: String,
}

/// A stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    pub file_id: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum StorageError {
    /// Token exchange rejected; carries the provider's description
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Provider answered with an error; carries its message verbatim
    #[error("{0}")]
    Provider(String),

    #[error("Invalid service account private key: {0}")]
    Key(#[from] jsonwebtoken::errors::Error),

    #[error("Storage request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// One live round trip proving the credentials work and the destination is reachable
    async fn verify_destination(&self, destination: &StorageDestination) -> Result<(), StorageError>;

    /// Store `body` under `name` in the destination, reading it as it arrives
    async fn upload_stream(
        &self,
        destination: &StorageDestination,
        name: &str,
        body: ByteStream,
    ) -> Result<UploadedObject, StorageError>;

    /// Let anyone holding the link read the object
    async fn make_public(
        &self,
        destination: &StorageDestination,
        file_id: &str,
    ) -> Result<(), StorageError>;
}
