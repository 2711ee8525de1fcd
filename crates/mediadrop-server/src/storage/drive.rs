//! Google Drive implementation of [`StorageProvider`]

use async_trait::async_trait;
use bytes::Bytes;
use futures::{future, stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument};

use super::{
    auth, config::DriveConfig, ByteStream, StorageDestination, StorageError, StorageProvider,
    UploadedObject,
};

const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const MEDIA_MIME_TYPE: &str = "video/mp4";

#[derive(Clone)]
pub struct DriveStorage {
    client: reqwest::Client,
    config: DriveConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    mime_type: Option<String>,
    web_view_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DriveErrorBody {
    error: DriveErrorDetail,
}

#[derive(Debug, Deserialize)]
struct DriveErrorDetail {
    message: String,
}

/// Pull the provider's own message out of an error response
async fn provider_error(response: reqwest::Response) -> StorageError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<DriveErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                format!("storage provider returned {status}")
            } else {
                body
            }
        });
    StorageError::Provider(message)
}

/// Fallback link for a file whose response carried no `webViewLink`
pub fn view_url(file_id: &str) -> String {
    format!("https://drive.google.com/file/d/{file_id}/view")
}

/// Wrap `media` in a `multipart/related` body: JSON metadata part, then the bytes
fn multipart_related(boundary: &str, metadata: &serde_json::Value, media: ByteStream) -> ByteStream {
    let head = format!(
        "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n\
         --{boundary}\r\nContent-Type: {MEDIA_MIME_TYPE}\r\n\r\n"
    );
    let tail = format!("\r\n--{boundary}--\r\n");

    Box::pin(
        stream::once(future::ready(Ok(Bytes::from(head))))
            .chain(media)
            .chain(stream::once(future::ready(Ok(Bytes::from(tail))))),
    )
}

impl DriveStorage {
    pub fn new(config: DriveConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: DriveConfig) -> Self {
        Self { client, config }
    }

    async fn token(&self, destination: &StorageDestination) -> Result<String, StorageError> {
        auth::access_token(&self.client, &self.config.token_uri, &destination.credentials).await
    }
}

#[async_trait]
impl StorageProvider for DriveStorage {
    #[instrument(skip(self, destination), fields(destination_id = %destination.destination_id))]
    async fn verify_destination(&self, destination: &StorageDestination) -> Result<(), StorageError> {
        let token = self.token(destination).await?;

        let response = self
            .client
            .get(self.config.file_url(&destination.destination_id, &[])?)
            .query(&[("fields", "id,name,mimeType"), ("supportsAllDrives", "true")])
            .bearer_auth(&token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        let file: DriveFile = response.json().await?;
        if file.mime_type.as_deref() != Some(FOLDER_MIME_TYPE) {
            return Err(StorageError::Provider(format!(
                "Destination {} is not a folder",
                file.id
            )));
        }

        debug!("Destination folder is reachable");
        Ok(())
    }

    #[instrument(skip(self, destination, body), fields(destination_id = %destination.destination_id))]
    async fn upload_stream(
        &self,
        destination: &StorageDestination,
        name: &str,
        body: ByteStream,
    ) -> Result<UploadedObject, StorageError> {
        let token = self.token(destination).await?;

        let boundary = format!("mediadrop-{}", uuid::Uuid::new_v4().simple());
        let metadata = json!({
            "name": name,
            "parents": [destination.destination_id],
            "mimeType": MEDIA_MIME_TYPE,
        });

        debug!(name, "Starting streamed upload");

        let response = self
            .client
            .post(self.config.upload_url())
            .query(&[
                ("uploadType", "multipart"),
                ("fields", "id,webViewLink"),
                ("supportsAllDrives", "true"),
            ])
            .bearer_auth(&token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(reqwest::Body::wrap_stream(multipart_related(
                &boundary, &metadata, body,
            )))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        let file: DriveFile = response.json().await?;
        let url = file.web_view_link.unwrap_or_else(|| view_url(&file.id));

        info!(file_id = %file.id, "Upload finished");

        Ok(UploadedObject {
            file_id: file.id,
            url,
        })
    }

    #[instrument(skip(self, destination))]
    async fn make_public(
        &self,
        destination: &StorageDestination,
        file_id: &str,
    ) -> Result<(), StorageError> {
        let token = self.token(destination).await?;

        let response = self
            .client
            .post(self.config.file_url(file_id, &["permissions"])?)
            .query(&[("supportsAllDrives", "true")])
            .bearer_auth(&token)
            .json(&json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn test_multipart_related_frames_media() {
        let media: ByteStream = Box::pin(stream::iter(vec![
            Ok(Bytes::from_static(b"abc")),
            Ok(Bytes::from_static(b"def")),
        ]));
        let metadata = json!({ "name": "clip.mp4" });

        let chunks: Vec<Bytes> = multipart_related("XYZ", &metadata, media)
            .try_collect()
            .await
            .unwrap();
        let body = String::from_utf8(chunks.concat()).unwrap();

        assert!(body.starts_with("--XYZ\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n"));
        assert!(body.contains(r#"{"name":"clip.mp4"}"#));
        assert!(body.contains("--XYZ\r\nContent-Type: video/mp4\r\n\r\nabcdef\r\n--XYZ--\r\n"));
    }

    #[test]
    fn test_view_url() {
        assert_eq!(view_url("1AbC"), "https://drive.google.com/file/d/1AbC/view");
    }
}
