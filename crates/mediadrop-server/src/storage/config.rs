use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

use super::StorageError;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com";

/// Endpoints of the Drive storage provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    /// OAuth token endpoint, also the JWT audience for service accounts
    pub token_uri: String,
    /// Base for metadata and permission calls (`/drive/v3/...`)
    pub api_base: String,
    /// Base for media uploads (`/upload/drive/v3/...`)
    pub upload_base: String,
}

impl DriveConfig {
    pub fn from_env() -> Self {
        Self {
            token_uri: env::var("DRIVE_TOKEN_URI").unwrap_or_else(|_| DEFAULT_TOKEN_URI.to_string()),
            api_base: env::var("DRIVE_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            upload_base: env::var("DRIVE_UPLOAD_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
        }
    }

    /// Point every endpoint at one server, e.g. a mock in tests
    pub fn for_base_url(base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self {
            token_uri: format!("{base}/token"),
            api_base: base.clone(),
            upload_base: base,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("DRIVE_TOKEN_URI", &self.token_uri),
            ("DRIVE_API_BASE", &self.api_base),
            ("DRIVE_UPLOAD_BASE", &self.upload_base),
        ] {
            url::Url::parse(value)
                .map_err(|e| anyhow::anyhow!("{name} is not a valid URL ({value}): {e}"))?;
        }
        Ok(())
    }

    pub(crate) fn files_url(&self) -> String {
        format!("{}/drive/v3/files", self.api_base.trim_end_matches('/'))
    }

    /// `files/<file_id>/<rest>` with the id kept as one percent-encoded segment
    pub(crate) fn file_url(&self, file_id: &str, rest: &[&str]) -> Result<Url, StorageError> {
        // `.` and `..` would be dropped from the path, retargeting the request
        if matches!(file_id, "" | "." | "..") {
            return Err(StorageError::Provider(format!("Invalid file id: {file_id:?}")));
        }

        let mut url = Url::parse(&self.files_url())
            .map_err(|e| StorageError::Provider(format!("Invalid Drive API base: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| StorageError::Provider(format!("Invalid Drive API base: {}", self.api_base)))?
            .push(file_id)
            .extend(rest);
        Ok(url)
    }

    pub(crate) fn upload_url(&self) -> String {
        format!("{}/upload/drive/v3/files", self.upload_base.trim_end_matches('/'))
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            token_uri: DEFAULT_TOKEN_URI.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            upload_base: DEFAULT_API_BASE.to_string(),
        }
    }
}
