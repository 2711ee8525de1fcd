//! Completion webhooks

use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::model::JobRecord;

/// Posts final job records to caller-supplied callback URLs
#[derive(Debug, Clone)]
pub struct Notifier {
    client: reqwest::Client,
}

impl Notifier {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// One attempt; every failure is logged and swallowed
    pub async fn notify(&self, callback_url: &Url, record: &JobRecord) {
        let job_id = record.job_id();

        match self.client.post(callback_url.clone()).json(record).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(%job_id, status = %response.status(), "Callback delivered");
            },
            Ok(response) => {
                warn!(%job_id, status = %response.status(), "Callback endpoint rejected notification");
            },
            Err(e) => {
                warn!(%job_id, error = %e, "Callback delivery failed");
            },
        }
    }
}
