//! Job records and their state machine

use chrono::{DateTime, Utc};
use mediadrop_common::{OutputFormat, Quality};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::storage::StorageDestination;

pub type JobId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    InProgress,
    Success,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::InProgress => "in_progress",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a finished job's media ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum JobResult {
    Local {
        local_path: PathBuf,
    },
    Remote {
        remote_url: String,
        remote_file_id: String,
    },
}

/// A validated download request; lives only until its job is admitted
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub quality: Quality,
    pub format: OutputFormat,
    pub destination: Option<StorageDestination>,
    pub callback_url: Option<Url>,
}

/// A state change requested by the job's lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobUpdate {
    Start,
    Title(String),
    Succeed(JobResult),
    Fail(String),
}

impl JobUpdate {
    fn name(&self) -> &'static str {
        match self {
            JobUpdate::Start => "start",
            JobUpdate::Title(_) => "title",
            JobUpdate::Succeed(_) => "succeed",
            JobUpdate::Fail(_) => "fail",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("job is already {0}")]
    Terminal(JobStatus),

    #[error("cannot {update} a job that is {from}")]
    OutOfOrder { from: JobStatus, update: &'static str },
}

/// One tracked job
///
/// Fields are private; the only way to change a record is [`JobRecord::apply`],
/// which enforces `queued -> in_progress -> success | failed`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    job_id: JobId,
    status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(flatten)]
    result: Option<JobResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            status: JobStatus::Queued,
            title: None,
            result: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn result(&self) -> Option<&JobResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn apply(&mut self, update: JobUpdate) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::Terminal(self.status));
        }

        let out_of_order = TransitionError::OutOfOrder {
            from: self.status,
            update: update.name(),
        };

        match update {
            JobUpdate::Start => {
                if self.status != JobStatus::Queued {
                    return Err(out_of_order);
                }
                self.status = JobStatus::InProgress;
            },
            JobUpdate::Title(title) => {
                if self.status != JobStatus::InProgress {
                    return Err(out_of_order);
                }
                self.title = Some(title);
            },
            JobUpdate::Succeed(result) => {
                if self.status != JobStatus::InProgress {
                    return Err(out_of_order);
                }
                self.status = JobStatus::Success;
                self.result = Some(result);
                self.completed_at = Some(Utc::now());
            },
            JobUpdate::Fail(error) => {
                self.status = JobStatus::Failed;
                self.error = Some(error);
                self.completed_at = Some(Utc::now());
            },
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn started() -> JobRecord {
        let mut record = JobRecord::new(Uuid::new_v4());
        record.apply(JobUpdate::Start).unwrap();
        record
    }

    #[test]
    fn test_new_record_is_queued() {
        let id = Uuid::new_v4();
        let record = JobRecord::new(id);

        assert_eq!(record.job_id(), id);
        assert_eq!(record.status(), JobStatus::Queued);
        assert!(record.completed_at().is_none());
        assert!(record.result().is_none());
    }

    #[test]
    fn test_success_sets_completion() {
        let mut record = started();
        record.apply(JobUpdate::Title("Clip".into())).unwrap();
        record
            .apply(JobUpdate::Succeed(JobResult::Local {
                local_path: PathBuf::from("/data/Clip.mp4"),
            }))
            .unwrap();

        assert_eq!(record.status(), JobStatus::Success);
        assert!(record.completed_at().is_some());
        assert!(record.completed_at().unwrap() >= record.created_at());
        assert!(record.error().is_none());
    }

    #[test]
    fn test_fail_from_queued_is_allowed() {
        let mut record = JobRecord::new(Uuid::new_v4());
        record.apply(JobUpdate::Fail("boom".into())).unwrap();

        assert_eq!(record.status(), JobStatus::Failed);
        assert_eq!(record.error(), Some("boom"));
        assert!(record.result().is_none());
    }

    #[test]
    fn test_terminal_is_final() {
        let mut record = started();
        record.apply(JobUpdate::Fail("boom".into())).unwrap();
        let frozen = record.clone();

        assert_eq!(
            record.apply(JobUpdate::Start).unwrap_err(),
            TransitionError::Terminal(JobStatus::Failed)
        );
        assert!(record
            .apply(JobUpdate::Succeed(JobResult::Local {
                local_path: PathBuf::from("/x.mp4")
            }))
            .is_err());
        assert!(record.apply(JobUpdate::Fail("again".into())).is_err());
        assert_eq!(record, frozen);
    }

    #[test]
    fn test_out_of_order_updates_are_rejected() {
        let mut record = JobRecord::new(Uuid::new_v4());
        let err = record
            .apply(JobUpdate::Succeed(JobResult::Remote {
                remote_url: "u".into(),
                remote_file_id: "f".into(),
            }))
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot succeed a job that is queued");

        let mut record = started();
        assert!(record.apply(JobUpdate::Start).is_err());
        assert_eq!(record.status(), JobStatus::InProgress);
    }

    #[test]
    fn test_serialized_shape() {
        let mut record = started();
        record.apply(JobUpdate::Title("Clip".into())).unwrap();
        record
            .apply(JobUpdate::Succeed(JobResult::Remote {
                remote_url: "https://drive.google.com/file/d/f1/view".into(),
                remote_file_id: "f1".into(),
            }))
            .unwrap();

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["jobId"], json!(record.job_id().to_string()));
        assert_eq!(value["status"], "success");
        assert_eq!(value["title"], "Clip");
        assert_eq!(value["remoteUrl"], "https://drive.google.com/file/d/f1/view");
        assert_eq!(value["remoteFileId"], "f1");
        assert!(value.get("localPath").is_none());
        assert!(value.get("error").is_none());
        assert!(value["createdAt"].is_string());
        assert!(value["completedAt"].is_string());
    }

    #[test]
    fn test_queued_serialization_omits_optional_fields() {
        let value = serde_json::to_value(JobRecord::new(Uuid::new_v4())).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(value["status"], "queued");
        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["createdAt", "jobId", "status"]);
    }
}
