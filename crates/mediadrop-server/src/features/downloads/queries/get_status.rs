use uuid::Uuid;

use crate::error::AppError;
use crate::jobs::{JobRecord, JobStore};

#[derive(Debug, Clone)]
pub struct GetJobStatusQuery {
    pub job_id: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GetJobStatusError {
    #[error("Job {0} not found")]
    NotFound(String),
}

impl From<GetJobStatusError> for AppError {
    fn from(err: GetJobStatusError) -> Self {
        AppError::NotFound(err.to_string())
    }
}

/// Look up a job; ids that are not UUIDs cannot exist and are simply not found
#[tracing::instrument(skip(store))]
pub async fn handle(
    store: &dyn JobStore,
    query: GetJobStatusQuery,
) -> Result<JobRecord, GetJobStatusError> {
    let id = Uuid::parse_str(query.job_id.trim())
        .map_err(|_| GetJobStatusError::NotFound(query.job_id.clone()))?;

    store
        .get(id)
        .await
        .ok_or(GetJobStatusError::NotFound(query.job_id))
}
