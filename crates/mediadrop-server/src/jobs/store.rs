//! Job store
//!
//! Records live for the lifetime of the process. Nothing is ever deleted.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;

use super::model::{JobId, JobRecord, JobUpdate, TransitionError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("job {0} already exists")]
    Duplicate(JobId),

    #[error("job {0} not found")]
    NotFound(JobId),

    #[error("job {id}: {source}")]
    Transition {
        id: JobId,
        #[source]
        source: TransitionError,
    },
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, record: JobRecord) -> Result<(), StoreError>;

    /// Snapshot of the record, `None` for an unknown id
    async fn get(&self, id: JobId) -> Option<JobRecord>;

    /// Apply `update` atomically and return the resulting record
    async fn update(&self, id: JobId, update: JobUpdate) -> Result<JobRecord, StoreError>;

    async fn count(&self) -> usize;
}

#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, JobRecord>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, record: JobRecord) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write();
        let id = record.job_id();
        if jobs.contains_key(&id) {
            return Err(StoreError::Duplicate(id));
        }
        jobs.insert(id, record);
        Ok(())
    }

    async fn get(&self, id: JobId) -> Option<JobRecord> {
        self.jobs.read().get(&id).cloned()
    }

    async fn update(&self, id: JobId, update: JobUpdate) -> Result<JobRecord, StoreError> {
        let mut jobs = self.jobs.write();
        let record = jobs.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        record
            .apply(update)
            .map_err(|source| StoreError::Transition { id, source })?;
        Ok(record.clone())
    }

    async fn count(&self) -> usize {
        self.jobs.read().len()
    }
}
