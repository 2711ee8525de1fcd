//! Jobs: records, storage, execution and completion callbacks

pub mod engine;
pub mod model;
pub mod notifier;
pub mod store;

pub use engine::JobEngine;
pub use model::{DownloadRequest, JobId, JobRecord, JobResult, JobStatus, JobUpdate, TransitionError};
pub use notifier::Notifier;
pub use store::{InMemoryJobStore, JobStore, StoreError};
