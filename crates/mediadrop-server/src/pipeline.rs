//! Streaming pipeline
//!
//! Couples the retrieval tool's stdout directly to a storage upload. Bytes are
//! never staged on disk or fully buffered: the upload body pulls from the pipe,
//! so a slow provider connection stalls the producing process.
//!
//! The upload and the child's exit are awaited together. The outcome is the
//! upload's outcome; the exit status is diagnostic only.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use crate::retrieval::{read_tail, with_tail};
use crate::storage::{ByteStream, StorageDestination, StorageError, StorageProvider, UploadedObject};

/// How long to wait for the stderr reader once the child is gone; helper
/// processes spawned by the tool may keep the pipe open.
const STDERR_DRAIN_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to launch retrieval tool: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Retrieval tool stdout was not captured")]
    NoStdout,

    #[error("Upload failed: {source}{}", with_tail(.stderr))]
    Upload {
        #[source]
        source: StorageError,
        stderr: String,
    },
}

async fn collect_stderr(task: JoinHandle<String>) -> String {
    match tokio::time::timeout(STDERR_DRAIN_GRACE, task).await {
        Ok(Ok(tail)) => tail,
        _ => String::new(),
    }
}

fn log_exit(status: ExitStatus, upload_done: bool) {
    if status.success() {
        debug!("Retrieval tool exited cleanly");
    } else if upload_done {
        warn!(%status, "Retrieval tool exited with an error after the upload completed");
    } else {
        warn!(%status, "Retrieval tool exited with an error while the upload was running");
    }
}

async fn reap(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        debug!(error = %e, "Retrieval tool already gone");
    }
    if let Err(e) = child.wait().await {
        warn!(error = %e, "Could not reap retrieval tool");
    }
}

/// Run `command` and upload its stdout as `name` into `destination`
///
/// On success the object is also made readable by link; failing that is
/// logged and ignored. On upload failure the process is killed and the error
/// carries the tail of the tool's stderr.
pub async fn stream_to_storage(
    mut command: Command,
    storage: &dyn StorageProvider,
    destination: &StorageDestination,
    name: &str,
) -> Result<UploadedObject, PipelineError> {
    command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(PipelineError::Spawn)?;
    let stdout = match child.stdout.take() {
        Some(stdout) => stdout,
        None => {
            reap(&mut child).await;
            return Err(PipelineError::NoStdout);
        },
    };
    let stderr = child.stderr.take();
    let stderr_task = tokio::spawn(async move {
        match stderr {
            Some(stderr) => read_tail(stderr).await,
            None => String::new(),
        }
    });

    let body: ByteStream = Box::pin(ReaderStream::new(stdout));
    let upload = storage.upload_stream(destination, name, body);
    tokio::pin!(upload);

    let mut process_done = false;
    let uploaded = loop {
        tokio::select! {
            result = &mut upload => break result,
            status = child.wait(), if !process_done => {
                process_done = true;
                match status {
                    Ok(status) => log_exit(status, false),
                    Err(e) => warn!(error = %e, "Could not wait for retrieval tool"),
                }
            },
        }
    };

    let uploaded = match uploaded {
        Ok(uploaded) => uploaded,
        Err(source) => {
            if !process_done {
                reap(&mut child).await;
            }
            let stderr = collect_stderr(stderr_task).await;
            return Err(PipelineError::Upload { source, stderr });
        },
    };

    if !process_done {
        match child.wait().await {
            Ok(status) => log_exit(status, true),
            Err(e) => warn!(error = %e, "Could not wait for retrieval tool"),
        }
    }
    stderr_task.abort();

    if let Err(e) = storage.make_public(destination, &uploaded.file_id).await {
        warn!(file_id = %uploaded.file_id, error = %e, "Could not make upload public");
    }

    info!(file_id = %uploaded.file_id, "Streamed upload complete");
    Ok(uploaded)
}
