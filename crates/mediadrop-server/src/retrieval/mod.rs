//! External retrieval tool
//!
//! [`MediaFetcher`] is the narrow interface the lifecycle engine uses: fetch
//! metadata, build the command that streams media to stdout, or materialize a
//! local file. [`ytdlp::YtDlp`] drives a yt-dlp compatible binary.

use async_trait::async_trait;
use mediadrop_common::{sanitize::sanitize_filename, Quality};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use uuid::Uuid;

pub mod format;
pub mod ytdlp;

pub use ytdlp::YtDlp;

/// Characters of stderr kept for error messages
pub const STDERR_TAIL_CHARS: usize = 500;

/// Hex characters of the job id appended to local file names
const JOB_TAG_CHARS: usize = 8;

/// Stem of a local download: the sanitized title tagged with the job id, so
/// concurrent jobs for the same media never share an output file
pub fn local_file_stem(title: &str, job_id: Uuid) -> String {
    let tag: String = job_id.simple().to_string().chars().take(JOB_TAG_CHARS).collect();
    format!("{} [{tag}]", sanitize_filename(title))
}

/// What the tool reports about a resource
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaMetadata {
    /// Native identifier on the source site
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

impl MediaMetadata {
    /// Title for display and file naming; the native id when the site has none
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.id)
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{action} failed: retrieval tool exited with {status}{}", with_tail(.stderr))]
    Exited {
        action: &'static str,
        status: String,
        stderr: String,
    },

    #[error("Could not parse metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Format a diagnostic tail as a message suffix
pub fn with_tail(tail: &str) -> String {
    if tail.is_empty() {
        String::new()
    } else {
        format!(": {tail}")
    }
}

/// Last [`STDERR_TAIL_CHARS`] characters of captured output, trimmed
pub fn stderr_tail(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    let skip = text.chars().count().saturating_sub(STDERR_TAIL_CHARS);
    text.chars().skip(skip).collect()
}

/// Drain `reader` to EOF keeping only a bounded tail
pub async fn read_tail<R: AsyncRead + Unpin>(mut reader: R) -> String {
    // Bytes, not chars: four bytes covers any UTF-8 character
    let limit = STDERR_TAIL_CHARS * 4;
    let mut kept: Vec<u8> = Vec::new();
    let mut buf = [0u8; 4096];

    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                kept.extend_from_slice(&buf[..n]);
                if kept.len() > limit * 2 {
                    kept.drain(..kept.len() - limit);
                }
            },
        }
    }

    stderr_tail(&kept)
}

#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Title and native id for `url`
    async fn fetch_metadata(&self, url: &str) -> Result<MediaMetadata, FetchError>;

    /// Command writing a self-contained, playable stream of `url` to stdout
    ///
    /// The caller spawns it and owns the child.
    fn stream_command(&self, url: &str, quality: Quality) -> Command;

    /// Download `url` into `output_dir` as `<file_stem>.mp4`, returning the
    /// absolute file path
    async fn materialize(
        &self,
        url: &str,
        quality: Quality,
        output_dir: &Path,
        file_stem: &str,
    ) -> Result<PathBuf, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stderr_tail_keeps_end() {
        let long = format!("{}END", "x".repeat(1000));
        let tail = stderr_tail(long.as_bytes());
        assert_eq!(tail.chars().count(), STDERR_TAIL_CHARS);
        assert!(tail.ends_with("END"));

        assert_eq!(stderr_tail(b"  ERROR: boom\n"), "ERROR: boom");
    }

    #[tokio::test]
    async fn test_read_tail_bounds_memory() {
        let data = format!("{}ERROR: last line", "noise ".repeat(5000));
        let tail = read_tail(data.as_bytes()).await;
        assert!(tail.ends_with("ERROR: last line"));
        assert!(tail.chars().count() <= STDERR_TAIL_CHARS);
    }

    #[test]
    fn test_display_title_falls_back_to_id() {
        let meta = MediaMetadata {
            id: "abc123".to_string(),
            title: Some("  ".to_string()),
        };
        assert_eq!(meta.display_title(), "abc123");
    }

    #[test]
    fn test_local_file_stem_is_tagged_per_job() {
        let first = Uuid::parse_str("1a2b3c4d-0000-4000-8000-000000000000").unwrap();
        let second = Uuid::parse_str("9f8e7d6c-0000-4000-8000-000000000000").unwrap();

        assert_eq!(local_file_stem("AC/DC: Live?", first), "AC_DC_ Live [1a2b3c4d]");
        assert_ne!(local_file_stem("Same", first), local_file_stem("Same", second));
    }

    #[test]
    fn test_exited_message_includes_tail() {
        let err = FetchError::Exited {
            action: "Metadata fetch",
            status: "exit status: 1".to_string(),
            stderr: "ERROR: Unsupported URL".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Metadata fetch failed: retrieval tool exited with exit status: 1: ERROR: Unsupported URL"
        );
    }
}
