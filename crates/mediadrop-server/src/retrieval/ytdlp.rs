//! yt-dlp adapter

use async_trait::async_trait;
use mediadrop_common::{OutputFormat, Quality};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

use super::{format, stderr_tail, FetchError, MediaFetcher, MediaMetadata};

pub const DEFAULT_BINARY: &str = "yt-dlp";

/// Drives a yt-dlp compatible executable
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
}

impl YtDlp {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.binary);
        command.args(args).stdin(Stdio::null()).kill_on_drop(true);
        command
    }

    /// Run to completion, returning stdout on a zero exit
    async fn run(&self, action: &'static str, mut command: Command) -> Result<Vec<u8>, FetchError> {
        let output = command.output().await.map_err(|source| FetchError::Spawn {
            program: self.binary.display().to_string(),
            source,
        })?;

        if !output.status.success() {
            return Err(FetchError::Exited {
                action,
                status: output.status.to_string(),
                stderr: stderr_tail(&output.stderr),
            });
        }

        Ok(output.stdout)
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new(DEFAULT_BINARY)
    }
}

/// `-o` takes an output template; literal percent signs must be doubled
fn escape_template(path: &Path) -> String {
    path.to_string_lossy().replace('%', "%%")
}

#[async_trait]
impl MediaFetcher for YtDlp {
    #[instrument(skip(self))]
    async fn fetch_metadata(&self, url: &str) -> Result<MediaMetadata, FetchError> {
        let command = self.command([
            "--dump-single-json",
            "--no-playlist",
            "--no-warnings",
            "--",
            url,
        ]);
        let stdout = self.run("Metadata fetch", command).await?;
        let metadata: MediaMetadata = serde_json::from_slice(&stdout)?;

        debug!(id = %metadata.id, "Fetched metadata");
        Ok(metadata)
    }

    fn stream_command(&self, url: &str, quality: Quality) -> Command {
        let selector = format::stream_selector(quality);
        self.command([
            "-f",
            selector.as_str(),
            "--no-playlist",
            "--no-part",
            "--quiet",
            "-o",
            "-",
            "--",
            url,
        ])
    }

    #[instrument(skip(self, output_dir))]
    async fn materialize(
        &self,
        url: &str,
        quality: Quality,
        output_dir: &Path,
        file_stem: &str,
    ) -> Result<PathBuf, FetchError> {
        tokio::fs::create_dir_all(output_dir).await?;
        let output_dir = tokio::fs::canonicalize(output_dir).await?;

        let container = OutputFormat::Mp4;
        let path = output_dir.join(format!("{file_stem}.{}", container.extension()));
        let template = escape_template(&path);
        let selector = format::local_selector(quality);

        let command = self.command([
            "-f",
            selector.as_str(),
            "--merge-output-format",
            container.extension(),
            "--no-playlist",
            "--quiet",
            "-o",
            template.as_str(),
            "--",
            url,
        ]);
        self.run("Download", command).await?;

        // A zero exit without the file means the tool wrote somewhere else
        if !tokio::fs::try_exists(&path).await? {
            return Err(FetchError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("expected output file {} was not written", path.display()),
            )));
        }

        info!(path = %path.display(), "Media written to disk");
        Ok(path)
    }
}
