use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;

use super::command::{run_tool, validate_file_path, validate_path, ToolError};
use super::FastStartRemuxer;
use crate::staging::TransformedFile;

const OUTPUT_PREFIX: &str = "tubely-faststart-";

#[derive(Debug, thiserror::Error)]
pub enum RemuxError {
    #[error(transparent)]
    Process(#[from] ToolError),

    #[error("failed to create output file: {0}")]
    Output(#[source] io::Error),
}

/// Stream-copy `input` into `output` with the moov atom moved to the front.
///
/// `-y` is required because `output` already exists as a reserved temp file.
fn faststart_args(input: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-nostdin", "-y", "-i"].iter().map(OsString::from).collect();
    args.push(input.as_os_str().to_owned());
    args.extend(
        ["-c", "copy", "-movflags", "faststart", "-f", "mp4"]
            .iter()
            .map(OsString::from),
    );
    args.push(output.as_os_str().to_owned());
    args
}

/// [`FastStartRemuxer`] backed by the ffmpeg binary.
#[derive(Debug, Clone)]
pub struct FfmpegRemuxer {
    ffmpeg_path: String,
    timeout: Option<Duration>,
}

impl FfmpegRemuxer {
    pub fn new(ffmpeg_path: impl Into<String>) -> Result<Self, ToolError> {
        let ffmpeg_path = ffmpeg_path.into();
        validate_path(&ffmpeg_path)?;
        Ok(Self {
            ffmpeg_path,
            timeout: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl FastStartRemuxer for FfmpegRemuxer {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart"
    ))]
    async fn remux(&self, input: &Path) -> Result<TransformedFile, RemuxError> {
        let start = Instant::now();
        validate_file_path(input)?;

        // Reserve a unique output name next to the input; the guard owns it
        // from here so a failed run leaves nothing behind.
        let output_dir = input.parent().unwrap_or_else(|| Path::new("."));
        let output = tempfile::Builder::new()
            .prefix(OUTPUT_PREFIX)
            .suffix(".mp4")
            .tempfile_in(output_dir)
            .map_err(RemuxError::Output)?
            .into_temp_path();
        let transformed = TransformedFile::from_temp_path(output);

        let mut command = Command::new(&self.ffmpeg_path);
        command.args(faststart_args(input, transformed.path()));
        run_tool(command, "ffmpeg", self.timeout).await?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis() as u64,
            "Fast-start remux completed"
        );

        Ok(transformed)
    }
}
