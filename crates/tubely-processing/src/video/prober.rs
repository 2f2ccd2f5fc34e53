use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use super::command::{run_tool, validate_file_path, validate_path, ToolError};
use super::MediaProber;
use crate::metadata::{classify_orientation, MediaProfile};

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error(transparent)]
    Process(#[from] ToolError),

    #[error("failed to parse ffprobe output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no streams found in file")]
    NoStreams,

    #[error("unexpected stream type: {0}")]
    UnexpectedStreamType(String),
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    codec_type: String,
    codec_name: Option<String>,
    #[serde(default)]
    width: i64,
    #[serde(default)]
    height: i64,
    display_aspect_ratio: Option<String>,
}

/// Build a profile from `ffprobe -print_format json -show_streams` output.
///
/// Only the first stream is considered and it must be a video stream.
pub fn profile_from_output(stdout: &[u8]) -> Result<MediaProfile, ProbeError> {
    let output: ProbeOutput = serde_json::from_slice(stdout)?;
    let stream = output
        .streams
        .into_iter()
        .next()
        .ok_or(ProbeError::NoStreams)?;

    if stream.codec_type != "video" {
        return Err(ProbeError::UnexpectedStreamType(stream.codec_type));
    }

    Ok(MediaProfile {
        orientation: classify_orientation(stream.width, stream.height),
        codec_type: stream.codec_type,
        codec_name: stream.codec_name,
        width: stream.width,
        height: stream.height,
        display_aspect_ratio: stream.display_aspect_ratio,
    })
}

/// [`MediaProber`] backed by the ffprobe binary.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    ffprobe_path: String,
    timeout: Option<Duration>,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: impl Into<String>) -> Result<Self, ToolError> {
        let ffprobe_path = ffprobe_path.into();
        validate_path(&ffprobe_path)?;
        Ok(Self {
            ffprobe_path,
            timeout: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    async fn probe(&self, path: &Path) -> Result<MediaProfile, ProbeError> {
        let start = Instant::now();
        validate_file_path(path)?;

        let mut command = Command::new(&self.ffprobe_path);
        command
            .args(["-v", "error", "-print_format", "json", "-show_streams"])
            .arg(path);

        let stdout = run_tool(command, "ffprobe", self.timeout).await?;
        let profile = profile_from_output(&stdout)?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis() as u64,
            width = profile.width,
            height = profile.height,
            codec = profile.codec_name.as_deref().unwrap_or("unknown"),
            orientation = %profile.orientation,
            "Video probe completed"
        );

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tubely_core::Orientation;

    #[test]
    fn test_profile_from_output() {
        let json = br#"{
            "streams": [
                {
                    "index": 0,
                    "codec_name": "h264",
                    "codec_type": "video",
                    "width": 1920,
                    "height": 1080,
                    "display_aspect_ratio": "16:9"
                },
                { "index": 1, "codec_name": "aac", "codec_type": "audio" }
            ]
        }"#;

        let profile = profile_from_output(json).unwrap();
        assert_eq!(profile.orientation, Orientation::Landscape);
        assert_eq!(profile.codec_name.as_deref(), Some("h264"));
        assert_eq!(profile.display_aspect_ratio.as_deref(), Some("16:9"));
    }

    #[test]
    fn test_profile_requires_video_first() {
        let json = br#"{"streams":[{"codec_type":"audio","codec_name":"aac"}]}"#;
        assert!(matches!(
            profile_from_output(json),
            Err(ProbeError::UnexpectedStreamType(t)) if t == "audio"
        ));

        assert!(matches!(
            profile_from_output(br#"{"streams":[]}"#),
            Err(ProbeError::NoStreams)
        ));
        assert!(matches!(profile_from_output(br#"{}"#), Err(ProbeError::NoStreams)));
        assert!(matches!(
            profile_from_output(b"not json"),
            Err(ProbeError::Parse(_))
        ));
    }

    #[test]
    fn test_new_rejects_unsafe_binary_path() {
        assert!(FfprobeProber::new("ffprobe").is_ok());
        assert!(FfprobeProber::new("ffprobe && curl evil").is_err());
    }

    #[tokio::test]
    async fn test_probe_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.mp4");
        std::fs::write(&input, b"data").unwrap();

        let prober = FfprobeProber::new("/nonexistent/ffprobe").unwrap();
        let err = prober.probe(&input).await.unwrap_err();
        assert!(matches!(err, ProbeError::Process(ToolError::Spawn { .. })));
    }
}
