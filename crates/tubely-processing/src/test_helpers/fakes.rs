//! Scripted stand-ins for ffprobe and ffmpeg

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tubely_core::Orientation;

use crate::metadata::MediaProfile;
use crate::staging::TransformedFile;
use crate::video::{FastStartRemuxer, MediaProber, ProbeError, RemuxError, ToolError};

/// Prober returning fixed dimensions, or failing like a crashed ffprobe.
#[derive(Clone)]
pub struct FakeProber {
    dimensions: Option<(i64, i64)>,
    probed: Arc<Mutex<Vec<PathBuf>>>,
}

impl FakeProber {
    pub fn with_dimensions(width: i64, height: i64) -> Self {
        Self {
            dimensions: Some((width, height)),
            probed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        Self {
            dimensions: None,
            probed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn probed_paths(&self) -> Vec<PathBuf> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaProber for FakeProber {
    async fn probe(&self, path: &Path) -> Result<MediaProfile, ProbeError> {
        assert!(path.exists(), "probe called on missing file {}", path.display());
        self.probed.lock().unwrap().push(path.to_path_buf());

        match self.dimensions {
            Some((width, height)) => {
                let mut profile = MediaProfile::new("video", width, height);
                profile.codec_name = Some("h264".to_string());
                if profile.orientation == Orientation::Landscape {
                    profile.display_aspect_ratio = Some("16:9".to_string());
                }
                Ok(profile)
            }
            None => Err(ProbeError::Process(ToolError::Exit {
                program: "ffprobe",
                code: Some(1),
                stderr: "Invalid data found when processing input".to_string(),
            })),
        }
    }
}

/// Remuxer that copies its input to a fresh temp file next to it.
#[derive(Clone)]
pub struct FakeRemuxer {
    fail: bool,
    outputs: Arc<Mutex<Vec<PathBuf>>>,
}

impl FakeRemuxer {
    pub fn copying() -> Self {
        Self {
            fail: false,
            outputs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            outputs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Paths of every output file this remuxer created.
    pub fn output_paths(&self) -> Vec<PathBuf> {
        self.outputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl FastStartRemuxer for FakeRemuxer {
    async fn remux(&self, input: &Path) -> Result<TransformedFile, RemuxError> {
        let dir = input.parent().unwrap_or_else(|| Path::new("."));
        let output = tempfile::Builder::new()
            .prefix("tubely-faststart-")
            .suffix(".mp4")
            .tempfile_in(dir)
            .map_err(RemuxError::Output)?
            .into_temp_path();
        let transformed = TransformedFile::from_temp_path(output);
        self.outputs
            .lock()
            .unwrap()
            .push(transformed.path().to_path_buf());

        if self.fail {
            return Err(RemuxError::Process(ToolError::Exit {
                program: "ffmpeg",
                code: Some(1),
                stderr: "moov atom not found".to_string(),
            }));
        }

        tokio::fs::copy(input, transformed.path())
            .await
            .map_err(RemuxError::Output)?;
        Ok(transformed)
    }
}
