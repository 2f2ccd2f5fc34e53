//! Video probing and fast-start remuxing via ffprobe/ffmpeg

mod command;
pub mod faststart;
pub mod prober;

use std::path::Path;

use async_trait::async_trait;

use crate::metadata::MediaProfile;
use crate::staging::TransformedFile;

pub use command::ToolError;
pub use faststart::{FfmpegRemuxer, RemuxError};
pub use prober::{FfprobeProber, ProbeError};

/// Reads the primary stream geometry of a local media file.
#[async_trait]
pub trait MediaProber: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<MediaProfile, ProbeError>;
}

/// Rewrites a local MP4 so its index precedes the media data.
///
/// Implementations must never modify `input`; the output is a new file whose
/// lifetime is owned by the returned [`TransformedFile`].
#[async_trait]
pub trait FastStartRemuxer: Send + Sync {
    async fn remux(&self, input: &Path) -> Result<TransformedFile, RemuxError>;
}
