//! Media ingestion for tubely.
//!
//! An upload moves through a fixed sequence of stages: bounded read, content
//! sniffing, staging to a temporary file, probing and fast-start remuxing
//! (videos only), storage key derivation, remote write, and finally the
//! metadata commit that publishes the new URL. [`IngestPipeline`] drives that
//! sequence; every temporary file it creates is owned by a guard that removes
//! it when the request finishes, fails, or is cancelled.

pub mod metadata;
pub mod staging;
pub mod upload;
pub mod validator;
pub mod video;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use metadata::{classify_orientation, MediaProfile};
pub use staging::{BodyLimitExceeded, StagedFile, StagingError, TransformedFile};
pub use upload::{
    AuthorizedUpload, IngestError, IngestPipeline, IngestSettings, IngestStage, UploadBody,
    UploadRequest,
};
pub use validator::{detect_content_type, MediaValidator, SniffedType, ValidationError};
pub use video::{
    FastStartRemuxer, FfmpegRemuxer, FfprobeProber, MediaProber, ProbeError, RemuxError,
    ToolError,
};
