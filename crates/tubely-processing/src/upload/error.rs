use std::io;

use tubely_core::AppError;
use tubely_storage::{KeyError, StorageError};
use uuid::Uuid;

use crate::staging::StagingError;
use crate::validator::ValidationError;
use crate::video::{ProbeError, RemuxError};

/// Why an upload did not reach the committed stage.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("video {0} not found")]
    NotFound(Uuid),

    #[error("user {owner_id} does not own video {video_id}")]
    Ownership { video_id: Uuid, owner_id: Uuid },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to read upload body: {0}")]
    BodyRead(#[source] io::Error),

    #[error("failed to stage upload: {0}")]
    Staging(#[source] io::Error),

    #[error("probe failed: {0}")]
    Probe(#[from] ProbeError),

    #[error("fast-start transform failed: {0}")]
    Transform(#[from] RemuxError),

    #[error("storage key derivation failed: {0}")]
    KeyDerivation(#[from] KeyError),

    #[error("remote write failed: {0}")]
    RemoteWrite(#[from] StorageError),

    #[error("failed to load video metadata: {0}")]
    MetadataLoad(#[source] AppError),

    /// The pointer update failed. `storage_key` and `url` are set when an
    /// object was already written and is now unreferenced.
    #[error("metadata commit failed: {source}")]
    MetadataCommit {
        storage_key: Option<String>,
        url: Option<String>,
        #[source]
        source: AppError,
    },
}

impl From<StagingError> for IngestError {
    fn from(err: StagingError) -> Self {
        match err {
            StagingError::Validation(e) => IngestError::Validation(e),
            StagingError::BodyRead(e) => IngestError::BodyRead(e),
            StagingError::Write(e) => IngestError::Staging(e),
        }
    }
}

impl IngestError {
    /// Name of the step that failed, for logs.
    pub fn step(&self) -> &'static str {
        match self {
            IngestError::NotFound(_)
            | IngestError::Ownership { .. }
            | IngestError::MetadataLoad(_) => "authorization",
            IngestError::Validation(_) | IngestError::BodyRead(_) => "validation",
            IngestError::Staging(_) => "staging",
            IngestError::Probe(_) => "probe",
            IngestError::Transform(_) => "transform",
            IngestError::KeyDerivation(_) => "key_derivation",
            IngestError::RemoteWrite(_) => "remote_write",
            IngestError::MetadataCommit { .. } => "metadata_commit",
        }
    }

    /// Client errors that need no operator attention.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            IngestError::NotFound(_)
                | IngestError::Ownership { .. }
                | IngestError::Validation(_)
                | IngestError::BodyRead(_)
        )
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::NotFound(_) => AppError::NotFound("Couldn't find video".to_string()),
            IngestError::Ownership { .. } => {
                AppError::Unauthorized("Not authorized to update this video".to_string())
            }
            IngestError::Validation(ValidationError::FileTooLarge { max }) => {
                AppError::PayloadTooLarge(format!("File exceeds the maximum size of {} bytes", max))
            }
            IngestError::Validation(ValidationError::UnsupportedContentType {
                content_type, ..
            }) => AppError::UnsupportedMediaType(format!("Unsupported file type: {}", content_type)),
            IngestError::BodyRead(e) => {
                AppError::InvalidInput(format!("Failed to read upload body: {}", e))
            }
            IngestError::Staging(e) => AppError::Internal(format!("Failed to stage upload: {}", e)),
            IngestError::Probe(e) => AppError::ExternalTool {
                stage: "Probe",
                message: e.to_string(),
            },
            IngestError::Transform(e) => AppError::ExternalTool {
                stage: "Transform",
                message: e.to_string(),
            },
            IngestError::KeyDerivation(e) => AppError::Internal(e.to_string()),
            IngestError::RemoteWrite(e) => AppError::Storage(e.to_string()),
            IngestError::MetadataLoad(e) => e,
            IngestError::MetadataCommit {
                storage_key,
                source,
                ..
            } => AppError::MetadataCommit {
                storage_key,
                message: source.to_string(),
            },
        }
    }
}
