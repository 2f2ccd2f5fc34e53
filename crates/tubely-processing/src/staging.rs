//! Temporary files for uploads in flight.
//!
//! Files are created inside the configured staging directory and wrapped in
//! [`tempfile::TempPath`], which unlinks them on drop. Dropping a
//! [`StagedFile`] or [`TransformedFile`] is therefore the cleanup step, and it
//! runs on every exit path including cancellation of the request future.

use std::io;
use std::path::Path;

use tempfile::TempPath;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tubely_core::constants::SNIFF_WINDOW_BYTES;

use crate::validator::{MediaValidator, SniffedType, ValidationError};

const STAGED_PREFIX: &str = "tubely-upload-";
const COPY_BUFFER_BYTES: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to read upload body: {0}")]
    BodyRead(#[source] io::Error),

    #[error("Failed to write staged file: {0}")]
    Write(#[source] io::Error),
}

/// Marker carried inside an [`io::Error`] by body readers whose transport
/// limit tripped before the upload ended.
///
/// Staging reports it as [`ValidationError::FileTooLarge`] instead of a read
/// failure.
#[derive(Debug, thiserror::Error)]
#[error("request body exceeded its size limit")]
pub struct BodyLimitExceeded;

impl BodyLimitExceeded {
    pub fn into_io_error(self) -> io::Error {
        io::Error::other(self)
    }
}

fn body_read_error(err: io::Error, validator: &MediaValidator) -> StagingError {
    let over_limit = err
        .get_ref()
        .is_some_and(|inner| inner.is::<BodyLimitExceeded>());
    if over_limit {
        StagingError::Validation(ValidationError::FileTooLarge {
            max: validator.max_file_size(),
        })
    } else {
        StagingError::BodyRead(err)
    }
}

/// Upload bytes written to local disk, deleted on drop.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    size_bytes: u64,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

/// Output of a media transform, deleted on drop.
#[derive(Debug)]
pub struct TransformedFile {
    path: TempPath,
}

impl TransformedFile {
    /// Take ownership of a temp path produced by a transform step.
    pub fn from_temp_path(path: TempPath) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn read_head<R: AsyncRead + Unpin>(reader: &mut R, len: usize) -> io::Result<Vec<u8>> {
    let mut head = Vec::with_capacity(len);
    (&mut *reader).take(len as u64).read_to_end(&mut head).await?;
    Ok(head)
}

/// Read an entire body into memory, failing once it exceeds the validator's cap.
///
/// At most `max + 1` bytes are ever pulled from `reader`.
pub async fn read_bounded<R: AsyncRead + Unpin>(
    reader: &mut R,
    validator: &MediaValidator,
) -> Result<Vec<u8>, StagingError> {
    let mut data = Vec::new();
    (&mut *reader)
        .take(validator.max_file_size().saturating_add(1))
        .read_to_end(&mut data)
        .await
        .map_err(|e| body_read_error(e, validator))?;

    validator.validate_file_size(data.len() as u64)?;
    Ok(data)
}

/// Stream a body to a new file in `staging_dir`.
///
/// The first [`SNIFF_WINDOW_BYTES`] are sniffed before the file is created,
/// so unsupported content never touches disk. If the body grows past the
/// size cap the partial file is removed before the error is returned.
pub async fn stage_stream<R: AsyncRead + Unpin>(
    reader: &mut R,
    validator: &MediaValidator,
    declared_content_type: Option<&str>,
    staging_dir: &Path,
) -> Result<(StagedFile, SniffedType), StagingError> {
    let head = read_head(reader, SNIFF_WINDOW_BYTES)
        .await
        .map_err(|e| body_read_error(e, validator))?;
    validator.validate_file_size(head.len() as u64)?;
    let sniffed = validator.sniff(&head, declared_content_type)?;

    let (file, path) = tempfile::Builder::new()
        .prefix(STAGED_PREFIX)
        .suffix(&sniffed.file_extension())
        .tempfile_in(staging_dir)
        .map_err(StagingError::Write)?
        .into_parts();
    let mut staged = StagedFile {
        path,
        size_bytes: 0,
    };
    let mut file = tokio::fs::File::from_std(file);

    file.write_all(&head).await.map_err(StagingError::Write)?;
    let mut total = head.len() as u64;
    let mut buffer = vec![0u8; COPY_BUFFER_BYTES];
    loop {
        let n = reader
            .read(&mut buffer)
            .await
            .map_err(|e| body_read_error(e, validator))?;
        if n == 0 {
            break;
        }
        total += n as u64;
        validator.validate_file_size(total)?;
        file.write_all(&buffer[..n])
            .await
            .map_err(StagingError::Write)?;
    }

    file.flush().await.map_err(StagingError::Write)?;
    file.sync_all().await.map_err(StagingError::Write)?;
    staged.size_bytes = total;

    tracing::debug!(
        path = %staged.path().display(),
        size_bytes = total,
        content_type = sniffed.mime_type,
        "Upload staged"
    );

    Ok((staged, sniffed))
}

/// Write an in-memory body to a new file in `staging_dir`.
pub async fn stage_bytes(
    data: &[u8],
    sniffed: &SniffedType,
    staging_dir: &Path,
) -> Result<StagedFile, StagingError> {
    let (file, path) = tempfile::Builder::new()
        .prefix(STAGED_PREFIX)
        .suffix(&sniffed.file_extension())
        .tempfile_in(staging_dir)
        .map_err(StagingError::Write)?
        .into_parts();
    let staged = StagedFile {
        path,
        size_bytes: data.len() as u64,
    };

    let mut file = tokio::fs::File::from_std(file);
    file.write_all(data).await.map_err(StagingError::Write)?;
    file.flush().await.map_err(StagingError::Write)?;
    file.sync_all().await.map_err(StagingError::Write)?;

    Ok(staged)
}
