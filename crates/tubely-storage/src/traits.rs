//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::keys::StorageKey;
use crate::StorageBackend;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Upload timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Confirmation of a durable write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: StorageKey,
    /// Direct URL of the object on this backend
    pub url: String,
    pub size_bytes: u64,
    /// Integrity tag reported by the backend, when it has one
    pub e_tag: Option<String>,
}

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) implement this trait so the
/// ingest pipeline never couples to a concrete store.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Stream the file at `source` to `key` with the given content type.
    ///
    /// Returns only once the backend has acknowledged the write. On error,
    /// nothing is guaranteed to exist under `key`.
    async fn put_object(
        &self,
        key: &StorageKey,
        content_type: &str,
        source: &Path,
    ) -> StorageResult<StoredObject>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
