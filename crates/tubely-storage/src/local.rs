use crate::keys::StorageKey;
use crate::traits::{Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem storage implementation
///
/// Objects live under `base_path` and are served from `base_url` (the API
/// mounts the directory at `/assets`). The filesystem has no notion of
/// content type, so it is only logged.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "./assets")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:8091/assets")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert storage key to filesystem path, rejecting anything that could
    /// escape the base directory.
    fn key_to_path(&self, key: &StorageKey) -> StorageResult<PathBuf> {
        let key = key.as_str();
        if key.is_empty() || key.contains("..") || key.starts_with('/') || key.contains('\\') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        Ok(self.base_path.join(key))
    }

    fn generate_url(&self, key: &StorageKey) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put_object(
        &self,
        key: &StorageKey,
        content_type: &str,
        source: &Path,
    ) -> StorageResult<StoredObject> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let size = fs::copy(source, &path).await.map_err(|e| {
            tracing::error!(
                error = %e,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Local storage write failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        // copy() does not fsync the destination
        fs::File::open(&path).await?.sync_all().await?;

        tracing::info!(
            key = %key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(StoredObject {
            key: key.clone(),
            url: self.generate_url(key),
            size_bytes: size,
            e_tag: None,
        })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyDeriver;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_put_object_creates_prefix_directories() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(
            dir.path().join("assets"),
            "http://localhost:8091/assets/".to_string(),
        )
        .await
        .unwrap();

        let source = dir.path().join("upload.mp4");
        std::fs::write(&source, b"fake mp4 payload").unwrap();

        let key = KeyDeriver::default()
            .derive_key("landscape/", ".mp4")
            .unwrap();
        let stored = storage
            .put_object(&key, "video/mp4", &source)
            .await
            .unwrap();

        assert_eq!(stored.size_bytes, 16);
        assert_eq!(
            stored.url,
            format!("http://localhost:8091/assets/{}", key)
        );
        let written = std::fs::read(storage.base_path().join(key.as_str())).unwrap();
        assert_eq!(written, b"fake mp4 payload");
        // source is left for the caller to clean up
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_missing_source_is_upload_failure() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:8091/assets".to_string())
            .await
            .unwrap();

        let key = KeyDeriver::default().derive_key("", ".jpg").unwrap();
        let result = storage
            .put_object(&key, "image/jpeg", &dir.path().join("gone.jpg"))
            .await;

        assert!(matches!(result, Err(StorageError::UploadFailed(_))));
        assert!(!dir.path().join(key.as_str()).exists());
    }

    #[tokio::test]
    async fn test_traversal_key_rejected() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("assets"), "http://x/assets".to_string())
            .await
            .unwrap();
        let source = dir.path().join("thumb.jpg");
        std::fs::write(&source, b"jpeg").unwrap();

        let key = KeyDeriver::default().derive_key("../", ".jpg").unwrap();
        let result = storage.put_object(&key, "image/jpeg", &source).await;

        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
        let escaped: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(escaped.len(), 2);
    }

    #[tokio::test]
    async fn test_backend_type() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:8091/assets".to_string())
            .await
            .unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Local);
    }
}
