use crate::keys::StorageKey;
use crate::traits::{Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::buffered::BufWriter;
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, Attributes, DynObjectStore, ObjectStoreExt};
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: Arc<AmazonS3>,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    ///
    /// Credentials come from the standard `AWS_*` environment variables.
    pub fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store: Arc::new(store),
            bucket,
            region,
            endpoint_url,
        })
    }

    /// Generate public URL for S3 object
    ///
    /// For AWS S3: https://{bucket}.s3.{region}.amazonaws.com/{key}
    /// For S3-compatible providers (path-style): {endpoint}/{bucket}/{key}
    fn generate_url(&self, key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            let base_url = endpoint.trim_end_matches('/');
            format!("{}/{}/{}", base_url, self.bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            )
        }
    }

    /// Copy `source` into a buffered multipart writer; aborts the upload on failure.
    async fn stream_file(
        &self,
        location: &ObjectPath,
        content_type: &str,
        source: &Path,
    ) -> StorageResult<u64> {
        let mut file = tokio::fs::File::open(source).await?;

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());

        let store: Arc<DynObjectStore> = self.store.clone();
        let mut writer = BufWriter::new(store, location.clone()).with_attributes(attributes);

        let copied = tokio::io::copy(&mut file, &mut writer).await;
        let size = match copied {
            Ok(size) => size,
            Err(e) => {
                if let Err(abort_err) = writer.abort().await {
                    tracing::warn!(
                        error = %abort_err,
                        bucket = %self.bucket,
                        key = %location,
                        "Failed to abort S3 multipart upload"
                    );
                }
                return Err(StorageError::UploadFailed(e.to_string()));
            }
        };

        writer
            .shutdown()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        Ok(size)
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put_object(
        &self,
        key: &StorageKey,
        content_type: &str,
        source: &Path,
    ) -> StorageResult<StoredObject> {
        let location = ObjectPath::from(key.as_str());
        let start = std::time::Instant::now();

        let size = self
            .stream_file(&location, content_type, source)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    content_type = %content_type,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                e
            })?;

        // The writer does not surface the final ETag, so read it back.
        let meta = self.store.head(&location).await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                "S3 object missing after upload"
            );
            StorageError::BackendError(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            e_tag = ?meta.e_tag,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(StoredObject {
            key: key.clone(),
            url: self.generate_url(key.as_str()),
            size_bytes: size,
            e_tag: meta.e_tag,
        })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_url_aws() {
        let storage = S3Storage::new("tubely-media".to_string(), "us-east-2".to_string(), None)
            .unwrap();
        assert_eq!(
            storage.generate_url("landscape/abc.mp4"),
            "https://tubely-media.s3.us-east-2.amazonaws.com/landscape/abc.mp4"
        );
    }

    #[test]
    fn test_generate_url_custom_endpoint() {
        let storage = S3Storage::new(
            "tubely-media".to_string(),
            "us-east-1".to_string(),
            Some("http://localhost:9000/".to_string()),
        )
        .unwrap();
        assert_eq!(
            storage.generate_url("abc.jpg"),
            "http://localhost:9000/tubely-media/abc.jpg"
        );
        assert_eq!(storage.backend_type(), StorageBackend::S3);
    }
}
