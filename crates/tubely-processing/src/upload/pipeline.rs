use std::path::Path;
use std::sync::Arc;

use tokio::io::AsyncRead;
use tracing::Instrument;
use tubely_core::{MediaKind, ThumbnailDelivery, Video};
use tubely_db::VideoRepository;
use tubely_storage::{inline_data_url, KeyDeriver, Storage, StorageError, StorageKey, StoredObject};
use uuid::Uuid;

use super::error::IngestError;
use super::types::{AuthorizedUpload, IngestSettings, IngestStage, UploadBody, UploadRequest};
use crate::staging;
use crate::validator::MediaValidator;
use crate::video::{FastStartRemuxer, MediaProber};

fn reached(stage: IngestStage) {
    tracing::debug!(stage = %stage, "Ingest stage reached");
}

/// Drives an upload from raw bytes to a committed media pointer.
///
/// The video record is only updated after the object is fully written, so a
/// failure at any earlier step leaves the previous pointer in place.
pub struct IngestPipeline {
    videos: Arc<dyn VideoRepository>,
    storage: Arc<dyn Storage>,
    prober: Arc<dyn MediaProber>,
    remuxer: Arc<dyn FastStartRemuxer>,
    keys: KeyDeriver,
    settings: IngestSettings,
}

impl IngestPipeline {
    pub fn new(
        videos: Arc<dyn VideoRepository>,
        storage: Arc<dyn Storage>,
        prober: Arc<dyn MediaProber>,
        remuxer: Arc<dyn FastStartRemuxer>,
        settings: IngestSettings,
    ) -> Self {
        Self {
            videos,
            storage,
            prober,
            remuxer,
            keys: KeyDeriver::new(settings.key_encoding),
            settings,
        }
    }

    pub fn with_key_deriver(mut self, keys: KeyDeriver) -> Self {
        self.keys = keys;
        self
    }

    /// Load the target video and check ownership. Reads no body bytes.
    #[tracing::instrument(skip_all, fields(video_id = %video_id, owner_id = %owner_id))]
    pub async fn authorize(
        &self,
        video_id: Uuid,
        owner_id: Uuid,
    ) -> Result<AuthorizedUpload, IngestError> {
        reached(IngestStage::Received);
        let video = self
            .videos
            .get_video(video_id)
            .await
            .map_err(IngestError::MetadataLoad)?
            .ok_or(IngestError::NotFound(video_id))?;

        if !video.is_owned_by(owner_id) {
            return Err(IngestError::Ownership { video_id, owner_id });
        }

        reached(IngestStage::Authorized);
        Ok(AuthorizedUpload::new(video))
    }

    /// Authorize and ingest in one call.
    pub async fn ingest<R>(
        &self,
        request: UploadRequest<R>,
        kind: MediaKind,
    ) -> Result<Video, IngestError>
    where
        R: AsyncRead + Send,
    {
        let authorized = self.authorize(request.video_id, request.owner_id).await?;
        self.ingest_authorized(authorized, kind, request.body).await
    }

    /// Run the upload through validation, storage and commit.
    ///
    /// Temporary files created along the way are removed before this returns,
    /// and also if the returned future is dropped early.
    pub async fn ingest_authorized<R>(
        &self,
        authorized: AuthorizedUpload,
        kind: MediaKind,
        body: UploadBody<R>,
    ) -> Result<Video, IngestError>
    where
        R: AsyncRead + Send,
    {
        let span = tracing::info_span!(
            "ingest",
            video_id = %authorized.video().id,
            owner_id = %authorized.video().user_id,
            kind = %kind,
        );

        async move {
            let UploadBody {
                reader,
                declared_content_type,
                declared_length,
            } = body;
            let mut reader = std::pin::pin!(reader);
            let declared_content_type = declared_content_type.as_deref();

            let result = match kind {
                MediaKind::Thumbnail => {
                    self.ingest_thumbnail(
                        authorized,
                        &mut reader,
                        declared_content_type,
                        declared_length,
                    )
                    .await
                }
                MediaKind::Video => {
                    self.ingest_video(
                        authorized,
                        &mut reader,
                        declared_content_type,
                        declared_length,
                    )
                    .await
                }
            };

            match &result {
                Ok(video) => {
                    reached(IngestStage::Committed);
                    tracing::info!(video_id = %video.id, "Upload committed");
                }
                Err(err) => log_failure(err),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn ingest_thumbnail<R>(
        &self,
        authorized: AuthorizedUpload,
        reader: &mut R,
        declared_content_type: Option<&str>,
        declared_length: Option<u64>,
    ) -> Result<Video, IngestError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let validator =
            MediaValidator::for_kind(MediaKind::Thumbnail, self.settings.max_thumbnail_bytes);
        validator.validate_declared_size(declared_length)?;

        let data = staging::read_bounded(reader, &validator).await?;
        let sniffed = validator.sniff(&data, declared_content_type)?;
        let mut video = authorized.into_video();

        if self.settings.thumbnail_delivery == ThumbnailDelivery::Inline
            && data.len() as u64 <= self.settings.inline_thumbnail_max_bytes
        {
            video.thumbnail_url = Some(inline_data_url(sniffed.mime_type, &data));
            return self.commit(video, None, None).await;
        }

        let staged = staging::stage_bytes(&data, &sniffed, &self.settings.staging_dir).await?;
        drop(data);
        reached(IngestStage::Staged);

        let key = self.keys.derive_key("", &sniffed.file_extension())?;
        reached(IngestStage::KeyDerived);

        let stored = self.store(&key, sniffed.mime_type, staged.path()).await?;
        let url = self.settings.url_format.object_url(&stored);
        video.thumbnail_url = Some(url.clone());
        self.commit(video, Some(&stored), Some(url)).await
    }

    async fn ingest_video<R>(
        &self,
        authorized: AuthorizedUpload,
        reader: &mut R,
        declared_content_type: Option<&str>,
        declared_length: Option<u64>,
    ) -> Result<Video, IngestError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let validator = MediaValidator::for_kind(MediaKind::Video, self.settings.max_video_bytes);
        validator.validate_declared_size(declared_length)?;

        let (staged, sniffed) = staging::stage_stream(
            reader,
            &validator,
            declared_content_type,
            &self.settings.staging_dir,
        )
        .await?;
        reached(IngestStage::Staged);

        let profile = self.prober.probe(staged.path()).await?;
        reached(IngestStage::Probed);

        let transformed = self.remuxer.remux(staged.path()).await?;
        reached(IngestStage::Transformed);

        let key = self
            .keys
            .derive_key(profile.orientation.key_prefix(), &sniffed.file_extension())?;
        reached(IngestStage::KeyDerived);

        let stored = self
            .store(&key, sniffed.mime_type, transformed.path())
            .await?;

        let url = self.settings.url_format.object_url(&stored);
        let mut video = authorized.into_video();
        video.video_url = Some(url.clone());
        self.commit(video, Some(&stored), Some(url)).await
    }

    async fn store(
        &self,
        key: &StorageKey,
        content_type: &str,
        source: &Path,
    ) -> Result<StoredObject, IngestError> {
        let put = self.storage.put_object(key, content_type, source);
        let stored = match self.settings.upload_timeout {
            Some(limit) => tokio::time::timeout(limit, put)
                .await
                .map_err(|_| StorageError::Timeout(limit))??,
            None => put.await?,
        };

        reached(IngestStage::Stored);
        Ok(stored)
    }

    /// Publish the new pointer. `stored` and `url` describe the object the
    /// pointer refers to, if one was written.
    async fn commit(
        &self,
        video: Video,
        stored: Option<&StoredObject>,
        url: Option<String>,
    ) -> Result<Video, IngestError> {
        self.videos
            .update_video(&video)
            .await
            .map_err(|source| IngestError::MetadataCommit {
                storage_key: stored.map(|s| s.key.to_string()),
                url,
                source,
            })
    }
}

fn log_failure(err: &IngestError) {
    match err {
        IngestError::MetadataCommit {
            storage_key: Some(storage_key),
            url,
            source,
        } => {
            tracing::error!(
                reconcile = true,
                storage_key = %storage_key,
                url = url.as_deref().unwrap_or_default(),
                error = %source,
                "Object stored but metadata commit failed; object is unreferenced"
            );
        }
        err if err.is_client_error() => {
            tracing::debug!(step = err.step(), error = %err, "Upload rejected");
        }
        err => {
            tracing::warn!(step = err.step(), error = %err, "Upload failed");
        }
    }
}
