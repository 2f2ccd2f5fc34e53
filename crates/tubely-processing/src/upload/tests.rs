use std::io;
use std::path::Path;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tempfile::TempDir;
use tokio::io::{AsyncRead, ReadBuf};
use tubely_core::{KeyEncoding, MediaKind, ThumbnailDelivery, Video};
use tubely_storage::{EntropySource, KeyDeriver, KeyError};
use uuid::Uuid;

use super::{IngestError, IngestPipeline, IngestSettings, UploadBody, UploadRequest};
use crate::test_helpers::fixtures;
use crate::test_helpers::mock_storage::MOCK_BASE_URL;
use crate::test_helpers::{FakeProber, FakeRemuxer, MockStorage, MockVideoRepository};
use crate::validator::ValidationError;

struct Harness {
    pipeline: IngestPipeline,
    storage: MockStorage,
    videos: MockVideoRepository,
    prober: FakeProber,
    remuxer: FakeRemuxer,
    staging: TempDir,
    owner_id: Uuid,
    video: Video,
}

impl Harness {
    fn new(prober: FakeProber, remuxer: FakeRemuxer) -> Self {
        Self::with_settings(prober, remuxer, |_| {})
    }

    fn with_settings(
        prober: FakeProber,
        remuxer: FakeRemuxer,
        configure: impl FnOnce(&mut IngestSettings),
    ) -> Self {
        let staging = tempfile::tempdir().unwrap();
        let storage = MockStorage::new();
        let videos = MockVideoRepository::new();
        let owner_id = Uuid::new_v4();
        let video = fixtures::sample_video(owner_id);
        videos.add_video(video.clone());

        let mut settings = IngestSettings::new(staging.path());
        settings.max_video_bytes = 1 << 20;
        settings.max_thumbnail_bytes = 256 * 1024;
        configure(&mut settings);

        let pipeline = IngestPipeline::new(
            Arc::new(videos.clone()),
            Arc::new(storage.clone()),
            Arc::new(prober.clone()),
            Arc::new(remuxer.clone()),
            settings,
        );

        Self {
            pipeline,
            storage,
            videos,
            prober,
            remuxer,
            staging,
            owner_id,
            video,
        }
    }

    fn request(&self, data: Vec<u8>) -> UploadRequest<io::Cursor<Vec<u8>>> {
        UploadRequest {
            video_id: self.video.id,
            owner_id: self.owner_id,
            body: UploadBody::new(io::Cursor::new(data)),
        }
    }

    fn staging_is_empty(&self) -> bool {
        std::fs::read_dir(self.staging.path()).unwrap().next().is_none()
    }

    fn stored_video(&self) -> Video {
        self.videos.video(self.video.id).unwrap()
    }
}

fn key_of(url: &str) -> &str {
    url.strip_prefix(MOCK_BASE_URL)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap()
}

fn assert_random_token(token: &str) {
    assert_eq!(token.len(), 64, "unexpected token {token}");
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
}

struct ExhaustedEntropy;

impl EntropySource for ExhaustedEntropy {
    fn fill(&self, _dest: &mut [u8]) -> Result<(), KeyError> {
        Err(KeyError::EntropySource("getrandom: resource unavailable".to_string()))
    }
}

/// Reader that records whether it was ever polled.
struct TrackingReader {
    polled: Arc<AtomicBool>,
}

impl AsyncRead for TrackingReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.polled.store(true, Ordering::SeqCst);
        Poll::Ready(Ok(()))
    }
}

/// Reader that yields its data and then never completes.
struct StallingReader {
    data: Vec<u8>,
    pos: usize,
}

impl AsyncRead for StallingReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.pos >= self.data.len() {
            return Poll::Pending;
        }
        let n = buf.remaining().min(self.data.len() - self.pos);
        let start = self.pos;
        buf.put_slice(&self.data[start..start + n]);
        self.pos += n;
        Poll::Ready(Ok(()))
    }
}

#[tokio::test]
async fn test_thumbnail_upload_stores_object_and_commits_url() {
    let h = Harness::new(FakeProber::with_dimensions(1920, 1080), FakeRemuxer::copying());
    let data = fixtures::jpeg_bytes(64 * 1024);

    let video = h
        .pipeline
        .ingest(h.request(data.clone()), MediaKind::Thumbnail)
        .await
        .unwrap();

    let url = video.thumbnail_url.clone().unwrap();
    let key = key_of(&url);
    let token = key.strip_suffix(".jpg").unwrap();
    assert_random_token(token);

    let object = h.storage.get(key).unwrap();
    assert_eq!(object.content_type, "image/jpeg");
    assert_eq!(object.data, data);

    assert_eq!(h.stored_video().thumbnail_url, Some(url));
    assert!(h.staging_is_empty());
    assert!(h.prober.probed_paths().is_empty());
}

#[tokio::test]
async fn test_video_upload_is_remuxed_and_keyed_by_orientation() {
    let cases = [
        ((1920, 1080), "landscape/"),
        ((1080, 1920), "portrait/"),
        ((1920, 1081), "other/"),
    ];

    for ((width, height), prefix) in cases {
        let h = Harness::new(
            FakeProber::with_dimensions(width, height),
            FakeRemuxer::copying(),
        );
        let data = fixtures::mp4_bytes(300 * 1024);

        let video = h
            .pipeline
            .ingest(h.request(data.clone()), MediaKind::Video)
            .await
            .unwrap();

        let url = video.video_url.unwrap();
        let key = key_of(&url);
        let token = key
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(".mp4"))
            .unwrap_or_else(|| panic!("{key} should be {prefix}<token>.mp4"));
        assert_random_token(token);

        let object = h.storage.get(key).unwrap();
        assert_eq!(object.content_type, "video/mp4");
        assert_eq!(object.data, data);

        // The transformed file is what gets uploaded, never the staged original
        assert_eq!(h.storage.uploaded_sources(), h.remuxer.output_paths());
        assert_ne!(h.storage.uploaded_sources(), h.prober.probed_paths());
        assert!(h.staging_is_empty());
    }
}

#[tokio::test]
async fn test_repeated_uploads_get_distinct_keys() {
    let h = Harness::new(FakeProber::with_dimensions(1920, 1080), FakeRemuxer::copying());
    let data = fixtures::png_bytes();

    let first = h
        .pipeline
        .ingest(h.request(data.clone()), MediaKind::Thumbnail)
        .await
        .unwrap();
    let second = h
        .pipeline
        .ingest(h.request(data), MediaKind::Thumbnail)
        .await
        .unwrap();

    assert_ne!(first.thumbnail_url, second.thumbnail_url);
    assert_eq!(h.storage.object_count(), 2);
}

#[tokio::test]
async fn test_wrong_owner_is_rejected_before_reading_body() {
    let h = Harness::new(FakeProber::with_dimensions(1920, 1080), FakeRemuxer::copying());
    let polled = Arc::new(AtomicBool::new(false));
    let request = UploadRequest {
        video_id: h.video.id,
        owner_id: Uuid::new_v4(),
        body: UploadBody::new(TrackingReader {
            polled: polled.clone(),
        }),
    };

    let err = h.pipeline.ingest(request, MediaKind::Video).await.unwrap_err();

    assert!(matches!(err, IngestError::Ownership { .. }));
    assert!(!polled.load(Ordering::SeqCst));
    assert!(h.staging_is_empty());
    assert_eq!(h.storage.object_count(), 0);
    assert_eq!(h.videos.update_calls(), 0);
}

#[tokio::test]
async fn test_missing_video_is_not_found() {
    let h = Harness::new(FakeProber::with_dimensions(1920, 1080), FakeRemuxer::copying());
    let missing = Uuid::new_v4();
    let request = UploadRequest {
        video_id: missing,
        owner_id: h.owner_id,
        body: UploadBody::new(io::Cursor::new(fixtures::png_bytes())),
    };

    let err = h
        .pipeline
        .ingest(request, MediaKind::Thumbnail)
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::NotFound(id) if id == missing));
}

#[tokio::test]
async fn test_oversized_video_leaves_no_temp_file() {
    let h = Harness::new(FakeProber::with_dimensions(1920, 1080), FakeRemuxer::copying());
    let data = fixtures::mp4_bytes((1 << 20) + 1);

    let err = h
        .pipeline
        .ingest(h.request(data), MediaKind::Video)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        IngestError::Validation(ValidationError::FileTooLarge { .. })
    ));
    assert!(h.staging_is_empty());
    assert!(h.prober.probed_paths().is_empty());
    assert_eq!(h.storage.object_count(), 0);
    assert_eq!(h.stored_video().video_url, None);
}

#[tokio::test]
async fn test_declared_length_over_cap_fails_without_reading() {
    let h = Harness::new(FakeProber::with_dimensions(1920, 1080), FakeRemuxer::copying());
    let polled = Arc::new(AtomicBool::new(false));
    let request = UploadRequest {
        video_id: h.video.id,
        owner_id: h.owner_id,
        body: UploadBody::new(TrackingReader {
            polled: polled.clone(),
        })
        .with_declared_length(Some(512 * 1024)),
    };

    let err = h
        .pipeline
        .ingest(request, MediaKind::Thumbnail)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        IngestError::Validation(ValidationError::FileTooLarge { max }) if max == 256 * 1024
    ));
    assert!(!polled.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_sniffed_type_overrides_declared_type() {
    let h = Harness::new(FakeProber::with_dimensions(1920, 1080), FakeRemuxer::copying());
    let mut request = h.request(fixtures::pdf_bytes());
    request.body = request
        .body
        .with_content_type(Some("video/mp4".to_string()));

    let err = h
        .pipeline
        .ingest(request, MediaKind::Video)
        .await
        .unwrap_err();

    match err {
        IngestError::Validation(ValidationError::UnsupportedContentType {
            content_type, ..
        }) => assert_eq!(content_type, "application/pdf"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(h.staging_is_empty());
    assert!(h.prober.probed_paths().is_empty());
}

#[tokio::test]
async fn test_probe_failure_cleans_up() {
    let h = Harness::new(FakeProber::failing(), FakeRemuxer::copying());

    let err = h
        .pipeline
        .ingest(h.request(fixtures::mp4_bytes(4096)), MediaKind::Video)
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Probe(_)));
    assert_eq!(h.prober.probed_paths().len(), 1);
    assert!(h.staging_is_empty());
    assert!(h.remuxer.output_paths().is_empty());
    assert_eq!(h.storage.object_count(), 0);
}

#[tokio::test]
async fn test_transform_failure_cleans_up_both_files() {
    let h = Harness::new(FakeProber::with_dimensions(1920, 1080), FakeRemuxer::failing());

    let err = h
        .pipeline
        .ingest(h.request(fixtures::mp4_bytes(4096)), MediaKind::Video)
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Transform(_)));
    let outputs = h.remuxer.output_paths();
    assert_eq!(outputs.len(), 1);
    assert!(!outputs[0].exists());
    assert!(h.staging_is_empty());
    assert_eq!(h.storage.object_count(), 0);
}

#[tokio::test]
async fn test_remote_write_failure_keeps_previous_pointer() {
    let h = Harness::new(FakeProber::with_dimensions(1920, 1080), FakeRemuxer::copying());
    let mut existing = h.video.clone();
    existing.video_url = Some("https://cdn.example.com/landscape/old.mp4".to_string());
    h.videos.add_video(existing.clone());
    h.storage.set_fail_puts(true);

    let err = h
        .pipeline
        .ingest(h.request(fixtures::mp4_bytes(4096)), MediaKind::Video)
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::RemoteWrite(_)));
    assert_eq!(h.stored_video().video_url, existing.video_url);
    assert_eq!(h.videos.update_calls(), 0);
    assert!(h.staging_is_empty());
}

#[tokio::test]
async fn test_key_derivation_failure_aborts_before_storage() {
    let mut h = Harness::new(FakeProber::with_dimensions(1920, 1080), FakeRemuxer::copying());
    h.pipeline = h.pipeline.with_key_deriver(KeyDeriver::with_entropy(
        Arc::new(ExhaustedEntropy),
        KeyEncoding::Hex,
    ));

    let err = h
        .pipeline
        .ingest(h.request(fixtures::mp4_bytes(4096)), MediaKind::Video)
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::KeyDerivation(_)));
    assert_eq!(err.step(), "key_derivation");
    assert_eq!(h.storage.object_count(), 0);
    assert_eq!(h.videos.update_calls(), 0);
    assert_eq!(h.stored_video().video_url, None);

    let outputs = h.remuxer.output_paths();
    assert_eq!(outputs.len(), 1);
    assert!(!outputs[0].exists());
    assert!(h.staging_is_empty());

    let err = h
        .pipeline
        .ingest(h.request(fixtures::png_bytes()), MediaKind::Thumbnail)
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::KeyDerivation(_)));
    assert_eq!(h.storage.object_count(), 0);
    assert!(h.staging_is_empty());
}

#[tokio::test]
async fn test_commit_failure_reports_orphaned_key() {
    let h = Harness::new(FakeProber::with_dimensions(1080, 1920), FakeRemuxer::copying());
    h.videos.set_fail_updates(true);

    let err = h
        .pipeline
        .ingest(h.request(fixtures::mp4_bytes(4096)), MediaKind::Video)
        .await
        .unwrap_err();

    match err {
        IngestError::MetadataCommit {
            storage_key: Some(key),
            ..
        } => {
            assert!(key.starts_with("portrait/"));
            assert!(h.storage.has_object(&key));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(h.stored_video().video_url, None);
    assert!(h.staging_is_empty());
}

#[tokio::test]
async fn test_inline_thumbnail_skips_storage() {
    let h = Harness::with_settings(
        FakeProber::with_dimensions(1920, 1080),
        FakeRemuxer::copying(),
        |settings| {
            settings.thumbnail_delivery = ThumbnailDelivery::Inline;
            settings.inline_thumbnail_max_bytes = 1024;
        },
    );

    let video = h
        .pipeline
        .ingest(h.request(fixtures::png_bytes()), MediaKind::Thumbnail)
        .await
        .unwrap();

    let url = video.thumbnail_url.unwrap();
    assert!(url.starts_with("data:image/png;base64,iVBORw0KGgo"));
    assert_eq!(h.storage.object_count(), 0);
    assert!(h.staging_is_empty());

    // Too large to inline: falls back to object storage
    let video = h
        .pipeline
        .ingest(h.request(fixtures::jpeg_bytes(4096)), MediaKind::Thumbnail)
        .await
        .unwrap();
    assert!(video.thumbnail_url.unwrap().starts_with(MOCK_BASE_URL));
    assert_eq!(h.storage.object_count(), 1);
}

#[tokio::test]
async fn test_cancelled_upload_removes_staged_file() {
    let h = Harness::new(FakeProber::with_dimensions(1920, 1080), FakeRemuxer::copying());
    let request = UploadRequest {
        video_id: h.video.id,
        owner_id: h.owner_id,
        body: UploadBody::new(StallingReader {
            data: fixtures::mp4_bytes(8192),
            pos: 0,
        }),
    };

    let outcome = tokio::time::timeout(
        Duration::from_millis(100),
        h.pipeline.ingest(request, MediaKind::Video),
    )
    .await;

    assert!(outcome.is_err());
    assert!(h.staging_is_empty());
    assert_eq!(h.storage.object_count(), 0);
}

#[tokio::test]
async fn test_staging_dir_is_used() {
    let h = Harness::new(FakeProber::with_dimensions(1920, 1080), FakeRemuxer::copying());
    h.pipeline
        .ingest(h.request(fixtures::mp4_bytes(4096)), MediaKind::Video)
        .await
        .unwrap();

    let probed = h.prober.probed_paths();
    assert_eq!(probed.len(), 1);
    assert_eq!(probed[0].parent(), Some(h.staging.path()));
    assert!(probed[0]
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("tubely-upload-") && n.ends_with(".mp4")));
    assert!(!Path::new(&probed[0]).exists());
}
