use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::time::Duration;

use tubely_core::{Config, KeyEncoding, ThumbnailDelivery, Video};
use tubely_storage::PublicUrlFormat;
use uuid::Uuid;

const DEFAULT_MAX_VIDEO_BYTES: u64 = 1 << 30;
const DEFAULT_MAX_THUMBNAIL_BYTES: u64 = 10 << 20;
const DEFAULT_INLINE_THUMBNAIL_BYTES: u64 = 512 << 10;

/// Raw upload body plus what the client claimed about it.
///
/// `declared_content_type` is only compared against the sniffed type for
/// logging. `declared_length` lets oversized bodies fail before any read.
pub struct UploadBody<R> {
    pub reader: R,
    pub declared_content_type: Option<String>,
    pub declared_length: Option<u64>,
}

impl<R> UploadBody<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            declared_content_type: None,
            declared_length: None,
        }
    }

    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        self.declared_content_type = content_type;
        self
    }

    pub fn with_declared_length(mut self, length: Option<u64>) -> Self {
        self.declared_length = length;
        self
    }
}

pub struct UploadRequest<R> {
    pub video_id: Uuid,
    pub owner_id: Uuid,
    pub body: UploadBody<R>,
}

/// A video the requester has been verified to own.
///
/// Only [`IngestPipeline::authorize`](super::IngestPipeline::authorize)
/// constructs this, so holding one proves the ownership check ran.
#[derive(Debug, Clone)]
pub struct AuthorizedUpload {
    video: Video,
}

impl AuthorizedUpload {
    pub(crate) fn new(video: Video) -> Self {
        Self { video }
    }

    pub fn video(&self) -> &Video {
        &self.video
    }

    pub(crate) fn into_video(self) -> Video {
        self.video
    }
}

/// Progress of a single upload, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestStage {
    Received,
    Authorized,
    Staged,
    Probed,
    Transformed,
    KeyDerived,
    Stored,
    Committed,
}

impl Display for IngestStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            IngestStage::Received => "received",
            IngestStage::Authorized => "authorized",
            IngestStage::Staged => "staged",
            IngestStage::Probed => "probed",
            IngestStage::Transformed => "transformed",
            IngestStage::KeyDerived => "key_derived",
            IngestStage::Stored => "stored",
            IngestStage::Committed => "committed",
        };
        write!(f, "{}", name)
    }
}

/// Runtime settings for [`IngestPipeline`](super::IngestPipeline).
#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub max_video_bytes: u64,
    pub max_thumbnail_bytes: u64,
    pub staging_dir: PathBuf,
    pub key_encoding: KeyEncoding,
    pub url_format: PublicUrlFormat,
    pub thumbnail_delivery: ThumbnailDelivery,
    pub inline_thumbnail_max_bytes: u64,
    pub upload_timeout: Option<Duration>,
}

impl IngestSettings {
    pub fn new(staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            max_video_bytes: DEFAULT_MAX_VIDEO_BYTES,
            max_thumbnail_bytes: DEFAULT_MAX_THUMBNAIL_BYTES,
            staging_dir: staging_dir.into(),
            key_encoding: KeyEncoding::Hex,
            url_format: PublicUrlFormat::Direct,
            thumbnail_delivery: ThumbnailDelivery::Storage,
            inline_thumbnail_max_bytes: DEFAULT_INLINE_THUMBNAIL_BYTES,
            upload_timeout: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            max_video_bytes: config.max_video_size_bytes(),
            max_thumbnail_bytes: config.max_thumbnail_size_bytes(),
            staging_dir: config.staging_dir().clone(),
            key_encoding: config.key_encoding(),
            url_format: PublicUrlFormat::from_distribution(config.s3_cf_distribution()),
            thumbnail_delivery: config.thumbnail_delivery(),
            inline_thumbnail_max_bytes: config.inline_thumbnail_max_bytes(),
            upload_timeout: config.upload_timeout(),
        }
    }
}
