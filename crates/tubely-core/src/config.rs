//! Configuration module
//!
//! Environment-driven configuration for the API and the ingest pipeline:
//! server, database, authentication, storage, and media limits.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 8091;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MIN_JWT_SECRET_LEN: usize = 32;

/// How the random part of a storage key is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEncoding {
    /// 64 lowercase hex characters
    Hex,
    /// 43 URL-safe base64 characters, no padding
    Base64Url,
}

impl FromStr for KeyEncoding {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hex" => Ok(KeyEncoding::Hex),
            "base64url" | "base64" => Ok(KeyEncoding::Base64Url),
            _ => Err(anyhow::anyhow!("Invalid storage key encoding: {}", s)),
        }
    }
}

/// Where thumbnail pointers resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailDelivery {
    /// Thumbnails are written to the object store like videos
    Storage,
    /// Small thumbnails are embedded as `data:` URLs
    Inline,
}

impl FromStr for ThumbnailDelivery {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "storage" => Ok(ThumbnailDelivery::Storage),
            "inline" => Ok(ThumbnailDelivery::Inline),
            _ => Err(anyhow::anyhow!("Invalid thumbnail delivery: {}", s)),
        }
    }
}

/// Base configuration: server, database, auth.
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub environment: String,
}

/// Ingest pipeline configuration: storage and media handling.
#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub base: BaseConfig,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: String,
    pub s3_endpoint: Option<String>,
    pub s3_cf_distribution: Option<String>,
    pub local_storage_path: String,
    pub local_storage_base_url: String,
    pub key_encoding: KeyEncoding,
    // Media configuration
    pub max_video_size_bytes: u64,
    pub max_thumbnail_size_bytes: u64,
    pub staging_dir: PathBuf,
    pub ffprobe_path: String,
    pub ffmpeg_path: String,
    pub thumbnail_delivery: ThumbnailDelivery,
    pub inline_thumbnail_max_bytes: u64,
    // Optional time budgets; `None` means unbounded
    pub probe_timeout: Option<Duration>,
    pub remux_timeout: Option<Duration>,
    pub upload_timeout: Option<Duration>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<IngestConfig>);

impl Config {
    fn as_ingest(&self) -> &IngestConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.as_ingest().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = IngestConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_ingest().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_ingest().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_ingest().base.cors_origins
    }

    pub fn database_url(&self) -> &str {
        &self.as_ingest().base.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_ingest().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_ingest().base.db_timeout_seconds
    }

    pub fn jwt_secret(&self) -> &str {
        &self.as_ingest().base.jwt_secret
    }

    pub fn environment(&self) -> &str {
        &self.as_ingest().base.environment
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_ingest().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_ingest().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> &str {
        &self.as_ingest().s3_region
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_ingest().s3_endpoint.as_deref()
    }

    pub fn s3_cf_distribution(&self) -> Option<&str> {
        self.as_ingest().s3_cf_distribution.as_deref()
    }

    pub fn local_storage_path(&self) -> &str {
        &self.as_ingest().local_storage_path
    }

    pub fn local_storage_base_url(&self) -> &str {
        &self.as_ingest().local_storage_base_url
    }

    pub fn key_encoding(&self) -> KeyEncoding {
        self.as_ingest().key_encoding
    }

    pub fn max_video_size_bytes(&self) -> u64 {
        self.as_ingest().max_video_size_bytes
    }

    pub fn max_thumbnail_size_bytes(&self) -> u64 {
        self.as_ingest().max_thumbnail_size_bytes
    }

    pub fn staging_dir(&self) -> &PathBuf {
        &self.as_ingest().staging_dir
    }

    pub fn ffprobe_path(&self) -> &str {
        &self.as_ingest().ffprobe_path
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.as_ingest().ffmpeg_path
    }

    pub fn thumbnail_delivery(&self) -> ThumbnailDelivery {
        self.as_ingest().thumbnail_delivery
    }

    pub fn inline_thumbnail_max_bytes(&self) -> u64 {
        self.as_ingest().inline_thumbnail_max_bytes
    }

    pub fn probe_timeout(&self) -> Option<Duration> {
        self.as_ingest().probe_timeout
    }

    pub fn remux_timeout(&self) -> Option<Duration> {
        self.as_ingest().remux_timeout
    }

    pub fn upload_timeout(&self) -> Option<Duration> {
        self.as_ingest().upload_timeout
    }
}

/// Reads `<name>` as seconds; 0 or unset disables the budget.
fn timeout_from_env(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

impl IngestConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        const MAX_VIDEO_SIZE_MB: u64 = 1024;
        const MAX_THUMBNAIL_SIZE_MB: u64 = 10;
        const INLINE_THUMBNAIL_MAX_KB: u64 = 512;

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let server_port: u16 = env::var("SERVER_PORT")
            .or_else(|_| env::var("PORT"))
            .unwrap_or_else(|_| SERVER_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let base = BaseConfig {
            server_port,
            cors_origins,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            environment,
        };

        let storage_backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "s3".to_string())
            .parse::<StorageBackend>()?;

        let key_encoding = env::var("STORAGE_KEY_ENCODING")
            .unwrap_or_else(|_| "hex".to_string())
            .parse::<KeyEncoding>()?;

        let thumbnail_delivery = env::var("THUMBNAIL_DELIVERY")
            .unwrap_or_else(|_| "storage".to_string())
            .parse::<ThumbnailDelivery>()?;

        let config = IngestConfig {
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .unwrap_or_else(|_| "us-east-1".to_string()),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            s3_cf_distribution: env::var("S3_CF_DISTRIBUTION")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|_| "./assets".to_string()),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}/assets", base.server_port)),
            key_encoding,
            max_video_size_bytes: env::var("MAX_VIDEO_SIZE_MB")
                .unwrap_or_else(|_| MAX_VIDEO_SIZE_MB.to_string())
                .parse::<u64>()
                .unwrap_or(MAX_VIDEO_SIZE_MB)
                * 1024
                * 1024,
            max_thumbnail_size_bytes: env::var("MAX_THUMBNAIL_SIZE_MB")
                .unwrap_or_else(|_| MAX_THUMBNAIL_SIZE_MB.to_string())
                .parse::<u64>()
                .unwrap_or(MAX_THUMBNAIL_SIZE_MB)
                * 1024
                * 1024,
            staging_dir: env::var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir()),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            thumbnail_delivery,
            inline_thumbnail_max_bytes: env::var("INLINE_THUMBNAIL_MAX_KB")
                .unwrap_or_else(|_| INLINE_THUMBNAIL_MAX_KB.to_string())
                .parse::<u64>()
                .unwrap_or(INLINE_THUMBNAIL_MAX_KB)
                * 1024,
            probe_timeout: timeout_from_env("PROBE_TIMEOUT_SECS"),
            remux_timeout: timeout_from_env("REMUX_TIMEOUT_SECS"),
            upload_timeout: timeout_from_env("UPLOAD_TIMEOUT_SECS"),
            base,
        };

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LEN
            ));
        }

        if !(self.base.database_url.starts_with("postgres://")
            || self.base.database_url.starts_with("postgresql://"))
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.storage_backend == StorageBackend::S3 && self.s3_bucket.is_none() {
            return Err(anyhow::anyhow!(
                "S3_BUCKET must be set when using S3 storage backend"
            ));
        }

        if self.max_video_size_bytes == 0 || self.max_thumbnail_size_bytes == 0 {
            return Err(anyhow::anyhow!("Upload size limits must be greater than zero"));
        }

        if self.inline_thumbnail_max_bytes > self.max_thumbnail_size_bytes {
            return Err(anyhow::anyhow!(
                "INLINE_THUMBNAIL_MAX_KB cannot exceed MAX_THUMBNAIL_SIZE_MB"
            ));
        }

        Ok(())
    }
}
