//! Service wiring: repositories, media tools and the ingest pipeline.

use anyhow::{Context, Result};
use sqlx::PgPool;
use std::sync::Arc;
use tubely_core::Config;
use tubely_db::{PgVideoRepository, VideoRepository};
use tubely_processing::{FfmpegRemuxer, FfprobeProber, IngestPipeline, IngestSettings};
use tubely_storage::Storage;

use crate::auth::JwtService;
use crate::state::AppState;

pub fn initialize_services(
    config: &Config,
    pool: PgPool,
    storage: Arc<dyn Storage>,
) -> Result<Arc<AppState>> {
    let videos: Arc<dyn VideoRepository> = Arc::new(PgVideoRepository::new(pool));

    let prober = FfprobeProber::new(config.ffprobe_path())
        .context("Invalid FFPROBE_PATH")?
        .with_timeout(config.probe_timeout());
    let remuxer = FfmpegRemuxer::new(config.ffmpeg_path())
        .context("Invalid FFMPEG_PATH")?
        .with_timeout(config.remux_timeout());

    let pipeline = IngestPipeline::new(
        videos.clone(),
        storage,
        Arc::new(prober),
        Arc::new(remuxer),
        IngestSettings::from_config(config),
    );

    tracing::info!(
        ffprobe_path = %config.ffprobe_path(),
        ffmpeg_path = %config.ffmpeg_path(),
        staging_dir = %config.staging_dir().display(),
        key_encoding = ?config.key_encoding(),
        "Ingest pipeline initialized"
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        jwt: JwtService::new(config.jwt_secret()),
        videos,
        pipeline: Arc::new(pipeline),
    }))
}
