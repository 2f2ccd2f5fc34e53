use async_trait::async_trait;
use tubely_core::{AppError, Video};
use uuid::Uuid;

/// Metadata store for videos.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    /// Load a video by id; `Ok(None)` when it does not exist.
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError>;

    /// Replace the stored record with `video` (matched by id) and return the
    /// persisted row. Fails with `NotFound` if the row has disappeared.
    async fn update_video(&self, video: &Video) -> Result<Video, AppError>;
}
