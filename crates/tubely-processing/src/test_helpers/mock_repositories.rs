//! Mock video repository for testing without database

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tubely_core::{AppError, Video};
use tubely_db::VideoRepository;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct MockVideoRepository {
    videos: Arc<Mutex<HashMap<Uuid, Video>>>,
    fail_updates: Arc<AtomicBool>,
    update_calls: Arc<AtomicUsize>,
}

impl MockVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_video(&self, video: Video) {
        self.videos.lock().unwrap().insert(video.id, video);
    }

    pub fn video(&self, id: Uuid) -> Option<Video> {
        self.videos.lock().unwrap().get(&id).cloned()
    }

    /// Make every subsequent `update_video` fail.
    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoRepository for MockVideoRepository {
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        Ok(self.video(id))
    }

    async fn update_video(&self, video: &Video) -> Result<Video, AppError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(AppError::Internal("simulated database outage".to_string()));
        }

        let mut videos = self.videos.lock().unwrap();
        if !videos.contains_key(&video.id) {
            return Err(AppError::NotFound(format!("Video {} not found", video.id)));
        }
        let mut updated = video.clone();
        updated.updated_at = chrono::Utc::now();
        videos.insert(updated.id, updated.clone());
        Ok(updated)
    }
}
