//! In-memory storage backend

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tubely_storage::{Storage, StorageBackend, StorageError, StorageKey, StorageResult, StoredObject};

pub const MOCK_BASE_URL: &str = "https://mock-storage.test";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Mock storage keeping objects in a shared map.
#[derive(Clone, Default)]
pub struct MockStorage {
    objects: Arc<Mutex<HashMap<String, MockObject>>>,
    sources: Arc<Mutex<Vec<PathBuf>>>,
    fail_puts: Arc<AtomicBool>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put_object` fail.
    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn get(&self, key: &str) -> Option<MockObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn has_object(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// Local paths that `put_object` was asked to upload, in call order.
    pub fn uploaded_sources(&self) -> Vec<PathBuf> {
        self.sources.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn put_object(
        &self,
        key: &StorageKey,
        content_type: &str,
        source: &Path,
    ) -> StorageResult<StoredObject> {
        self.sources.lock().unwrap().push(source.to_path_buf());

        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed(
                "simulated storage outage".to_string(),
            ));
        }

        let data = tokio::fs::read(source).await?;
        let size_bytes = data.len() as u64;
        self.objects.lock().unwrap().insert(
            key.to_string(),
            MockObject {
                data,
                content_type: content_type.to_string(),
            },
        );

        Ok(StoredObject {
            key: key.clone(),
            url: format!("{}/{}", MOCK_BASE_URL, key),
            size_bytes,
            e_tag: None,
        })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
