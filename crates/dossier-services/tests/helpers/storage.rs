use std::time::Duration;

use async_trait::async_trait;
use dossier_core::{Config, StorageBackend};
use dossier_storage::{MemoryStorage, Storage, StorageResult};
use tempfile::TempDir;

/// Local-storage configuration rooted in a temporary directory
pub struct TestStorage {
    pub temp_dir: TempDir,
}

impl TestStorage {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        Self { temp_dir }
    }

    pub fn base_path_str(&self) -> String {
        self.temp_dir.path().to_string_lossy().to_string()
    }

    pub fn config(&self) -> Config {
        Config {
            storage_backend: StorageBackend::Local,
            storage_path: Some(self.base_path_str()),
            ..Config::default()
        }
    }
}

impl Default for TestStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// Memory backend that sleeps before every operation, so concurrent
/// read-modify-write sequences interleave at every storage call
pub struct DelayedStorage {
    pub inner: MemoryStorage,
    delay: Duration,
    slow_put: Option<(String, Duration)>,
}

impl DelayedStorage {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryStorage::new(),
            delay,
            slow_put: None,
        }
    }

    /// Writes of `key` take `delay` instead
    pub fn with_slow_put(mut self, key: &str, delay: Duration) -> Self {
        self.slow_put = Some((key.to_string(), delay));
        self
    }
}

#[async_trait]
impl Storage for DelayedStorage {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        tokio::time::sleep(self.delay).await;
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: String) -> StorageResult<()> {
        let delay = match &self.slow_put {
            Some((slow, delay)) if slow == key => *delay,
            _ => self.delay,
        };
        tokio::time::sleep(delay).await;
        self.inner.put(key, value).await
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.remove(key).await
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }
}
