//! Test helpers: build the services over an isolated backend.
//!
//! Run from workspace root: `cargo test -p dossier-services`.

#![allow(dead_code)]

pub mod fixtures;
pub mod storage;

use std::sync::{Arc, Mutex};

use dossier_core::{Config, NoOpStorageObserver, StorageAdvisory, StorageObserver};
use dossier_services::Services;
use dossier_storage::{MemoryStorage, Storage};

pub const OWNER: &str = "PAN001";
pub const FOLDER: &str = "section1_kyc1";

/// Observer that keeps every advisory it receives
#[derive(Default)]
pub struct AdvisoryRecorder {
    advisories: Mutex<Vec<StorageAdvisory>>,
}

impl AdvisoryRecorder {
    pub fn all(&self) -> Vec<StorageAdvisory> {
        self.advisories.lock().unwrap().clone()
    }

    pub fn quota_warnings(&self) -> usize {
        self.all()
            .iter()
            .filter(|a| matches!(a, StorageAdvisory::QuotaWarning { .. }))
            .count()
    }

    pub fn corruptions(&self) -> Vec<String> {
        self.all()
            .into_iter()
            .filter_map(|a| match a {
                StorageAdvisory::PersistenceCorrupt { key, .. } => Some(key),
                _ => None,
            })
            .collect()
    }
}

impl StorageObserver for AdvisoryRecorder {
    fn on_advisory(&self, advisory: &StorageAdvisory) {
        self.advisories.lock().unwrap().push(advisory.clone());
    }
}

/// Services over an in-memory backend, with direct access to the backend
pub struct TestApp {
    pub services: Services,
    pub storage: Arc<MemoryStorage>,
    pub advisories: Arc<AdvisoryRecorder>,
}

impl TestApp {
    /// Raw persisted document under `key`
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.storage.get(key).await.unwrap()
    }
}

/// Setup services with the default limits and policies
pub fn setup_test_app() -> TestApp {
    setup_test_app_with(Config::default())
}

pub fn setup_test_app_with(config: Config) -> TestApp {
    setup_test_app_over(Arc::new(MemoryStorage::new()), config)
}

/// Setup services over an existing backend, e.g. one seeded with corrupt data
pub fn setup_test_app_over(storage: Arc<MemoryStorage>, config: Config) -> TestApp {
    let advisories = Arc::new(AdvisoryRecorder::default());
    let services = Services::build(storage.clone(), &config, advisories.clone());
    TestApp {
        services,
        storage,
        advisories,
    }
}

/// Services over any backend, advisories discarded
pub fn setup_services_over(storage: Arc<dyn Storage>, config: &Config) -> Services {
    Services::build(storage, config, Arc::new(NoOpStorageObserver))
}
