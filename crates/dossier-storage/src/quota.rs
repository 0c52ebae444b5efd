//! Combined storage footprint and the early-warning advisory.
//!
//! The monitor never rejects anything; the hard ceiling lives in
//! `BlobStore::put`.

use std::sync::Arc;

use dossier_core::{IntakeSettings, NoOpStorageObserver, StorageAdvisory, StorageObserver};
use serde::Serialize;

use crate::blob::BlobStore;
use crate::metadata::MetadataStore;
use crate::traits::StorageResult;

/// Snapshot of the persisted footprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaUsage {
    pub metadata_bytes: u64,
    pub blob_bytes: u64,
    pub total_bytes: u64,
    pub limit_bytes: u64,
    pub warning_threshold_bytes: u64,
}

impl QuotaUsage {
    pub fn is_over_warning(&self) -> bool {
        self.total_bytes > self.warning_threshold_bytes
    }

    pub fn percent_used(&self) -> f64 {
        if self.limit_bytes == 0 {
            return 0.0;
        }
        self.total_bytes as f64 * 100.0 / self.limit_bytes as f64
    }
}

#[derive(Clone)]
pub struct QuotaMonitor {
    metadata: MetadataStore,
    blobs: BlobStore,
    limit_bytes: u64,
    warning_threshold_bytes: u64,
    observer: Arc<dyn StorageObserver>,
}

impl QuotaMonitor {
    pub fn new(metadata: MetadataStore, blobs: BlobStore, settings: &IntakeSettings) -> Self {
        Self {
            metadata,
            blobs,
            limit_bytes: settings.max_total_storage_bytes,
            warning_threshold_bytes: settings.warning_threshold_bytes(),
            observer: Arc::new(NoOpStorageObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn StorageObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Current footprint without raising advisories
    pub async fn usage(&self) -> StorageResult<QuotaUsage> {
        let metadata_bytes = self.metadata.usage_bytes().await?;
        let blob_bytes = self.blobs.usage_bytes().await?;
        Ok(QuotaUsage {
            metadata_bytes,
            blob_bytes,
            total_bytes: metadata_bytes + blob_bytes,
            limit_bytes: self.limit_bytes,
            warning_threshold_bytes: self.warning_threshold_bytes,
        })
    }

    /// Measure the footprint and raise a warning advisory when it is above
    /// the threshold. Called after every metadata mutation.
    pub async fn check(&self) -> StorageResult<QuotaUsage> {
        let usage = self.usage().await?;

        if usage.is_over_warning() {
            tracing::warn!(
                usage_bytes = usage.total_bytes,
                threshold_bytes = usage.warning_threshold_bytes,
                limit_bytes = usage.limit_bytes,
                percent_used = usage.percent_used(),
                "Storage usage is approaching the quota"
            );
            self.observer.on_advisory(&StorageAdvisory::QuotaWarning {
                usage_bytes: usage.total_bytes,
                threshold_bytes: usage.warning_threshold_bytes,
                limit_bytes: usage.limit_bytes,
            });
        }

        Ok(usage)
    }
}
