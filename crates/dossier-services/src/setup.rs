//! Service initialization

use std::sync::Arc;

use anyhow::{Context, Result};
use dossier_core::{Config, NoOpStorageObserver, StorageObserver};
use dossier_storage::{
    create_storage, BlobStore, CustomerStore, MetadataStore, QuotaMonitor, Storage,
};

use crate::intake::IntakeEngine;
use crate::review::ReviewLedger;
use crate::sync::Synchronizer;

/// The three services sharing one storage backend
#[derive(Clone)]
pub struct Services {
    pub intake: IntakeEngine,
    pub ledger: ReviewLedger,
    pub synchronizer: Synchronizer,
}

impl Services {
    /// Wire every store and service over `storage`. Advisories from all
    /// stores go to `observer`.
    pub fn build(
        storage: Arc<dyn Storage>,
        config: &Config,
        observer: Arc<dyn StorageObserver>,
    ) -> Self {
        let settings = config.intake.clone();

        let blobs = BlobStore::new(storage.clone(), settings.max_total_storage_bytes)
            .with_observer(observer.clone());
        let metadata = MetadataStore::new(storage.clone()).with_observer(observer.clone());
        let monitor = QuotaMonitor::new(metadata.clone(), blobs.clone(), &settings)
            .with_observer(observer.clone());
        let customers = CustomerStore::new(storage).with_observer(observer);

        let intake = IntakeEngine::new(blobs, metadata, monitor, settings);
        let ledger = ReviewLedger::new(customers, config.public_origin());
        let synchronizer = Synchronizer::new(intake.clone(), ledger.clone());

        Self {
            intake,
            ledger,
            synchronizer,
        }
    }

    /// Create the configured storage backend and wire the services over it
    pub async fn from_config(config: &Config) -> Result<Self> {
        let storage = create_storage(config)
            .await
            .context("Failed to create storage backend")?;

        tracing::info!(
            backend = %storage.backend_type(),
            submission_policy = %config.intake.submission_policy,
            write_lock_policy = %config.intake.write_lock_policy,
            max_file_size_bytes = config.intake.max_file_size_bytes,
            max_total_storage_bytes = config.intake.max_total_storage_bytes,
            "Services initialized"
        );

        Ok(Self::build(storage, config, Arc::new(NoOpStorageObserver)))
    }
}
