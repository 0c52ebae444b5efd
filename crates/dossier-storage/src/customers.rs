//! Review ledger persistence: the list of customers as one document.

use std::sync::Arc;

use dossier_core::constants::CUSTOMERS_DOCUMENT_KEY;
use dossier_core::models::Customer;
use dossier_core::{NoOpStorageObserver, StorageObserver};

use crate::document::load_document;
use crate::traits::{Storage, StorageResult};

#[derive(Clone)]
pub struct CustomerStore {
    storage: Arc<dyn Storage>,
    observer: Arc<dyn StorageObserver>,
}

impl CustomerStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            observer: Arc::new(NoOpStorageObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn StorageObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Corrupt content yields an empty list.
    pub async fn load_all(&self) -> StorageResult<Vec<Customer>> {
        load_document(
            self.storage.as_ref(),
            CUSTOMERS_DOCUMENT_KEY,
            self.observer.as_ref(),
        )
        .await
    }

    pub async fn save_all(&self, customers: &[Customer]) -> StorageResult<()> {
        self.storage
            .put(CUSTOMERS_DOCUMENT_KEY, serde_json::to_string(customers)?)
            .await
    }
}
