//! Folder tree persistence
//!
//! The whole owner -> intake root map is one document. There is no partial
//! update API: callers `load_all`, mutate, then `save_all`.

use std::sync::Arc;

use dossier_core::constants::METADATA_DOCUMENT_KEY;
use dossier_core::models::IntakeTree;
use dossier_core::{NoOpStorageObserver, StorageObserver};

use crate::document::{document_size, load_document};
use crate::traits::{Storage, StorageResult};

#[derive(Clone)]
pub struct MetadataStore {
    storage: Arc<dyn Storage>,
    observer: Arc<dyn StorageObserver>,
}

impl MetadataStore {
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

    /// Load every owner's folder tree. Corrupt content yields an empty map.
    pub async fn load_all(&self) -> StorageResult<IntakeTree> {
        load_document(
            self.storage.as_ref(),
            METADATA_DOCUMENT_KEY,
            self.observer.as_ref(),
        )
        .await
    }

    pub async fn save_all(&self, tree: &IntakeTree) -> StorageResult<()> {
        let serialized = serde_json::to_string(tree)?;
        tracing::debug!(
            owners = tree.len(),
            size_bytes = serialized.len(),
            "Saving intake metadata"
        );
        self.storage.put(METADATA_DOCUMENT_KEY, serialized).await
    }

    /// Serialized size of the metadata document
    pub async fn usage_bytes(&self) -> StorageResult<u64> {
        document_size(self.storage.as_ref(), METADATA_DOCUMENT_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStorage;
    use dossier_core::models::IntakeRoot;

    #[tokio::test]
    async fn test_load_all_empty_when_absent() {
        let store = MetadataStore::new(Arc::new(MemoryStorage::new()));
        assert!(store.load_all().await.unwrap().is_empty());
        assert_eq!(store.usage_bytes().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = MetadataStore::new(Arc::new(MemoryStorage::new()));
        let mut tree = IntakeTree::new();
        let mut root = IntakeRoot::new("PAN001");
        root.folder_entry("section1_kyc1").submitted = true;
        tree.insert("PAN001".to_string(), root);

        store.save_all(&tree).await.unwrap();
        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded, tree);
        assert!(store.usage_bytes().await.unwrap() > 0);
    }

    #[tokio::test]
    async fn test_corrupt_metadata_fails_closed() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .put(METADATA_DOCUMENT_KEY, "[1, 2".to_string())
            .await
            .unwrap();
        let store = MetadataStore::new(storage);
        assert!(store.load_all().await.unwrap().is_empty());
    }
}
