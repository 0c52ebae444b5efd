//! Raw file content, keyed by file id
//!
//! All blobs share one JSON document (`file id -> base64`). The aggregate
//! quota applies to the serialized size of that document, so it accounts for
//! the encoding overhead exactly as persisted.

use std::collections::BTreeMap;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use dossier_core::constants::BLOB_DOCUMENT_KEY;
use dossier_core::{NoOpStorageObserver, StorageObserver};

use crate::document::{document_size, load_document};
use crate::traits::{Storage, StorageError, StorageResult};

type BlobDocument = BTreeMap<String, String>;

#[derive(Clone)]
pub struct BlobStore {
    storage: Arc<dyn Storage>,
    limit_bytes: u64,
    observer: Arc<dyn StorageObserver>,
}

impl BlobStore {
    pub fn new(storage: Arc<dyn Storage>, limit_bytes: u64) -> Self {
        Self {
            storage,
            limit_bytes,
            observer: Arc::new(NoOpStorageObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn StorageObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn limit_bytes(&self) -> u64 {
        self.limit_bytes
    }

    async fn load(&self) -> StorageResult<BlobDocument> {
        load_document(self.storage.as_ref(), BLOB_DOCUMENT_KEY, self.observer.as_ref()).await
    }

    /// Store `bytes` under `id`, replacing any previous content.
    ///
    /// Fails with `QuotaExceeded` without writing anything when the blob
    /// document would grow past the aggregate limit.
    pub async fn put(&self, id: &str, bytes: &[u8]) -> StorageResult<()> {
        let mut blobs = self.load().await?;
        blobs.insert(id.to_string(), STANDARD.encode(bytes));

        let serialized = serde_json::to_string(&blobs)?;
        let projected = serialized.len() as u64;
        if projected > self.limit_bytes {
            tracing::warn!(
                blob_id = %id,
                size_bytes = bytes.len(),
                projected_bytes = projected,
                limit_bytes = self.limit_bytes,
                "Blob write refused, aggregate quota would be exceeded"
            );
            return Err(StorageError::QuotaExceeded {
                projected,
                limit: self.limit_bytes,
            });
        }

        self.storage.put(BLOB_DOCUMENT_KEY, serialized).await?;

        tracing::debug!(
            blob_id = %id,
            size_bytes = bytes.len(),
            document_bytes = projected,
            "Blob stored"
        );
        Ok(())
    }

    /// Content stored under `id`. An entry that is not valid base64 is
    /// reported as missing.
    pub async fn get(&self, id: &str) -> StorageResult<Option<Bytes>> {
        let blobs = self.load().await?;
        let Some(encoded) = blobs.get(id) else {
            return Ok(None);
        };

        match STANDARD.decode(encoded) {
            Ok(raw) => Ok(Some(Bytes::from(raw))),
            Err(e) => {
                tracing::warn!(blob_id = %id, error = %e, "Blob content is not valid base64");
                Ok(None)
            }
        }
    }

    /// Content for several ids with a single document read. Missing or
    /// undecodable entries map to `None`, in input order.
    pub async fn get_many(&self, ids: &[String]) -> StorageResult<Vec<Option<Bytes>>> {
        let blobs = self.load().await?;
        Ok(ids
            .iter()
            .map(|id| {
                blobs
                    .get(id)
                    .and_then(|encoded| STANDARD.decode(encoded).ok())
                    .map(Bytes::from)
            })
            .collect())
    }

    pub async fn contains(&self, id: &str) -> StorageResult<bool> {
        Ok(self.load().await?.contains_key(id))
    }

    /// Remove the content of `id`. Removing a missing id succeeds.
    pub async fn remove(&self, id: &str) -> StorageResult<()> {
        self.remove_many(&[id.to_string()]).await?;
        Ok(())
    }

    /// Remove several blobs with a single document write. Returns how many
    /// entries actually existed.
    pub async fn remove_many(&self, ids: &[String]) -> StorageResult<usize> {
        let mut blobs = self.load().await?;
        let removed = ids.iter().filter(|id| blobs.remove(*id).is_some()).count();

        if removed > 0 {
            self.storage
                .put(BLOB_DOCUMENT_KEY, serde_json::to_string(&blobs)?)
                .await?;
            tracing::debug!(removed, "Blobs removed");
        }

        Ok(removed)
    }

    /// Serialized size of the blob document
    pub async fn usage_bytes(&self) -> StorageResult<u64> {
        document_size(self.storage.as_ref(), BLOB_DOCUMENT_KEY).await
    }
}
