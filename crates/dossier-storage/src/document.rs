//! Shared read path for whole JSON documents.

use crate::traits::{Storage, StorageResult};
use dossier_core::{StorageAdvisory, StorageObserver};
use serde::de::DeserializeOwned;

/// Load and parse the document under `key`.
///
/// A missing document yields `T::default()`. Unparsable content fails closed:
/// the default is returned, a warning is logged and the observer receives a
/// `PersistenceCorrupt` advisory. Backend I/O failures are still propagated.
pub(crate) async fn load_document<T>(
    storage: &dyn Storage,
    key: &str,
    observer: &dyn StorageObserver,
) -> StorageResult<T>
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = storage.get(key).await? else {
        return Ok(T::default());
    };

    match serde_json::from_str(&raw) {
        Ok(doc) => Ok(doc),
        Err(e) => {
            tracing::warn!(
                key = %key,
                error = %e,
                size_bytes = raw.len(),
                "Persisted document is corrupt, treating it as empty"
            );
            observer.on_advisory(&StorageAdvisory::PersistenceCorrupt {
                key: key.to_string(),
                reason: e.to_string(),
            });
            Ok(T::default())
        }
    }
}

/// Serialized size of the document under `key`, 0 if absent
pub(crate) async fn document_size(storage: &dyn Storage, key: &str) -> StorageResult<u64> {
    Ok(storage
        .get(key)
        .await?
        .map(|raw| raw.len() as u64)
        .unwrap_or(0))
}
