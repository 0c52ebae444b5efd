//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Quota exceeded: {projected} bytes would exceed the {limit} byte limit")]
    QuotaExceeded { projected: u64, limit: u64 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Whole-document key/value storage
///
/// Each key holds one serialized document. Backends never interpret the
/// content; the blob, metadata and review stores own the document formats.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read the document stored under `key`, `None` if absent
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replace the document stored under `key`
    async fn put(&self, key: &str, value: String) -> StorageResult<()>;

    /// Delete the document stored under `key`. Deleting a missing key succeeds.
    async fn remove(&self, key: &str) -> StorageResult<()>;

    /// Check if a document exists
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

impl From<StorageError> for dossier_core::AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::QuotaExceeded { projected, limit } => {
                dossier_core::AppError::StorageFull { projected, limit }
            }
            other => dossier_core::AppError::Storage(other.to_string()),
        }
    }
}
