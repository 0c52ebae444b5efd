//! Hooks for advisories raised by the storage layer
//!
//! The storage layer never fails an operation because usage is high or because
//! persisted content is unreadable; it reports those conditions through a
//! `StorageObserver` instead. Front ends implement this trait to surface the
//! advisory to the user.

/// Non-fatal conditions observed by the storage layer
#[derive(Debug, Clone, PartialEq)]
pub enum StorageAdvisory {
    /// Combined metadata and blob usage crossed the warning threshold
    QuotaWarning {
        usage_bytes: u64,
        threshold_bytes: u64,
        limit_bytes: u64,
    },
    /// A persisted document could not be parsed and was treated as empty
    PersistenceCorrupt { key: String, reason: String },
}

/// Receiver for storage advisories
pub trait StorageObserver: Send + Sync {
    fn on_advisory(&self, advisory: &StorageAdvisory);
}

/// No-op implementation for callers that only rely on logs
pub struct NoOpStorageObserver;

impl StorageObserver for NoOpStorageObserver {
    fn on_advisory(&self, _advisory: &StorageAdvisory) {}
}
