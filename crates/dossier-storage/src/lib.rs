//! Dossier Storage Library
//!
//! This crate provides the persistence layer of the intake engine: a
//! whole-document key/value `Storage` trait with in-memory and local
//! filesystem backends, and the three stores built on top of it.
//!
//! # Persisted layout
//!
//! Every namespace is a single JSON document stored under a fixed key:
//!
//! - `dossier.intake.metadata`: owner id -> intake root (folders and file records)
//! - `dossier.intake.blobs`: file id -> base64 encoded content
//! - `dossier.review.customers`: the review ledger
//!
//! There is no partial-key update. Callers read the whole document, modify it
//! and write it back, so concurrent writers must be serialized by the caller.

pub mod blob;
pub mod customers;
pub(crate) mod document;
pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-memory")]
pub mod memory;
pub mod metadata;
pub mod quota;
pub mod traits;

// Re-export commonly used types
pub use blob::BlobStore;
pub use customers::CustomerStore;
pub use dossier_core::StorageBackend;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-memory")]
pub use memory::MemoryStorage;
pub use metadata::MetadataStore;
pub use quota::{QuotaMonitor, QuotaUsage};
pub use traits::{Storage, StorageError, StorageResult};
