//! Dossier Core Library
//!
//! This crate provides the domain models, error types, configuration and hook
//! traits shared by every Dossier component: the storage backends, the intake
//! engine, the review ledger and the synchronizer.

pub mod config;
pub mod constants;
pub mod error;
pub mod hooks;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, IntakeSettings, SubmissionPolicy, WriteLockPolicy};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use hooks::{NoOpStorageObserver, StorageAdvisory, StorageObserver};
pub use storage_types::StorageBackend;
