//! Data models for the application
//!
//! `intake` holds the raw upload tree (owner -> folder -> file records),
//! `review` the per-customer review ledger, and `folder_key` the composite
//! key that links the two.

mod folder_key;
mod intake;
mod review;

// Re-export all models for convenient imports
pub use folder_key::*;
pub use intake::*;
pub use review::*;
