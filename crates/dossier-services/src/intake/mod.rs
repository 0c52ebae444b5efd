//! Intake engine
//!
//! Upload pipeline: check size → read content → check folder → store blob →
//! persist metadata → measure quota

mod service;
mod source;
mod types;

pub use service::IntakeEngine;
pub use source::{FileSource, MemoryFile, PathFile};
pub use types::{FolderDocument, UploadBatch};
