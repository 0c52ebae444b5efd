//! Dossier Services Library
//!
//! Business services of the document intake workflow:
//! - Intake engine (upload, removal, folder submission and reset)
//! - Review ledger (customers and document review decisions)
//! - Synchronizer (promotes submitted uploads into the review ledger)
//! - Write locks, view handles and telemetry initialization

pub mod intake;
pub mod locks;
pub mod review;
pub mod setup;
pub mod sync;
pub mod telemetry;
pub mod view;

// Re-export commonly used types
pub use intake::{FileSource, FolderDocument, IntakeEngine, MemoryFile, PathFile, UploadBatch};
pub use locks::{OwnerLocks, WriteGuard};
pub use review::{upload_link, ReviewLedger, StatusChange};
pub use setup::Services;
pub use sync::{SyncOutcome, Synchronizer};
pub use telemetry::init_telemetry;
pub use view::{ViewHandle, ViewRegistry};
