//! Synchronizer
//!
//! Promotes the files of submitted intake folders into the review ledger.

mod synchronizer;

pub use synchronizer::{SyncOutcome, Synchronizer};
