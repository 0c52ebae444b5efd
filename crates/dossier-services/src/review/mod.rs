//! Review ledger
//!
//! Customers, the documents they submitted and the review decision on each.

mod ledger;
mod links;

pub use ledger::{ReviewLedger, StatusChange};
pub use links::upload_link;
