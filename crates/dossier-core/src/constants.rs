//! Quota constants and persisted key names.

/// Largest single file accepted by the intake engine (2 MiB).
pub const MAX_FILE_SIZE_BYTES: u64 = 2_097_152;

/// Aggregate ceiling for the serialized blob document (4 MiB).
pub const MAX_TOTAL_STORAGE_BYTES: u64 = 4_194_304;

/// Fraction of the aggregate quota above which a usage advisory fires.
pub const QUOTA_WARNING_RATIO: f64 = 0.8;

/// Separator between section id and document type id in a folder key.
pub const FOLDER_KEY_SEPARATOR: char = '_';

pub const METADATA_DOCUMENT_KEY: &str = "dossier.intake.metadata";
pub const BLOB_DOCUMENT_KEY: &str = "dossier.intake.blobs";
pub const CUSTOMERS_DOCUMENT_KEY: &str = "dossier.review.customers";

/// Prefix of customer ids minted by the review ledger.
pub const CUSTOMER_ID_PREFIX: &str = "CUST";

pub const DEFAULT_PUBLIC_ORIGIN: &str = "http://localhost:3000";
