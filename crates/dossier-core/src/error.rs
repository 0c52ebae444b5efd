//! Error types module
//!
//! All failures surfaced by the intake engine, the review ledger and the
//! synchronizer are unified under `AppError`. Only size and quota violations
//! are meant to reach the end user as rejected operations; absent owners,
//! folders and customers are absorbed as no-ops by the services and never
//! become an `AppError`.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like quota limits
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to a caller
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "FILE_TOO_LARGE")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same operation can succeed
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the end user
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("File too large: {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Storage full: {projected} bytes would exceed the {limit} byte quota")]
    StorageFull { projected: u64, limit: u64 },

    #[error("Folder already submitted: {0}")]
    FolderSubmitted(String),

    #[error("Upload cancelled")]
    Cancelled,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        AppError::FileTooLarge { .. } => (
            "FILE_TOO_LARGE",
            false,
            Some("Choose a smaller file"),
            LogLevel::Debug,
        ),
        AppError::StorageFull { .. } => (
            "STORAGE_FULL",
            false,
            Some("Remove some uploaded files to free space"),
            LogLevel::Warn,
        ),
        AppError::FolderSubmitted(_) => (
            "FOLDER_SUBMITTED",
            false,
            Some("Reset the folder before uploading again"),
            LogLevel::Debug,
        ),
        AppError::Cancelled => ("CANCELLED", true, None, LogLevel::Debug),
        AppError::NotFound(_) => (
            "NOT_FOUND",
            false,
            Some("Verify the identifier exists"),
            LogLevel::Debug,
        ),
        AppError::InvalidInput(_) => (
            "INVALID_INPUT",
            false,
            Some("Check the parameters and try again"),
            LogLevel::Debug,
        ),
        AppError::Storage(_) => (
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
        AppError::Internal(_) => (
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Whether this error must be shown to the user as a rejected operation
    /// that needs their action (a smaller file, freeing space).
    pub fn requires_user_action(&self) -> bool {
        matches!(
            self,
            AppError::FileTooLarge { .. } | AppError::StorageFull { .. }
        )
    }
}

impl ErrorMetadata for AppError {
    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::FileTooLarge { limit, .. } => {
                format!("File exceeds the maximum size of {} MB", limit / (1024 * 1024))
            }
            AppError::StorageFull { .. } => {
                "Storage is full. Remove some files and try again".to_string()
            }
            AppError::FolderSubmitted(ref folder) => {
                format!("Folder {} has already been submitted", folder)
            }
            AppError::Cancelled => "Upload cancelled".to_string(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::Internal(_) => "Internal error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_file_too_large() {
        let err = AppError::FileTooLarge {
            size: 3_145_728,
            limit: 2_097_152,
        };
        assert_eq!(err.error_code(), "FILE_TOO_LARGE");
        assert!(!err.is_recoverable());
        assert!(err.requires_user_action());
        assert_eq!(err.client_message(), "File exceeds the maximum size of 2 MB");
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_storage_full() {
        let err = AppError::StorageFull {
            projected: 5_000_000,
            limit: 4_194_304,
        };
        assert_eq!(err.error_code(), "STORAGE_FULL");
        assert!(err.requires_user_action());
        assert!(err.to_string().contains("5000000"));
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_error_metadata_suggested_actions() {
        let err1 = AppError::Storage("disk".to_string());
        assert_eq!(err1.suggested_action(), Some("Retry after a short delay"));
        assert!(err1.is_recoverable());
        assert!(!err1.requires_user_action());

        let err2 = AppError::NotFound("test".to_string());
        assert_eq!(err2.suggested_action(), Some("Verify the identifier exists"));

        assert_eq!(AppError::Cancelled.suggested_action(), None);
    }
}
