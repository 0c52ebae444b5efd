//! Configuration module
//!
//! Environment-driven configuration for the storage backend, the quota limits
//! and the write policies of the intake engine.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::constants::{
    DEFAULT_PUBLIC_ORIGIN, MAX_FILE_SIZE_BYTES, MAX_TOTAL_STORAGE_BYTES, QUOTA_WARNING_RATIO,
};
use crate::storage_types::StorageBackend;

/// How mutations of the shared metadata document are serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteLockPolicy {
    /// No locking. Only safe for strictly sequential callers.
    None,
    /// One lock per owner id, queuing same-owner writers, then the
    /// store-wide commit lock.
    PerOwner,
    /// A single writer lock for the whole store.
    Store,
}

impl FromStr for WriteLockPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(WriteLockPolicy::None),
            "per_owner" | "per-owner" => Ok(WriteLockPolicy::PerOwner),
            "store" => Ok(WriteLockPolicy::Store),
            _ => Err(anyhow::anyhow!("Invalid write lock policy: {}", s)),
        }
    }
}

impl Display for WriteLockPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            WriteLockPolicy::None => write!(f, "none"),
            WriteLockPolicy::PerOwner => write!(f, "per_owner"),
            WriteLockPolicy::Store => write!(f, "store"),
        }
    }
}

/// Whether a submitted folder still accepts uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPolicy {
    /// Uploads into a submitted folder are rejected until the folder is reset.
    Lock,
    /// Uploads are appended to the submitted folder and picked up by the next sync.
    Append,
}

impl FromStr for SubmissionPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lock" => Ok(SubmissionPolicy::Lock),
            "append" => Ok(SubmissionPolicy::Append),
            _ => Err(anyhow::anyhow!("Invalid submission policy: {}", s)),
        }
    }
}

impl Display for SubmissionPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SubmissionPolicy::Lock => write!(f, "lock"),
            SubmissionPolicy::Append => write!(f, "append"),
        }
    }
}

/// Limits and policies consumed by the intake engine and the quota monitor.
#[derive(Clone, Debug)]
pub struct IntakeSettings {
    pub max_file_size_bytes: u64,
    pub max_total_storage_bytes: u64,
    pub quota_warning_ratio: f64,
    pub submission_policy: SubmissionPolicy,
    pub write_lock_policy: WriteLockPolicy,
}

impl Default for IntakeSettings {
    fn default() -> Self {
        Self {
            max_file_size_bytes: MAX_FILE_SIZE_BYTES,
            max_total_storage_bytes: MAX_TOTAL_STORAGE_BYTES,
            quota_warning_ratio: QUOTA_WARNING_RATIO,
            submission_policy: SubmissionPolicy::Lock,
            write_lock_policy: WriteLockPolicy::Store,
        }
    }
}

impl IntakeSettings {
    /// Usage in bytes above which the quota monitor raises an advisory.
    pub fn warning_threshold_bytes(&self) -> u64 {
        (self.max_total_storage_bytes as f64 * self.quota_warning_ratio) as u64
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub storage_backend: StorageBackend,
    pub storage_path: Option<String>,
    /// Origin used to build upload and reupload links
    pub public_origin: String,
    pub intake: IntakeSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            storage_backend: StorageBackend::Memory,
            storage_path: None,
            public_origin: DEFAULT_PUBLIC_ORIGIN.to_string(),
            intake: IntakeSettings::default(),
        }
    }
}

impl Config {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let storage_backend = env::var("DOSSIER_STORAGE_BACKEND")
            .unwrap_or_else(|_| StorageBackend::Memory.to_string())
            .parse::<StorageBackend>()?;

        let intake = IntakeSettings {
            max_file_size_bytes: env::var("MAX_FILE_SIZE_BYTES")
                .unwrap_or_else(|_| MAX_FILE_SIZE_BYTES.to_string())
                .parse()
                .unwrap_or(MAX_FILE_SIZE_BYTES),
            max_total_storage_bytes: env::var("MAX_TOTAL_STORAGE_BYTES")
                .unwrap_or_else(|_| MAX_TOTAL_STORAGE_BYTES.to_string())
                .parse()
                .unwrap_or(MAX_TOTAL_STORAGE_BYTES),
            quota_warning_ratio: env::var("QUOTA_WARNING_RATIO")
                .unwrap_or_else(|_| QUOTA_WARNING_RATIO.to_string())
                .parse()
                .unwrap_or(QUOTA_WARNING_RATIO),
            submission_policy: env::var("SUBMISSION_POLICY")
                .unwrap_or_else(|_| SubmissionPolicy::Lock.to_string())
                .parse()?,
            write_lock_policy: env::var("WRITE_LOCK_POLICY")
                .unwrap_or_else(|_| WriteLockPolicy::Store.to_string())
                .parse()?,
        };

        let config = Config {
            environment,
            storage_backend,
            storage_path: env::var("DOSSIER_STORAGE_PATH")
                .ok()
                .filter(|s| !s.is_empty()),
            public_origin: env::var("PUBLIC_ORIGIN")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_PUBLIC_ORIGIN.to_string()),
            intake,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.intake.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_BYTES must be greater than 0"));
        }

        if self.intake.max_file_size_bytes > self.intake.max_total_storage_bytes {
            return Err(anyhow::anyhow!(
                "MAX_FILE_SIZE_BYTES cannot exceed MAX_TOTAL_STORAGE_BYTES"
            ));
        }

        if !(self.intake.quota_warning_ratio > 0.0 && self.intake.quota_warning_ratio <= 1.0) {
            return Err(anyhow::anyhow!(
                "QUOTA_WARNING_RATIO must be in the range (0, 1]"
            ));
        }

        if !self.public_origin.starts_with("http://") && !self.public_origin.starts_with("https://")
        {
            return Err(anyhow::anyhow!("PUBLIC_ORIGIN must be an http(s) origin"));
        }

        if self.storage_backend == StorageBackend::Local && self.storage_path.is_none() {
            return Err(anyhow::anyhow!(
                "DOSSIER_STORAGE_PATH must be set when using local storage backend"
            ));
        }

        if self.is_production() && self.intake.write_lock_policy == WriteLockPolicy::None {
            return Err(anyhow::anyhow!(
                "WRITE_LOCK_POLICY cannot be 'none' in production"
            ));
        }

        Ok(())
    }

    pub fn storage_path(&self) -> Option<&str> {
        self.storage_path.as_deref()
    }

    /// Origin without a trailing slash
    pub fn public_origin(&self) -> &str {
        self.public_origin.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.intake.max_file_size_bytes, 2_097_152);
        assert_eq!(config.intake.warning_threshold_bytes(), 3_355_443);
    }

    #[test]
    fn test_local_backend_requires_path() {
        let config = Config {
            storage_backend: StorageBackend::Local,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_file_limit_above_total() {
        let mut config = Config::default();
        config.intake.max_file_size_bytes = config.intake.max_total_storage_bytes + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_production_requires_write_lock() {
        let mut config = Config {
            environment: "prod".to_string(),
            ..Config::default()
        };
        config.intake.write_lock_policy = WriteLockPolicy::None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            "per-owner".parse::<WriteLockPolicy>().unwrap(),
            WriteLockPolicy::PerOwner
        );
        assert_eq!(
            "APPEND".parse::<SubmissionPolicy>().unwrap(),
            SubmissionPolicy::Append
        );
        assert!("sometimes".parse::<SubmissionPolicy>().is_err());
    }

    #[test]
    fn test_public_origin_trims_slash() {
        let config = Config {
            public_origin: "https://intake.example.com/".to_string(),
            ..Config::default()
        };
        assert_eq!(config.public_origin(), "https://intake.example.com");
    }
}
