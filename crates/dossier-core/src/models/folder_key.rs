use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::constants::FOLDER_KEY_SEPARATOR;
use crate::AppError;

/// Composite folder key `"{section_id}_{document_type_id}"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FolderKey {
    pub section_id: String,
    pub document_type_id: String,
}

impl FolderKey {
    /// Build a key, rejecting parts that would not survive a round trip
    /// through `parse`.
    pub fn new(
        section_id: impl Into<String>,
        document_type_id: impl Into<String>,
    ) -> Result<Self, AppError> {
        let section_id = section_id.into();
        let document_type_id = document_type_id.into();

        if section_id.is_empty() || document_type_id.is_empty() {
            return Err(AppError::InvalidInput(
                "Folder key parts must not be empty".to_string(),
            ));
        }
        if !section_id.is_ascii() || !document_type_id.is_ascii() {
            return Err(AppError::InvalidInput(
                "Folder key parts must be ASCII".to_string(),
            ));
        }
        if section_id.contains(FOLDER_KEY_SEPARATOR)
            || document_type_id.contains(FOLDER_KEY_SEPARATOR)
        {
            return Err(AppError::InvalidInput(format!(
                "Folder key parts must not contain '{}'",
                FOLDER_KEY_SEPARATOR
            )));
        }

        Ok(Self {
            section_id,
            document_type_id,
        })
    }

    /// Split a stored key on the first separator. Returns `None` when the key
    /// has no separator or either side is empty.
    pub fn parse(key: &str) -> Option<Self> {
        let (section_id, document_type_id) = key.split_once(FOLDER_KEY_SEPARATOR)?;
        if section_id.is_empty() || document_type_id.is_empty() {
            return None;
        }
        Some(Self {
            section_id: section_id.to_string(),
            document_type_id: document_type_id.to_string(),
        })
    }
}

impl Display for FolderKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{}{}{}",
            self.section_id, FOLDER_KEY_SEPARATOR, self.document_type_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_on_first_separator() {
        let key = FolderKey::parse("section1_kyc1").unwrap();
        assert_eq!(key.section_id, "section1");
        assert_eq!(key.document_type_id, "kyc1");

        let key = FolderKey::parse("income_salary_slip").unwrap();
        assert_eq!(key.section_id, "income");
        assert_eq!(key.document_type_id, "salary_slip");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(FolderKey::parse("nosep").is_none());
        assert!(FolderKey::parse("_kyc").is_none());
        assert!(FolderKey::parse("section_").is_none());
    }

    #[test]
    fn test_new_rejects_separator_in_document_type() {
        assert!(FolderKey::new("section1", "salary_slip").is_err());
        assert!(FolderKey::new("", "kyc").is_err());
        assert_eq!(
            FolderKey::new("section1", "kyc1").unwrap().to_string(),
            "section1_kyc1"
        );
    }
}
