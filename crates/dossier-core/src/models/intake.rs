use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata of one uploaded file. The bytes live in the blob store under
/// `content_ref`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: Uuid,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub last_modified: DateTime<Utc>,
    pub uploaded_at: DateTime<Utc>,
    pub content_ref: String,
}

/// Upload folder under one owner
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub name: String,
    #[serde(default)]
    pub files: Vec<FileRecord>,
    #[serde(default)]
    pub submitted: bool,
}

/// Position of a folder in the submission state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderState {
    Empty,
    HasFiles,
    Submitted,
}

impl Folder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: Vec::new(),
            submitted: false,
        }
    }

    pub fn contains(&self, file_id: Uuid) -> bool {
        self.files.iter().any(|f| f.id == file_id)
    }

    /// Append a record unless one with the same id is already present.
    /// Returns whether the record was added.
    pub fn push_file(&mut self, record: FileRecord) -> bool {
        if self.contains(record.id) {
            return false;
        }
        self.files.push(record);
        true
    }

    pub fn remove_file(&mut self, file_id: Uuid) -> Option<FileRecord> {
        let idx = self.files.iter().position(|f| f.id == file_id)?;
        Some(self.files.remove(idx))
    }

    /// Empty the folder and make it accept uploads again
    pub fn reset(&mut self) {
        self.files.clear();
        self.submitted = false;
    }

    pub fn state(&self) -> FolderState {
        if self.submitted {
            FolderState::Submitted
        } else if self.files.is_empty() {
            FolderState::Empty
        } else {
            FolderState::HasFiles
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size_bytes).sum()
    }

    pub fn summary(&self, key: &str) -> FolderSummary {
        FolderSummary {
            key: key.to_string(),
            state: self.state(),
            file_count: self.files.len(),
            total_bytes: self.total_bytes(),
        }
    }
}

/// All folders of one owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeRoot {
    pub owner_id: String,
    #[serde(default)]
    pub folders: BTreeMap<String, Folder>,
}

impl IntakeRoot {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            folders: BTreeMap::new(),
        }
    }

    /// Folder for `key`, created empty if missing
    pub fn folder_entry(&mut self, key: &str) -> &mut Folder {
        self.folders
            .entry(key.to_string())
            .or_insert_with(|| Folder::new(key))
    }

    /// Every content reference held by this owner
    pub fn content_refs(&self) -> Vec<String> {
        self.folders
            .values()
            .flat_map(|f| f.files.iter().map(|r| r.content_ref.clone()))
            .collect()
    }
}

/// Whole metadata document: owner id -> intake root
pub type IntakeTree = BTreeMap<String, IntakeRoot>;

/// Folder listing entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FolderSummary {
    pub key: String,
    pub state: FolderState,
    pub file_count: usize,
    pub total_bytes: u64,
}
