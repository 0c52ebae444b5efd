use bytes::Bytes;
use dossier_core::models::FileRecord;
use dossier_core::AppError;

/// File record with its content, as returned to a display layer.
///
/// `content` is `None` when the blob is missing; the record is still listed.
#[derive(Debug, Clone)]
pub struct FolderDocument {
    pub record: FileRecord,
    pub content: Option<Bytes>,
}

impl FolderDocument {
    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }
}

/// Outcome of a multi-file upload. Uploads run in order and stop at the
/// first failure; `stored` holds everything written before it.
#[derive(Debug, Default)]
pub struct UploadBatch {
    pub stored: Vec<FileRecord>,
    pub error: Option<AppError>,
}

impl UploadBatch {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}
