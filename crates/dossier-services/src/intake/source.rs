use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

/// A file offered for upload.
///
/// Descriptive fields are available up front so size limits can be enforced
/// before any content is read. `read` is the only suspension point of an
/// upload.
#[async_trait]
pub trait FileSource: Send + Sync {
    fn name(&self) -> &str;

    fn mime_type(&self) -> &str;

    /// Size announced by the source, in bytes
    fn size(&self) -> u64;

    fn last_modified(&self) -> DateTime<Utc>;

    /// Read the full content into memory
    async fn read(&self) -> std::io::Result<Bytes>;
}

/// File whose content is already in memory
#[derive(Debug, Clone)]
pub struct MemoryFile {
    name: String,
    mime_type: String,
    data: Bytes,
    last_modified: DateTime<Utc>,
}

impl MemoryFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
            last_modified: Utc::now(),
        }
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = last_modified;
        self
    }
}

#[async_trait]
impl FileSource for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    async fn read(&self) -> std::io::Result<Bytes> {
        Ok(self.data.clone())
    }
}

/// File on the local filesystem, read lazily
#[derive(Debug, Clone)]
pub struct PathFile {
    path: PathBuf,
    name: String,
    mime_type: String,
    size: u64,
    last_modified: DateTime<Utc>,
}

impl PathFile {
    /// Stat `path` and capture its name, size and modification time
    pub async fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let meta = tokio::fs::metadata(&path).await?;
        if !meta.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let last_modified = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(Self {
            mime_type: mime_type_for(&path).to_string(),
            name,
            size: meta.len(),
            last_modified,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FileSource for PathFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    async fn read(&self) -> std::io::Result<Bytes> {
        tokio::fs::read(&self.path).await.map(Bytes::from)
    }
}

/// MIME type from the file extension, for the formats the intake UI accepts
fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}
