//! Test fixtures: upload sources of a given size or behaviour.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dossier_services::{FileSource, MemoryFile};

pub const KB: usize = 1024;
pub const MB: usize = 1024 * 1024;

/// PDF-looking content of exactly `size` bytes
pub fn pdf_bytes(size: usize) -> Vec<u8> {
    let mut data = b"%PDF-1.4\n".to_vec();
    data.resize(size.max(data.len()), b'0');
    data.truncate(size);
    data
}

pub fn pdf(name: &str, size: usize) -> MemoryFile {
    MemoryFile::new(name, "application/pdf", pdf_bytes(size))
}

/// Source whose read never completes
pub struct StalledFile {
    pub name: String,
    pub size: u64,
}

impl StalledFile {
    pub fn new(name: &str, size: u64) -> Self {
        Self {
            name: name.to_string(),
            size,
        }
    }
}

#[async_trait]
impl FileSource for StalledFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> &str {
        "application/pdf"
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn last_modified(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn read(&self) -> std::io::Result<Bytes> {
        std::future::pending().await
    }
}

/// Source that takes `delay` to read, so concurrent uploads interleave
pub struct SlowFile {
    pub inner: MemoryFile,
    pub delay: Duration,
}

impl SlowFile {
    pub fn new(name: &str, size: usize, delay: Duration) -> Self {
        Self {
            inner: pdf(name, size),
            delay,
        }
    }
}

#[async_trait]
impl FileSource for SlowFile {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn mime_type(&self) -> &str {
        self.inner.mime_type()
    }

    fn size(&self) -> u64 {
        self.inner.size()
    }

    fn last_modified(&self) -> DateTime<Utc> {
        self.inner.last_modified()
    }

    async fn read(&self) -> std::io::Result<Bytes> {
        tokio::time::sleep(self.delay).await;
        self.inner.read().await
    }
}

/// Source that announces less than it delivers
pub struct LyingFile {
    pub inner: MemoryFile,
}

#[async_trait]
impl FileSource for LyingFile {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn mime_type(&self) -> &str {
        self.inner.mime_type()
    }

    fn size(&self) -> u64 {
        1
    }

    fn last_modified(&self) -> DateTime<Utc> {
        self.inner.last_modified()
    }

    async fn read(&self) -> std::io::Result<Bytes> {
        self.inner.read().await
    }
}
