//! Transient view handles over file content
//!
//! A display layer gets a `ViewHandle` whose URL it can hand to a renderer.
//! The registry keeps the bytes reachable by URL only while the handle is
//! alive; the handle is released explicitly with `release()` or when it goes
//! out of scope.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use uuid::Uuid;

const VIEW_URL_SCHEME: &str = "dossier-view://";

type Entries = Arc<Mutex<HashMap<Uuid, Bytes>>>;

#[derive(Clone, Default)]
pub struct ViewRegistry {
    entries: Entries,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `content` and return the handle owning it
    pub fn acquire(&self, file_id: Uuid, content: Bytes) -> ViewHandle {
        let id = Uuid::new_v4();
        self.lock().insert(id, content.clone());
        tracing::debug!(view_id = %id, file_id = %file_id, "View handle acquired");
        ViewHandle {
            id,
            file_id,
            content,
            entries: self.entries.clone(),
        }
    }

    /// Content behind a live handle's URL
    pub fn resolve(&self, url: &str) -> Option<Bytes> {
        let id = url
            .strip_prefix(VIEW_URL_SCHEME)
            .and_then(|raw| Uuid::parse_str(raw).ok())?;
        self.lock().get(&id).cloned()
    }

    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Bytes>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Live view over one file's content
pub struct ViewHandle {
    id: Uuid,
    file_id: Uuid,
    content: Bytes,
    entries: Entries,
}

impl ViewHandle {
    pub fn url(&self) -> String {
        format!("{}{}", VIEW_URL_SCHEME, self.id)
    }

    pub fn file_id(&self) -> Uuid {
        self.file_id
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// Release the handle now instead of at end of scope
    pub fn release(self) {}
}

impl Drop for ViewHandle {
    fn drop(&mut self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.remove(&self.id).is_some() {
            tracing::debug!(view_id = %self.id, file_id = %self.file_id, "View handle released");
        }
    }
}
