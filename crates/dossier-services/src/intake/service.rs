use bytes::Bytes;
use chrono::{DateTime, Utc};
use dossier_core::models::{FileRecord, Folder, FolderKey, FolderState, FolderSummary, IntakeRoot};
use dossier_core::{AppError, IntakeSettings, SubmissionPolicy};
use dossier_storage::{BlobStore, MetadataStore, QuotaMonitor, QuotaUsage};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::locks::OwnerLocks;
use crate::view::{ViewHandle, ViewRegistry};

use super::source::FileSource;
use super::types::{FolderDocument, UploadBatch};

/// Upload folders per owner, backed by the blob and metadata stores.
///
/// Every mutation holds the write guard from `OwnerLocks` across its
/// read-modify-write of the metadata document. Reading the uploaded content
/// happens before the guard is taken. Dropping an upload future before the
/// content is read writes nothing; after that point the upload is committed
/// in the background.
#[derive(Clone)]
pub struct IntakeEngine {
    blobs: BlobStore,
    metadata: MetadataStore,
    monitor: QuotaMonitor,
    locks: OwnerLocks,
    views: ViewRegistry,
    settings: IntakeSettings,
}

impl IntakeEngine {
    pub fn new(
        blobs: BlobStore,
        metadata: MetadataStore,
        monitor: QuotaMonitor,
        settings: IntakeSettings,
    ) -> Self {
        Self {
            blobs,
            metadata,
            monitor,
            locks: OwnerLocks::new(settings.write_lock_policy),
            views: ViewRegistry::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &IntakeSettings {
        &self.settings
    }

    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }

    /// Upload one file into `owner_id`'s folder `folder_key`.
    ///
    /// Fails with `FileTooLarge` before reading anything, `Cancelled` if the
    /// token fires while the content is being read, `FolderSubmitted` under the
    /// lock policy, and `StorageFull` when the blob store refuses the write.
    /// In every failure case neither store is modified.
    #[tracing::instrument(
        skip(self, source, cancel),
        fields(intake.operation = "add", file_name = %source.name())
    )]
    pub async fn add_document(
        &self,
        owner_id: &str,
        folder_key: &str,
        source: &dyn FileSource,
        cancel: &CancellationToken,
    ) -> Result<FileRecord, AppError> {
        validate_target(owner_id, folder_key)?;

        let limit = self.settings.max_file_size_bytes;
        if source.size() > limit {
            tracing::debug!(
                owner_id = %owner_id,
                folder = %folder_key,
                file_name = %source.name(),
                size_bytes = source.size(),
                limit_bytes = limit,
                "Upload rejected, file too large"
            );
            return Err(AppError::FileTooLarge {
                size: source.size(),
                limit,
            });
        }

        let content = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            read = source.read() => read?,
        };

        // The announced size is not trusted
        let size = content.len() as u64;
        if size > limit {
            return Err(AppError::FileTooLarge { size, limit });
        }

        let pending = PendingUpload {
            owner_id: owner_id.to_string(),
            folder_key: folder_key.to_string(),
            name: source.name().to_string(),
            mime_type: source.mime_type().to_string(),
            last_modified: source.last_modified(),
            content,
        };

        // Once started, the commit runs to completion on its own task, so
        // dropping this future cannot leave a blob without its record.
        let engine = self.clone();
        let cancel = cancel.clone();
        let commit = async move { engine.commit_upload(pending, &cancel).await };
        tokio::spawn(commit.in_current_span())
            .await
            .map_err(|e| AppError::Internal(format!("Upload commit task failed: {}", e)))?
    }

    /// Store the blob and the record of an upload whose content is in memory.
    async fn commit_upload(
        &self,
        pending: PendingUpload,
        cancel: &CancellationToken,
    ) -> Result<FileRecord, AppError> {
        let owner_id = pending.owner_id.as_str();
        let folder_key = pending.folder_key.as_str();

        let _guard = self.locks.acquire(owner_id).await;
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let mut tree = self.metadata.load_all().await?;

        if self.settings.submission_policy == SubmissionPolicy::Lock
            && folder_of(&tree, owner_id, folder_key).is_some_and(|f| f.submitted)
        {
            return Err(AppError::FolderSubmitted(folder_key.to_string()));
        }

        let id = Uuid::new_v4();
        let record = FileRecord {
            id,
            name: pending.name,
            mime_type: pending.mime_type,
            size_bytes: pending.content.len() as u64,
            last_modified: pending.last_modified,
            uploaded_at: Utc::now(),
            content_ref: id.to_string(),
        };

        self.blobs.put(&record.content_ref, &pending.content).await?;

        tree.entry(owner_id.to_string())
            .or_insert_with(|| IntakeRoot::new(owner_id))
            .folder_entry(folder_key)
            .push_file(record.clone());

        if let Err(e) = self.metadata.save_all(&tree).await {
            tracing::error!(error = %e, file_id = %id, "Failed to save metadata, removing blob");
            if let Err(cleanup) = self.blobs.remove(&record.content_ref).await {
                tracing::error!(error = %cleanup, file_id = %id, "Failed to remove orphaned blob");
            }
            return Err(e.into());
        }

        tracing::info!(
            owner_id = %owner_id,
            folder = %folder_key,
            file_id = %id,
            file_name = %record.name,
            size_bytes = record.size_bytes,
            "Document added"
        );

        self.report_usage().await;
        Ok(record)
    }

    /// Upload several files one after another. Stops at the first failure;
    /// files stored before it stay stored and are reported in the batch.
    pub async fn add_documents(
        &self,
        owner_id: &str,
        folder_key: &str,
        sources: &[&dyn FileSource],
        cancel: &CancellationToken,
    ) -> UploadBatch {
        let mut batch = UploadBatch::default();
        for source in sources {
            match self.add_document(owner_id, folder_key, *source, cancel).await {
                Ok(record) => batch.stored.push(record),
                Err(e) => {
                    tracing::debug!(
                        stored = batch.stored.len(),
                        remaining = sources.len() - batch.stored.len(),
                        error = %e,
                        "Batch upload stopped"
                    );
                    batch.error = Some(e);
                    break;
                }
            }
        }
        batch
    }

    /// Remove a file's blob, then its metadata. Missing owner, folder or file
    /// is not an error.
    #[tracing::instrument(skip(self), fields(intake.operation = "remove"))]
    pub async fn remove_document(
        &self,
        owner_id: &str,
        folder_key: &str,
        file_id: Uuid,
    ) -> Result<(), AppError> {
        let _guard = self.locks.acquire(owner_id).await;
        let mut tree = self.metadata.load_all().await?;

        let removed = tree
            .get_mut(owner_id)
            .and_then(|root| root.folders.get_mut(folder_key))
            .and_then(|folder| folder.remove_file(file_id));

        let content_ref = removed
            .as_ref()
            .map(|r| r.content_ref.clone())
            .unwrap_or_else(|| file_id.to_string());
        self.blobs.remove(&content_ref).await?;

        if removed.is_some() {
            self.metadata.save_all(&tree).await?;
            tracing::info!(file_id = %file_id, "Document removed");
            self.report_usage().await;
        } else {
            tracing::debug!(file_id = %file_id, "Document already absent");
        }

        Ok(())
    }

    /// Mark a folder as submitted. Returns `false` (and changes nothing) when
    /// the folder does not exist yet.
    #[tracing::instrument(skip(self), fields(intake.operation = "submit"))]
    pub async fn submit_folder(&self, owner_id: &str, folder_key: &str) -> Result<bool, AppError> {
        let _guard = self.locks.acquire(owner_id).await;
        let mut tree = self.metadata.load_all().await?;

        let Some(folder) = tree
            .get_mut(owner_id)
            .and_then(|root| root.folders.get_mut(folder_key))
        else {
            tracing::debug!("Submit ignored, folder does not exist");
            return Ok(false);
        };

        if folder.submitted {
            return Ok(true);
        }
        folder.submitted = true;
        let file_count = folder.files.len();

        self.metadata.save_all(&tree).await?;
        tracing::info!(file_count, "Folder submitted");
        self.report_usage().await;
        Ok(true)
    }

    /// File records of a folder without their content
    pub async fn list_folder_records(
        &self,
        owner_id: &str,
        folder_key: &str,
    ) -> Result<Vec<FileRecord>, AppError> {
        let tree = self.metadata.load_all().await?;
        Ok(folder_of(&tree, owner_id, folder_key)
            .map(|f| f.files.clone())
            .unwrap_or_default())
    }

    /// Content of one record, `None` if its blob is missing
    pub async fn fetch_content(&self, record: &FileRecord) -> Result<Option<Bytes>, AppError> {
        Ok(self.blobs.get(&record.content_ref).await?)
    }

    /// File records of a folder with their content loaded
    pub async fn get_folder_documents(
        &self,
        owner_id: &str,
        folder_key: &str,
    ) -> Result<Vec<FolderDocument>, AppError> {
        let records = self.list_folder_records(owner_id, folder_key).await?;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let refs: Vec<String> = records.iter().map(|r| r.content_ref.clone()).collect();
        let contents = self.blobs.get_many(&refs).await?;

        Ok(records
            .into_iter()
            .zip(contents)
            .map(|(record, content)| {
                if content.is_none() {
                    tracing::warn!(file_id = %record.id, "Blob missing for listed document");
                }
                FolderDocument { record, content }
            })
            .collect())
    }

    /// Wrap a record's content in a tracked view handle
    pub async fn open_view(&self, record: &FileRecord) -> Result<Option<ViewHandle>, AppError> {
        Ok(self
            .fetch_content(record)
            .await?
            .map(|content| self.views.acquire(record.id, content)))
    }

    pub async fn is_folder_submitted(
        &self,
        owner_id: &str,
        folder_key: &str,
    ) -> Result<bool, AppError> {
        Ok(self.folder_state(owner_id, folder_key).await? == FolderState::Submitted)
    }

    /// Unknown owners and folders are `Empty`
    pub async fn folder_state(
        &self,
        owner_id: &str,
        folder_key: &str,
    ) -> Result<FolderState, AppError> {
        let tree = self.metadata.load_all().await?;
        Ok(folder_of(&tree, owner_id, folder_key)
            .map(Folder::state)
            .unwrap_or(FolderState::Empty))
    }

    pub async fn list_folders(&self, owner_id: &str) -> Result<Vec<FolderSummary>, AppError> {
        let tree = self.metadata.load_all().await?;
        Ok(tree
            .get(owner_id)
            .map(|root| {
                root.folders
                    .iter()
                    .map(|(key, folder)| folder.summary(key))
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Submitted folders that contain at least one file
    pub async fn submitted_folders(
        &self,
        owner_id: &str,
    ) -> Result<Vec<(String, Folder)>, AppError> {
        let tree = self.metadata.load_all().await?;
        Ok(tree
            .get(owner_id)
            .map(|root| {
                root.folders
                    .iter()
                    .filter(|(_, f)| f.submitted && !f.files.is_empty())
                    .map(|(key, f)| (key.clone(), f.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    pub async fn intake_root(&self, owner_id: &str) -> Result<Option<IntakeRoot>, AppError> {
        Ok(self.metadata.load_all().await?.remove(owner_id))
    }

    /// Purge a folder's blobs, empty it and clear its submitted flag
    #[tracing::instrument(skip(self), fields(intake.operation = "clear_folder"))]
    pub async fn clear_folder_documents(
        &self,
        owner_id: &str,
        folder_key: &str,
    ) -> Result<(), AppError> {
        let _guard = self.locks.acquire(owner_id).await;
        let mut tree = self.metadata.load_all().await?;

        let Some(folder) = tree
            .get_mut(owner_id)
            .and_then(|root| root.folders.get_mut(folder_key))
        else {
            tracing::debug!("Clear ignored, folder does not exist");
            return Ok(());
        };

        let refs: Vec<String> = folder.files.iter().map(|f| f.content_ref.clone()).collect();
        let purged = self.blobs.remove_many(&refs).await?;
        folder.reset();

        self.metadata.save_all(&tree).await?;
        tracing::info!(purged, "Folder cleared");
        self.report_usage().await;
        Ok(())
    }

    /// Purge every blob of an owner and delete its intake root
    #[tracing::instrument(skip(self), fields(intake.operation = "clear_owner"))]
    pub async fn clear_user_documents(&self, owner_id: &str) -> Result<(), AppError> {
        let _guard = self.locks.acquire(owner_id).await;
        let mut tree = self.metadata.load_all().await?;

        let Some(root) = tree.get(owner_id) else {
            tracing::debug!("Clear ignored, owner has no documents");
            return Ok(());
        };

        let purged = self.blobs.remove_many(&root.content_refs()).await?;
        tree.remove(owner_id);

        self.metadata.save_all(&tree).await?;
        tracing::info!(purged, "Owner documents cleared");
        self.report_usage().await;
        Ok(())
    }

    pub async fn usage(&self) -> Result<QuotaUsage, AppError> {
        Ok(self.monitor.usage().await?)
    }

    /// Run the quota monitor after a metadata mutation. The monitor is
    /// diagnostic, so its own failures are only logged.
    async fn report_usage(&self) {
        if let Err(e) = self.monitor.check().await {
            tracing::warn!(error = %e, "Failed to measure storage usage");
        }
    }
}

/// Upload whose content has been read and checked, waiting for the write guard
struct PendingUpload {
    owner_id: String,
    folder_key: String,
    name: String,
    mime_type: String,
    last_modified: DateTime<Utc>,
    content: Bytes,
}

fn folder_of<'a>(
    tree: &'a dossier_core::models::IntakeTree,
    owner_id: &str,
    folder_key: &str,
) -> Option<&'a Folder> {
    tree.get(owner_id).and_then(|root| root.folders.get(folder_key))
}

fn validate_target(owner_id: &str, folder_key: &str) -> Result<(), AppError> {
    if owner_id.trim().is_empty() {
        return Err(AppError::InvalidInput("Owner id must not be empty".to_string()));
    }
    if FolderKey::parse(folder_key).is_none() {
        return Err(AppError::InvalidInput(format!(
            "Folder key '{}' is not of the form section_documentType",
            folder_key
        )));
    }
    Ok(())
}
