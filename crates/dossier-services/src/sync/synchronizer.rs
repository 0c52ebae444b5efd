use dossier_core::models::{DocumentStatus, Folder, FolderKey, ReviewDocument};
use dossier_core::AppError;
use serde::Serialize;

use crate::intake::IntakeEngine;
use crate::review::ReviewLedger;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Neither a customer id nor an identity number matched
    CustomerNotResolved,
    Merged { customer_id: String, added: usize },
}

#[derive(Clone)]
pub struct Synchronizer {
    intake: IntakeEngine,
    ledger: ReviewLedger,
}

impl Synchronizer {
    pub fn new(intake: IntakeEngine, ledger: ReviewLedger) -> Self {
        Self { intake, ledger }
    }

    /// Merge the submitted uploads of one customer into the ledger.
    ///
    /// `candidate` is a customer id or an identity number. Files already
    /// present in the ledger are skipped, so running this repeatedly has the
    /// same effect as running it once.
    #[tracing::instrument(skip(self), fields(sync.operation = "sync"))]
    pub async fn sync(&self, candidate: &str) -> Result<SyncOutcome, AppError> {
        let Some(customer) = self.ledger.find_customer(candidate).await? else {
            tracing::debug!("No customer matches, nothing to sync");
            return Ok(SyncOutcome::CustomerNotResolved);
        };

        let folders = self
            .intake
            .submitted_folders(&customer.identity_number)
            .await?;

        let documents: Vec<ReviewDocument> = folders
            .iter()
            .flat_map(|(key, folder)| pending_documents(key, folder))
            .filter(|doc| customer.document(doc.id).is_none())
            .collect();

        let added = if documents.is_empty() {
            0
        } else {
            self.ledger.merge_documents(&customer.id, documents).await?
        };

        tracing::info!(
            customer_id = %customer.id,
            folders = folders.len(),
            added,
            "Sync completed"
        );

        Ok(SyncOutcome::Merged {
            customer_id: customer.id,
            added,
        })
    }

    /// Run `sync` for every customer in the ledger
    pub async fn sync_all(&self) -> Result<Vec<SyncOutcome>, AppError> {
        let customers = self.ledger.list_customers().await?;
        let mut outcomes = Vec::with_capacity(customers.len());
        for customer in customers {
            outcomes.push(self.sync(&customer.id).await?);
        }
        Ok(outcomes)
    }
}

/// Pending review documents for every file of a submitted folder. Folders
/// whose key has no section separator yield nothing.
fn pending_documents(key: &str, folder: &Folder) -> Vec<ReviewDocument> {
    let Some(folder_key) = FolderKey::parse(key) else {
        tracing::warn!(folder = %key, "Skipping folder with malformed key");
        return Vec::new();
    };

    folder
        .files
        .iter()
        .map(|file| ReviewDocument {
            id: file.id,
            name: file.name.clone(),
            section_id: folder_key.section_id.clone(),
            document_type_id: folder_key.document_type_id.clone(),
            status: DocumentStatus::Pending,
            remarks: None,
            uploaded_at: file.uploaded_at,
            reviewed_at: None,
            content_ref: file.content_ref.clone(),
        })
        .collect()
}
