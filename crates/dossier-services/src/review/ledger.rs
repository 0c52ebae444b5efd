use std::sync::Arc;

use chrono::Utc;
use dossier_core::constants::CUSTOMER_ID_PREFIX;
use dossier_core::models::{
    Customer, DocumentStatus, NewCustomer, ReviewDocument, ReviewSummary,
};
use dossier_core::AppError;
use dossier_storage::CustomerStore;
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;
use validator::Validate;

use super::links::upload_link;

/// Result of a review decision
#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    pub customer_id: String,
    pub document: ReviewDocument,
    /// Targeted reupload link, present when the document was rejected
    pub reupload_link: Option<String>,
}

/// Per-customer review ledger.
///
/// Writes are serialized by an internal mutex; reads go straight to storage.
#[derive(Clone)]
pub struct ReviewLedger {
    store: CustomerStore,
    public_origin: String,
    write_lock: Arc<Mutex<()>>,
}

impl ReviewLedger {
    pub fn new(store: CustomerStore, public_origin: impl Into<String>) -> Self {
        Self {
            store,
            public_origin: public_origin.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn public_origin(&self) -> &str {
        &self.public_origin
    }

    #[tracing::instrument(skip(self, input), fields(review.operation = "add_customer"))]
    pub async fn add_customer(&self, input: NewCustomer) -> Result<Customer, AppError> {
        input.validate()?;

        let _guard = self.write_lock.lock().await;
        let mut customers = self.store.load_all().await?;

        if customers
            .iter()
            .any(|c| c.identity_number == input.identity_number)
        {
            return Err(AppError::InvalidInput(format!(
                "A customer with identity number {} already exists",
                input.identity_number
            )));
        }

        let customer = Customer {
            id: next_customer_id(&customers)?,
            name: input.name,
            email: input.email,
            phone: input.phone,
            identity_number: input.identity_number,
            documents_submitted: false,
            documents: Vec::new(),
            created_at: Utc::now(),
        };
        customers.push(customer.clone());
        self.store.save_all(&customers).await?;

        tracing::info!(customer_id = %customer.id, "Customer added");
        Ok(customer)
    }

    pub async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, AppError> {
        Ok(self
            .store
            .load_all()
            .await?
            .into_iter()
            .find(|c| c.id == customer_id))
    }

    pub async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        Ok(self.store.load_all().await?)
    }

    /// Resolve a customer by id first, then by identity number
    pub async fn find_customer(&self, candidate: &str) -> Result<Option<Customer>, AppError> {
        let customers = self.store.load_all().await?;
        Ok(resolve(&customers, candidate).map(|idx| customers[idx].clone()))
    }

    /// Attach a document directly. Returns `false` if a document with the
    /// same id is already present.
    #[tracing::instrument(skip(self, document), fields(document_id = %document.id))]
    pub async fn attach_document(
        &self,
        customer_id: &str,
        document: ReviewDocument,
    ) -> Result<bool, AppError> {
        let added = self.merge_documents(customer_id, vec![document]).await?;
        Ok(added == 1)
    }

    /// Record a review decision on one document.
    ///
    /// Rejection also produces the targeted reupload link carrying the
    /// remarks.
    #[tracing::instrument(skip(self, remarks), fields(review.operation = "update_status"))]
    pub async fn update_document_status(
        &self,
        customer_id: &str,
        document_id: Uuid,
        status: DocumentStatus,
        remarks: Option<String>,
    ) -> Result<StatusChange, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut customers = self.store.load_all().await?;

        let customer = customers
            .iter_mut()
            .find(|c| c.id == customer_id)
            .ok_or_else(|| AppError::NotFound(format!("Customer {} not found", customer_id)))?;
        let document = customer.document_mut(document_id).ok_or_else(|| {
            AppError::NotFound(format!(
                "Document {} not found for customer {}",
                document_id, customer_id
            ))
        })?;

        let previous = document.status;
        document.apply_status(status, remarks, Utc::now());
        let document = document.clone();

        self.store.save_all(&customers).await?;

        tracing::info!(
            from = %previous,
            to = %status,
            "Document status updated"
        );

        let reupload_link = (status == DocumentStatus::Rejected).then(|| {
            upload_link(
                &self.public_origin,
                customer_id,
                Some(document_id),
                document.remarks.as_deref(),
            )
        });

        Ok(StatusChange {
            customer_id: customer_id.to_string(),
            document,
            reupload_link,
        })
    }

    /// General or targeted upload link for a customer
    pub fn generate_upload_link(
        &self,
        customer_id: &str,
        document_id: Option<Uuid>,
        remarks: Option<&str>,
    ) -> String {
        upload_link(&self.public_origin, customer_id, document_id, remarks)
    }

    /// Append documents not yet present, by id. Marks the customer as having
    /// submitted documents when anything was added.
    pub async fn merge_documents(
        &self,
        customer_id: &str,
        documents: Vec<ReviewDocument>,
    ) -> Result<usize, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut customers = self.store.load_all().await?;

        let customer = customers
            .iter_mut()
            .find(|c| c.id == customer_id)
            .ok_or_else(|| AppError::NotFound(format!("Customer {} not found", customer_id)))?;

        let added = customer.merge_documents(documents);
        if added == 0 {
            tracing::debug!(customer_id = %customer_id, "No new documents to merge");
            return Ok(0);
        }
        customer.documents_submitted = true;

        self.store.save_all(&customers).await?;
        tracing::info!(customer_id = %customer_id, added, "Documents merged");
        Ok(added)
    }

    pub async fn summary(&self, customer_id: &str) -> Result<ReviewSummary, AppError> {
        self.get_customer(customer_id)
            .await?
            .map(|c| c.summary())
            .ok_or_else(|| AppError::NotFound(format!("Customer {} not found", customer_id)))
    }
}

fn resolve(customers: &[Customer], candidate: &str) -> Option<usize> {
    customers
        .iter()
        .position(|c| c.id == candidate)
        .or_else(|| customers.iter().position(|c| c.identity_number == candidate))
}

/// `CUST` followed by the highest existing sequence number plus one,
/// zero-padded to four digits
fn next_customer_id(customers: &[Customer]) -> Result<String, AppError> {
    let next = customers
        .iter()
        .filter_map(|c| c.id.strip_prefix(CUSTOMER_ID_PREFIX))
        .filter_map(|seq| seq.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
        .checked_add(1)
        .ok_or_else(|| AppError::Internal("Customer id sequence exhausted".to_string()))?;
    Ok(format!("{}{:04}", CUSTOMER_ID_PREFIX, next))
}
