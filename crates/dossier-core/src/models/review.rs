use std::collections::HashSet;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Review status of a submitted document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Approved,
    Rejected,
    OnHold,
}

impl FromStr for DocumentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(DocumentStatus::Pending),
            "approved" => Ok(DocumentStatus::Approved),
            "rejected" => Ok(DocumentStatus::Rejected),
            "on_hold" | "on-hold" => Ok(DocumentStatus::OnHold),
            _ => Err(anyhow::anyhow!("Invalid document status: {}", s)),
        }
    }
}

impl Display for DocumentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DocumentStatus::Pending => write!(f, "pending"),
            DocumentStatus::Approved => write!(f, "approved"),
            DocumentStatus::Rejected => write!(f, "rejected"),
            DocumentStatus::OnHold => write!(f, "on_hold"),
        }
    }
}

/// Document visible to reviewers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDocument {
    pub id: Uuid,
    pub name: String,
    pub section_id: String,
    pub document_type_id: String,
    pub status: DocumentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    pub content_ref: String,
}

impl ReviewDocument {
    /// Apply a review decision.
    ///
    /// Every transition is legal. Moving back to `Pending` discards remarks and
    /// the review timestamp; any other status records both.
    pub fn apply_status(
        &mut self,
        status: DocumentStatus,
        remarks: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.status = status;
        match status {
            DocumentStatus::Pending => {
                self.remarks = None;
                self.reviewed_at = None;
            }
            DocumentStatus::Approved | DocumentStatus::Rejected | DocumentStatus::OnHold => {
                self.remarks = remarks;
                self.reviewed_at = Some(now);
            }
        }
    }
}

/// Review ledger entry for one customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Secondary identity key (e.g. tax number); also the intake owner id
    pub identity_number: String,
    #[serde(default)]
    pub documents_submitted: bool,
    #[serde(default)]
    pub documents: Vec<ReviewDocument>,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn document(&self, document_id: Uuid) -> Option<&ReviewDocument> {
        self.documents.iter().find(|d| d.id == document_id)
    }

    pub fn document_mut(&mut self, document_id: Uuid) -> Option<&mut ReviewDocument> {
        self.documents.iter_mut().find(|d| d.id == document_id)
    }

    /// Append documents whose ids are not present yet. Returns how many were
    /// added.
    pub fn merge_documents(&mut self, docs: impl IntoIterator<Item = ReviewDocument>) -> usize {
        let mut known: HashSet<Uuid> = self.documents.iter().map(|d| d.id).collect();
        let before = self.documents.len();
        for doc in docs {
            if known.insert(doc.id) {
                self.documents.push(doc);
            }
        }
        self.documents.len() - before
    }

    pub fn summary(&self) -> ReviewSummary {
        let mut summary = ReviewSummary {
            customer_id: self.id.clone(),
            total: self.documents.len(),
            ..ReviewSummary::default()
        };
        for doc in &self.documents {
            match doc.status {
                DocumentStatus::Pending => summary.pending += 1,
                DocumentStatus::Approved => summary.approved += 1,
                DocumentStatus::Rejected => summary.rejected += 1,
                DocumentStatus::OnHold => summary.on_hold += 1,
            }
        }
        summary
    }
}

/// Registration data for a new customer
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewCustomer {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    pub name: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 7, max = 20, message = "Phone must be 7 to 20 characters"))]
    pub phone: String,
    #[validate(length(
        min = 1,
        max = 32,
        message = "Identity number must be between 1 and 32 characters"
    ))]
    pub identity_number: String,
}

/// Per-status document counts for one customer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReviewSummary {
    pub customer_id: String,
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub on_hold: usize,
}
