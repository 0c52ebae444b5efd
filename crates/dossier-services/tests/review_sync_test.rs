#[path = "helpers/mod.rs"]
mod helpers;

use dossier_core::models::{DocumentStatus, NewCustomer};
use dossier_core::AppError;
use dossier_services::SyncOutcome;
use helpers::fixtures::{pdf, KB};
use helpers::{setup_test_app, TestApp, FOLDER, OWNER};
use tokio_util::sync::CancellationToken;

fn new_customer(identity: &str) -> NewCustomer {
    NewCustomer {
        name: "Asha Rao".to_string(),
        email: "asha@example.com".to_string(),
        phone: "9876543210".to_string(),
        identity_number: identity.to_string(),
    }
}

async fn submitted_pan001(app: &TestApp) {
    let intake = &app.services.intake;
    let cancel = CancellationToken::new();
    intake
        .add_document(OWNER, FOLDER, &pdf("a.pdf", 500 * KB), &cancel)
        .await
        .unwrap();
    intake
        .add_document(OWNER, FOLDER, &pdf("b.pdf", 600 * KB), &cancel)
        .await
        .unwrap();
    assert!(intake.submit_folder(OWNER, FOLDER).await.unwrap());
}

#[tokio::test]
async fn test_pan001_sync_is_idempotent() {
    let app = setup_test_app();
    let customer = app
        .services
        .ledger
        .add_customer(new_customer(OWNER))
        .await
        .unwrap();
    submitted_pan001(&app).await;

    let outcome = app.services.synchronizer.sync(&customer.id).await.unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::Merged {
            customer_id: customer.id.clone(),
            added: 2
        }
    );

    let stored = app
        .services
        .ledger
        .get_customer(&customer.id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.documents_submitted);
    assert_eq!(stored.documents.len(), 2);
    for doc in &stored.documents {
        assert_eq!(doc.section_id, "section1");
        assert_eq!(doc.document_type_id, "kyc1");
        assert_eq!(doc.status, DocumentStatus::Pending);
    }

    // resolving by identity number reaches the same customer
    let outcome = app.services.synchronizer.sync(OWNER).await.unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::Merged {
            customer_id: customer.id.clone(),
            added: 0
        }
    );
    let stored = app
        .services
        .ledger
        .get_customer(&customer.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.documents.len(), 2);
}

#[tokio::test]
async fn test_sync_ignores_unsubmitted_folders() {
    let app = setup_test_app();
    let customer = app
        .services
        .ledger
        .add_customer(new_customer(OWNER))
        .await
        .unwrap();
    app.services
        .intake
        .add_document(OWNER, FOLDER, &pdf("a.pdf", KB), &CancellationToken::new())
        .await
        .unwrap();

    let outcome = app.services.synchronizer.sync(&customer.id).await.unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::Merged {
            customer_id: customer.id.clone(),
            added: 0
        }
    );
    let stored = app
        .services
        .ledger
        .get_customer(&customer.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.documents_submitted);
}

#[tokio::test]
async fn test_unresolved_customer_is_silent() {
    let app = setup_test_app();
    submitted_pan001(&app).await;
    assert_eq!(
        app.services.synchronizer.sync("PAN999").await.unwrap(),
        SyncOutcome::CustomerNotResolved
    );
}

#[tokio::test]
async fn test_sync_all_covers_every_customer() {
    let app = setup_test_app();
    app.services
        .ledger
        .add_customer(new_customer(OWNER))
        .await
        .unwrap();
    app.services
        .ledger
        .add_customer(new_customer("PAN002"))
        .await
        .unwrap();
    submitted_pan001(&app).await;

    let outcomes = app.services.synchronizer.sync_all().await.unwrap();
    assert_eq!(
        outcomes,
        vec![
            SyncOutcome::Merged {
                customer_id: "CUST0001".to_string(),
                added: 2
            },
            SyncOutcome::Merged {
                customer_id: "CUST0002".to_string(),
                added: 0
            },
        ]
    );
}

#[tokio::test]
async fn test_review_decisions_after_sync() {
    let app = setup_test_app();
    let ledger = &app.services.ledger;
    let customer = ledger.add_customer(new_customer(OWNER)).await.unwrap();
    submitted_pan001(&app).await;
    app.services.synchronizer.sync(&customer.id).await.unwrap();

    let docs = ledger
        .get_customer(&customer.id)
        .await
        .unwrap()
        .unwrap()
        .documents;

    let approved = ledger
        .update_document_status(&customer.id, docs[0].id, DocumentStatus::Approved, None)
        .await
        .unwrap();
    assert!(approved.reupload_link.is_none());
    assert!(approved.document.reviewed_at.is_some());

    let rejected = ledger
        .update_document_status(
            &customer.id,
            docs[1].id,
            DocumentStatus::Rejected,
            Some("X".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(rejected.document.remarks.as_deref(), Some("X"));
    let link = rejected.reupload_link.unwrap();
    assert!(link.starts_with("http://localhost:3000/customer/reupload?customerId=CUST0001"));
    assert!(link.contains(&format!("documentId={}", docs[1].id)));
    assert!(link.ends_with("remarks=X"));

    let summary = ledger.summary(&customer.id).await.unwrap();
    assert_eq!(summary.approved, 1);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.pending, 0);

    // a later sync does not reset decisions
    app.services.synchronizer.sync(&customer.id).await.unwrap();
    let summary = ledger.summary(&customer.id).await.unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.rejected, 1);

    assert_eq!(
        ledger.generate_upload_link(&customer.id, None, None),
        "http://localhost:3000/customer?userId=CUST0001"
    );
    assert!(matches!(
        ledger.summary("CUST9999").await,
        Err(AppError::NotFound(_))
    ));
}
