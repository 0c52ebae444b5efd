//! Dossier CLI: drive the intake engine, the review ledger and the
//! synchronizer against the configured storage backend.
//!
//! Configuration comes from the environment (or `.env`). The default memory
//! backend forgets everything when the process exits; set
//! DOSSIER_STORAGE_BACKEND=local and DOSSIER_STORAGE_PATH to keep state
//! between invocations.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dossier_cli::{format_bytes, print_json};
use dossier_core::models::{DocumentStatus, NewCustomer};
use dossier_core::{Config, ErrorMetadata};
use dossier_services::{init_telemetry, FileSource, PathFile, Services};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "dossier", about = "Document intake and review CLI")]
struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload one or more files into an owner's folder
    Upload {
        /// Owner id (identity number)
        owner: String,
        /// Folder key, e.g. section1_kyc1
        folder: String,
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List an owner's folders, or the files of one folder
    List {
        owner: String,
        #[arg(long)]
        folder: Option<String>,
    },
    /// Mark a folder as submitted
    Submit { owner: String, folder: String },
    /// Remove one uploaded file
    Remove {
        owner: String,
        folder: String,
        file_id: Uuid,
    },
    /// Write an uploaded file's content to disk
    Export {
        owner: String,
        folder: String,
        file_id: Uuid,
        /// Destination path
        #[arg(long)]
        out: PathBuf,
    },
    /// Empty a folder and reopen it for uploads
    Reset { owner: String, folder: String },
    /// Delete every folder and file of an owner
    ClearOwner { owner: String },
    /// Customer operations
    Customer {
        #[command(subcommand)]
        sub: CustomerCommands,
    },
    /// Merge submitted uploads into the review ledger
    Sync {
        /// Customer id or identity number; all customers when omitted
        candidate: Option<String>,
    },
    /// Record a review decision on a document
    SetStatus {
        customer_id: String,
        document_id: Uuid,
        /// pending, approved, rejected or on_hold
        status: DocumentStatus,
        #[arg(long)]
        remarks: Option<String>,
    },
    /// Print an upload link for a customer
    Link {
        customer_id: String,
        /// Target the reupload page of this document
        #[arg(long)]
        document: Option<Uuid>,
        #[arg(long)]
        remarks: Option<String>,
    },
    /// Show the persisted footprint against the quota
    Usage,
}

#[derive(Subcommand)]
enum CustomerCommands {
    /// Register a new customer
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        identity_number: String,
    },
    /// List all customers
    List,
    /// Show one customer with its documents
    Show { candidate: String },
    /// Per-status document counts
    Summary { customer_id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_telemetry(cli.json_logs)
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::debug!(
        backend = %config.storage_backend,
        environment = %config.environment,
        "Configuration loaded"
    );
    let services = Services::from_config(&config).await?;

    if let Err(e) = run(cli.command, &services).await {
        if let Some(app) = e.downcast_ref::<dossier_core::AppError>() {
            eprintln!("error [{}]: {}", app.error_code(), app.client_message());
            if let Some(action) = app.suggested_action() {
                eprintln!("hint: {}", action);
            }
            std::process::exit(1);
        }
        return Err(e);
    }

    Ok(())
}

async fn run(command: Commands, services: &Services) -> anyhow::Result<()> {
    match command {
        Commands::Upload {
            owner,
            folder,
            files,
        } => {
            let mut sources = Vec::with_capacity(files.len());
            for path in &files {
                sources.push(
                    PathFile::open(path)
                        .await
                        .with_context(|| format!("Cannot open {}", path.display()))?,
                );
            }
            let refs: Vec<&dyn FileSource> = sources.iter().map(|s| s as &dyn FileSource).collect();

            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_interrupt.cancel();
                }
            });

            let batch = services
                .intake
                .add_documents(&owner, &folder, &refs, &cancel)
                .await;
            print_json(&batch.stored)?;
            if let Some(e) = batch.error {
                return Err(e.into());
            }
        }
        Commands::List { owner, folder } => match folder {
            Some(folder) => {
                print_json(&services.intake.list_folder_records(&owner, &folder).await?)?
            }
            None => print_json(&services.intake.list_folders(&owner).await?)?,
        },
        Commands::Submit { owner, folder } => {
            let marked = services.intake.submit_folder(&owner, &folder).await?;
            print_json(&serde_json::json!({ "folder": folder, "submitted": marked }))?;
        }
        Commands::Remove {
            owner,
            folder,
            file_id,
        } => {
            services
                .intake
                .remove_document(&owner, &folder, file_id)
                .await?;
            print_json(&serde_json::json!({ "removed": file_id }))?;
        }
        Commands::Export {
            owner,
            folder,
            file_id,
            out,
        } => {
            let record = services
                .intake
                .list_folder_records(&owner, &folder)
                .await?
                .into_iter()
                .find(|r| r.id == file_id)
                .ok_or_else(|| anyhow::anyhow!("File {} not found in {}", file_id, folder))?;
            let content = services
                .intake
                .fetch_content(&record)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Content of {} is missing", file_id))?;
            tokio::fs::write(&out, &content)
                .await
                .with_context(|| format!("Cannot write {}", out.display()))?;
            print_json(&serde_json::json!({
                "file": record.name,
                "path": out,
                "size": format_bytes(content.len() as u64),
            }))?;
        }
        Commands::Reset { owner, folder } => {
            services
                .intake
                .clear_folder_documents(&owner, &folder)
                .await?;
            print_json(&serde_json::json!({ "folder": folder, "state": "empty" }))?;
        }
        Commands::ClearOwner { owner } => {
            services.intake.clear_user_documents(&owner).await?;
            print_json(&serde_json::json!({ "owner": owner, "cleared": true }))?;
        }
        Commands::Customer { sub } => match sub {
            CustomerCommands::Add {
                name,
                email,
                phone,
                identity_number,
            } => {
                let customer = services
                    .ledger
                    .add_customer(NewCustomer {
                        name,
                        email,
                        phone,
                        identity_number,
                    })
                    .await?;
                print_json(&customer)?;
            }
            CustomerCommands::List => print_json(&services.ledger.list_customers().await?)?,
            CustomerCommands::Show { candidate } => {
                let customer = services
                    .ledger
                    .find_customer(&candidate)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("No customer matches {}", candidate))?;
                print_json(&customer)?;
            }
            CustomerCommands::Summary { customer_id } => {
                print_json(&services.ledger.summary(&customer_id).await?)?
            }
        },
        Commands::Sync { candidate } => match candidate {
            Some(candidate) => print_json(&services.synchronizer.sync(&candidate).await?)?,
            None => print_json(&services.synchronizer.sync_all().await?)?,
        },
        Commands::SetStatus {
            customer_id,
            document_id,
            status,
            remarks,
        } => {
            let change = services
                .ledger
                .update_document_status(&customer_id, document_id, status, remarks)
                .await?;
            print_json(&change)?;
        }
        Commands::Link {
            customer_id,
            document,
            remarks,
        } => {
            let link =
                services
                    .ledger
                    .generate_upload_link(&customer_id, document, remarks.as_deref());
            println!("{}", link);
        }
        Commands::Usage => {
            let usage = services.intake.usage().await?;
            print_json(&serde_json::json!({
                "metadata": format_bytes(usage.metadata_bytes),
                "blobs": format_bytes(usage.blob_bytes),
                "total": format_bytes(usage.total_bytes),
                "limit": format_bytes(usage.limit_bytes),
                "percent_used": format!("{:.1}", usage.percent_used()),
                "warning": usage.is_over_warning(),
            }))?;
        }
    }

    Ok(())
}
