//! Batch mode: process an identifier file end to end
//!
//! This module runs the full flow:
//! - Reads the identifier file (fatal if unreadable)
//! - Loads Notion credentials up front when publishing (fatal if missing)
//! - Resolves every unique identifier with retries
//! - Hands the records to exactly one sink: the CSV export or Notion

use crate::{OutputFormat, build_pipeline, write_csv_file};
use anyhow::{Context, Result};
use bookscan_core::sink::{NotionClient, PublishReport};
use bookscan_core::{config, credentials, identifiers};
use std::path::PathBuf;

/// Default CSV export path
pub const DEFAULT_CSV_PATH: &str = "book_data.csv";

/// Where a batch's records go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    Csv(PathBuf),
    Notion,
}

impl Sink {
    /// Notion when requested, otherwise CSV at `csv` or the default path.
    pub fn select(csv: Option<PathBuf>, notion: bool) -> Self {
        if notion {
            Sink::Notion
        } else {
            Sink::Csv(csv.unwrap_or_else(|| PathBuf::from(DEFAULT_CSV_PATH)))
        }
    }
}

/// Options collected from the `batch` subcommand
pub struct BatchOptions {
    pub file: PathBuf,
    pub sink: Sink,
    pub concurrency: Option<usize>,
}

/// Run one batch from identifier file to outputs
pub async fn run_batch(format: OutputFormat, options: BatchOptions) -> Result<()> {
    let app_config = config::load_app_config();

    let ids = identifiers::read_identifiers(&options.file)?;
    tracing::info!("Read {} identifiers from {}", ids.len(), options.file.display());

    // Credentials are checked before any lookups run
    let notion_credentials = if options.sink == Sink::Notion {
        let creds = credentials::load_credentials(&app_config.token_file, &app_config.database_file)
            .context("Notion publishing needs credentials; run 'bookscan credentials' first")?;
        Some(creds)
    } else {
        None
    };

    let (mut pipeline, http) = build_pipeline(&app_config)?;
    if let Some(n) = options.concurrency {
        pipeline = pipeline.with_concurrency(n);
    }

    let records = pipeline.process(&ids).await;

    let reports: Vec<PublishReport> = match (&options.sink, notion_credentials) {
        (Sink::Csv(path), _) => {
            write_csv_file(path, &records)?;
            Vec::new()
        }
        (Sink::Notion, Some(creds)) => {
            let client = NotionClient::new(
                http,
                &app_config.notion_api_url,
                &app_config.notion_version,
                creds,
            );
            client.publish_all(&records).await
        }
        (Sink::Notion, None) => Vec::new(),
    };

    let unresolved = records.iter().filter(|r| r.is_unresolved()).count();
    let published = reports.iter().filter(|r| r.is_success()).count();

    match format {
        OutputFormat::Text => {
            println!("Processed {} unique identifiers", records.len());
            if unresolved > 0 {
                println!("  {} without data from either source", unresolved);
            }
            match &options.sink {
                Sink::Csv(path) => println!("  CSV written to {}", path.display()),
                Sink::Notion => {
                    println!("  {} of {} Notion pages created", published, reports.len());
                    for report in reports.iter().filter(|r| !r.is_success()) {
                        println!(
                            "    {}: {}",
                            report.isbn,
                            report.error.as_deref().unwrap_or("unknown error")
                        );
                    }
                }
            }
        }
        OutputFormat::Json => {
            let (csv, notion) = match &options.sink {
                Sink::Csv(path) => (Some(path), None),
                Sink::Notion => (None, Some(&reports)),
            };
            println!("{}", serde_json::json!({
                "records": records,
                "unresolved": unresolved,
                "csv": csv,
                "notion": notion,
            }));
        }
    }

    Ok(())
}
