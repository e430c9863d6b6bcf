//! Bookscan CLI - ISBN metadata lookup and export
//!
//! This binary can:
//! - Look up one or more ISBNs interactively
//! - Process an identifier file in batch, with retries
//! - Export the results as CSV
//! - Create one Notion database page per book

mod batch;

use anyhow::{Context, Result};
use bookscan_core::record::CanonicalRecord;
use bookscan_core::sources::{self, GoogleBooks, OpenLibrary};
use bookscan_core::{IdentifierSet, NotionCredentials, Pipeline, config, credentials, sink};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "bookscan")]
#[command(version)]
#[command(about = "Look up book metadata by ISBN, export CSV, publish to Notion")]
#[command(long_about = "
Bookscan looks up ISBNs in Google Books and Open Library, reconciles the
two answers into one record per book, and exports the result as CSV or
as pages in a Notion database.

Quick start:
  1. Look up a book:      bookscan lookup 9780143127741
  2. Process a file:      bookscan batch isbns.txt --csv books.csv
  3. Store Notion keys:   bookscan credentials --token <T> --database <ID>
  4. Publish to Notion:   bookscan batch isbns.txt --notion
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Look up ISBNs once, without retries
    Lookup {
        /// ISBNs to look up (duplicates are ignored)
        #[arg(required = true)]
        isbns: Vec<String>,

        /// Also write the results to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Process an identifier file (one ISBN per line) into CSV or Notion
    Batch {
        /// Identifier file
        file: PathBuf,

        /// CSV output path [default: book_data.csv]
        #[arg(long, conflicts_with = "notion")]
        csv: Option<PathBuf>,

        /// Create a Notion page for every record instead of writing CSV
        #[arg(long)]
        notion: bool,

        /// Identifiers resolved at once (overrides config)
        #[arg(short, long)]
        concurrency: Option<usize>,
    },

    /// Store the Notion token and database id
    Credentials {
        /// Notion integration token
        #[arg(long)]
        token: String,

        /// Notion database id
        #[arg(long)]
        database: String,
    },

    /// Show configuration paths and settings
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    format!("bookscan={},bookscan_core={}", log_level, log_level).into()
                }),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Lookup { isbns, csv } => cmd_lookup(&cli, isbns, csv.as_deref()).await,
        Commands::Batch {
            file,
            csv,
            notion,
            concurrency,
        } => {
            let options = batch::BatchOptions {
                file: file.clone(),
                sink: batch::Sink::select(csv.clone(), *notion),
                concurrency: *concurrency,
            };
            batch::run_batch(cli.format, options).await
        }
        Commands::Credentials { token, database } => cmd_credentials(&cli, token, database),
        Commands::Config => cmd_config(&cli),
    }
}

/// Build the Google Books + Open Library pipeline from configuration.
pub(crate) fn build_pipeline(
    app_config: &config::AppConfig,
) -> Result<(Pipeline<GoogleBooks, OpenLibrary>, reqwest::Client)> {
    let http = sources::build_http_client(app_config.request_timeout)
        .context("Failed to create HTTP client")?;
    let pipeline = Pipeline::new(
        GoogleBooks::new(http.clone(), &app_config.google_books_url),
        OpenLibrary::new(http.clone(), &app_config.open_library_url),
    )
    .with_retry(app_config.retry)
    .with_concurrency(app_config.concurrency);
    Ok((pipeline, http))
}

/// Print records as a table or JSON array.
pub(crate) fn print_records(format: OutputFormat, records: &[CanonicalRecord]) {
    match format {
        OutputFormat::Text => {
            for record in records {
                println!();
                println!("ISBN:       {}", record.isbn);
                println!("Title:      {}", record.title);
                println!("Authors:    {}", record.authors);
                println!("Categories: {}", record.categories);
                println!("Pages:      {}", record.page_count);
                println!("Cover:      {}", record.cover_url);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "records": records }));
        }
    }
}

pub(crate) fn write_csv_file(path: &Path, records: &[CanonicalRecord]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;
    sink::csv::write_csv(std::io::BufWriter::new(file), records)
        .with_context(|| format!("Failed to write CSV file {}", path.display()))?;
    tracing::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

async fn cmd_lookup(cli: &Cli, isbns: &[String], csv: Option<&Path>) -> Result<()> {
    let app_config = config::load_app_config();
    let (pipeline, _) = build_pipeline(&app_config)?;

    let mut pending = IdentifierSet::new();
    for isbn in isbns {
        if !pending.add(isbn) {
            tracing::info!("Skipping duplicate or blank ISBN '{}'", isbn);
        }
    }

    let mut records = Vec::with_capacity(pending.len());
    let mut failures = Vec::new();
    for isbn in pending.iter() {
        match pipeline.lookup(isbn).await {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::error!("Lookup failed for {}: {}", isbn, e);
                failures.push(serde_json::json!({ "isbn": isbn, "error": e.to_string() }));
            }
        }
    }

    match cli.format {
        OutputFormat::Text => {
            print_records(cli.format, &records);
            if !failures.is_empty() {
                println!();
                println!(
                    "{} lookups failed; try 'bookscan batch' for automatic retries.",
                    failures.len()
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::json!({
                "records": records,
                "failed": failures,
            }));
        }
    }

    if let Some(path) = csv {
        write_csv_file(path, &records)?;
    }

    Ok(())
}

fn cmd_credentials(cli: &Cli, token: &str, database: &str) -> Result<()> {
    let app_config = config::load_app_config();
    let creds = NotionCredentials {
        token: token.to_string(),
        database_id: database.to_string(),
    };

    credentials::save_credentials(&creds, &app_config.token_file, &app_config.database_file)?;

    match cli.format {
        OutputFormat::Text => {
            println!("Saved Notion token to   {}", app_config.token_file.display());
            println!("Saved Notion database to {}", app_config.database_file.display());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::json!({
                "status": "saved",
                "token_file": app_config.token_file,
                "database_file": app_config.database_file,
            }));
        }
    }

    Ok(())
}

fn cmd_config(cli: &Cli) -> Result<()> {
    let app_config = config::load_app_config();
    let config_path = config::get_config_file_path_string();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration");
            println!("=============");
            println!();
            println!("Config file:      {}", config_path);
            println!("Loaded from:      {}", app_config.source);
            println!("Google Books:     {}", app_config.google_books_url);
            println!("Open Library:     {}", app_config.open_library_url);
            println!(
                "Notion API:       {} (version {})",
                app_config.notion_api_url, app_config.notion_version
            );
            println!("Notion token:     {}", app_config.token_file.display());
            println!("Notion database:  {}", app_config.database_file.display());
            println!("Request timeout:  {}s", app_config.request_timeout.as_secs());
            println!(
                "Retries:          {} attempts, {}ms apart",
                app_config.retry.max_attempts,
                app_config.retry.delay.as_millis()
            );
            println!("Concurrency:      {}", app_config.concurrency);
            println!();
            println!("Environment variables:");
            println!("  BOOKSCAN_GOOGLE_BOOKS_URL - Override Google Books endpoint");
            println!("  BOOKSCAN_OPEN_LIBRARY_URL - Override Open Library endpoint");
            println!("  BOOKSCAN_NOTION_API_URL   - Override Notion API endpoint");
            println!();
            println!("Example config.toml:");
            println!();
            println!("{}", config::generate_example_config());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::json!({
                "config_file": config_path,
                "source": app_config.source.to_string(),
                "google_books_url": app_config.google_books_url,
                "open_library_url": app_config.open_library_url,
                "notion_api_url": app_config.notion_api_url,
                "notion_version": app_config.notion_version,
                "token_file": app_config.token_file,
                "database_file": app_config.database_file,
                "timeout_secs": app_config.request_timeout.as_secs(),
                "retry_attempts": app_config.retry.max_attempts,
                "retry_delay_ms": app_config.retry.delay.as_millis() as u64,
                "concurrency": app_config.concurrency,
            }));
        }
    }

    Ok(())
}
