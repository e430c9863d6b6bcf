//! Bookscan Core Library
//!
//! This crate provides the core functionality for Bookscan:
//! - Book metadata lookup (Google Books, Open Library)
//! - Field-level reconciliation of the two sources into one record
//! - Batch processing with deduplication and bounded retries
//! - Export (CSV) and publishing (Notion database pages)
//!
//! # Example
//!
//! ```no_run
//! use bookscan_core::{config, identifiers, sink, sources, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = config::load_app_config();
//!     let http = sources::build_http_client(config.request_timeout)?;
//!
//!     let pipeline = Pipeline::new(
//!         sources::GoogleBooks::new(http.clone(), &config.google_books_url),
//!         sources::OpenLibrary::new(http, &config.open_library_url),
//!     );
//!
//!     let isbns = identifiers::read_identifiers("isbns.txt")?;
//!     let records = pipeline.process(isbns).await;
//!     println!("{}", sink::csv::to_csv_string(&records)?);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod credentials;
pub mod error;
pub mod identifiers;
pub mod pipeline;
pub mod record;
pub mod sink;
pub mod sources;

// Re-export commonly used types
pub use config::{AppConfig, ConfigSource};
pub use credentials::NotionCredentials;
pub use error::SourceError;
pub use identifiers::IdentifierSet;
pub use pipeline::Pipeline;
pub use record::{CanonicalRecord, NOT_AVAILABLE, PageCount, PartialRecord};
pub use sources::{BookSource, GoogleBooks, OpenLibrary, RetryPolicy};
