//! Destinations for canonical records.
//!
//! - `csv`: tabular export, one row per record
//! - `notion`: one database page per record

pub mod csv;
pub mod notion;

pub use notion::{NotionClient, PublishOutcome, PublishReport};
