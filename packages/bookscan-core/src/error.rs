//! Error types shared by the lookup sources and the Notion sink.

use thiserror::Error;

/// Transport-level failures talking to a remote service.
///
/// A non-success HTTP status is not an error for the lookup sources; they
/// report "no data" instead. Only failures to complete the exchange end up here.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl SourceError {
    /// Whether retrying the same request might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Network(_))
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            SourceError::Client(e.to_string())
        } else {
            SourceError::Network(e.to_string())
        }
    }
}
