//! Book metadata sources.
//!
//! Each source queries one external catalog by ISBN and normalizes the
//! response into a [`PartialRecord`]:
//! - Google Books (`volumes?q=isbn:`)
//! - Open Library (`api/books?bibkeys=ISBN:`)

mod google;
mod open_library;
mod retry;

pub use google::{DEFAULT_GOOGLE_BOOKS_URL, GoogleBooks};
pub use open_library::{DEFAULT_OPEN_LIBRARY_URL, OpenLibrary};
pub use retry::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, RetryPolicy, fetch_with_retry};

use crate::error::SourceError;
use crate::record::PartialRecord;
use serde::{Deserialize, Deserializer};
use std::future::Future;
use std::time::Duration;

const USER_AGENT: &str = concat!("bookscan/", env!("CARGO_PKG_VERSION"));

/// A catalog that can be queried for one identifier at a time.
///
/// `fetch` only fails on transport errors. A non-success status, a missing
/// match or an unexpected body shape all yield [`PartialRecord::empty`].
pub trait BookSource {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn fetch(&self, isbn: &str) -> impl Future<Output = Result<PartialRecord, SourceError>> + Send;
}

impl<T: BookSource> BookSource for &T {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn fetch(&self, isbn: &str) -> impl Future<Output = Result<PartialRecord, SourceError>> + Send {
        (**self).fetch(isbn)
    }
}

/// Build the HTTP client shared by all sources and the Notion sink.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, SourceError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| SourceError::Client(e.to_string()))
}

/// Send a prepared GET and return the body of a successful response.
///
/// `Ok(None)` means the server answered with a non-success status.
pub(crate) async fn get_body(
    request: reqwest::RequestBuilder,
    source: &str,
) -> Result<Option<String>, SourceError> {
    let resp = request.send().await?;
    let status = resp.status();
    tracing::debug!(source = source, url = %resp.url(), "Queried catalog");
    if !status.is_success() {
        tracing::debug!(source = source, status = status.as_u16(), "No data: non-success status");
        return Ok(None);
    }

    let body = resp.text().await?;
    Ok(Some(body))
}

/// Decode a field, treating any unexpected JSON shape as absent.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// A list of plain strings, decoded leniently.
pub(crate) fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient::<D, NameList>(deserializer)?
        .map(NameList::into_names)
        .unwrap_or_default())
}

/// Page counts must be non-negative integers; anything else is absent.
pub(crate) fn page_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_u64().and_then(|n| u32::try_from(n).ok()))
}

/// A name-bearing list as catalogs return it.
///
/// Each element is either a plain string or an object carrying a `name`
/// key. Elements are normalized one by one, so a list mixing both shapes
/// keeps every usable name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct NameList(Vec<NameEntry>);

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NameEntry {
    Plain(String),
    Named(NamedName),
    Unrecognized(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedName {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}

impl NameEntry {
    fn into_name(self) -> Option<String> {
        match self {
            NameEntry::Plain(name) => Some(name),
            NameEntry::Named(entry) => entry.name,
            NameEntry::Unrecognized(value) => {
                if !value.is_null() {
                    tracing::debug!("Ignoring unrecognized name entry: {}", value);
                }
                None
            }
        }
    }
}

impl NameList {
    /// Flatten to names in order, dropping unusable and empty entries.
    pub fn into_names(self) -> Vec<String> {
        self.0
            .into_iter()
            .filter_map(NameEntry::into_name)
            .filter(|n| !n.is_empty())
            .collect()
    }
}
