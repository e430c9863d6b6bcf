use super::{BookSource, NameList, get_body, lenient, page_count};
use crate::error::SourceError;
use crate::record::PartialRecord;
use serde::Deserialize;
use std::collections::HashMap;

/// Default Open Library base URL
pub const DEFAULT_OPEN_LIBRARY_URL: &str = "https://openlibrary.org";

/// Open Library Books API (`jscmd=data`), keyed by `ISBN:<isbn>`.
#[derive(Debug, Clone)]
pub struct OpenLibrary {
    client: reqwest::Client,
    base_url: String,
}

/// One entry of the bibkeys response.
///
/// `authors` and `subjects` come back either as plain strings or as objects
/// with a `name` key depending on the record; both go through [`NameList`].
#[derive(Debug, Default, Deserialize)]
struct BookData {
    #[serde(default, deserialize_with = "lenient")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    authors: Option<NameList>,
    #[serde(default, deserialize_with = "lenient")]
    cover: Option<Cover>,
    #[serde(default, deserialize_with = "lenient")]
    subjects: Option<NameList>,
    #[serde(default, deserialize_with = "page_count")]
    number_of_pages: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct Cover {
    #[serde(default, deserialize_with = "lenient")]
    medium: Option<String>,
}

impl OpenLibrary {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn bibkey(isbn: &str) -> String {
        format!("ISBN:{}", isbn)
    }

    fn books_request(&self, isbn: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}/api/books", self.base_url))
            .query(&[
                ("bibkeys", Self::bibkey(isbn).as_str()),
                ("format", "json"),
                ("jscmd", "data"),
            ])
    }

    /// Normalize a bibkeys response body for `isbn`.
    pub fn normalize(isbn: &str, body: &str) -> PartialRecord {
        let mut response: HashMap<String, serde_json::Value> = match serde_json::from_str(body) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Open Library returned an unreadable body: {}", e);
                return PartialRecord::empty();
            }
        };

        let Some(entry) = response.remove(&Self::bibkey(isbn)) else {
            return PartialRecord::empty();
        };

        let book: BookData = serde_json::from_value(entry).unwrap_or_default();

        PartialRecord {
            title: book.title,
            authors: book.authors.unwrap_or_default().into_names(),
            cover_url: book.cover.and_then(|c| c.medium),
            categories: book.subjects.unwrap_or_default().into_names(),
            page_count: book.number_of_pages,
        }
    }
}

impl BookSource for OpenLibrary {
    fn name(&self) -> &'static str {
        "open_library"
    }

    async fn fetch(&self, isbn: &str) -> Result<PartialRecord, SourceError> {
        Ok(get_body(self.books_request(isbn), self.name())
            .await?
            .map(|body| Self::normalize(isbn, &body))
            .unwrap_or_default())
    }
}
