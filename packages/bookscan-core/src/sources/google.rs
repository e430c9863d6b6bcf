use super::{BookSource, get_body, lenient, lenient_strings, page_count};
use crate::error::SourceError;
use crate::record::PartialRecord;
use serde::Deserialize;

/// Default Google Books API base URL
pub const DEFAULT_GOOGLE_BOOKS_URL: &str = "https://www.googleapis.com/books/v1";

/// Google Books volumes search, matched on `isbn:`.
#[derive(Debug, Clone)]
pub struct GoogleBooks {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default, deserialize_with = "lenient")]
    items: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    #[serde(default, deserialize_with = "lenient")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    authors: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    image_links: Option<ImageLinks>,
    #[serde(default, deserialize_with = "lenient_strings")]
    categories: Vec<String>,
    #[serde(default, deserialize_with = "page_count")]
    page_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ImageLinks {
    #[serde(default, deserialize_with = "lenient")]
    thumbnail: Option<String>,
}

impl GoogleBooks {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn volumes_request(&self, isbn: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}/volumes", self.base_url))
            .query(&[("q", format!("isbn:{}", isbn))])
    }

    /// Normalize a `volumes` response body. Only the first item is used.
    pub fn normalize(body: &str) -> PartialRecord {
        let response: VolumesResponse = match serde_json::from_str(body) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Google Books returned an unreadable body: {}", e);
                return PartialRecord::empty();
            }
        };

        let Some(first) = response.items.and_then(|items| items.into_iter().next()) else {
            return PartialRecord::empty();
        };

        let info: VolumeInfo = first
            .get("volumeInfo")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();

        PartialRecord {
            title: info.title,
            authors: info.authors,
            cover_url: info.image_links.and_then(|links| links.thumbnail),
            categories: info.categories,
            page_count: info.page_count,
        }
    }
}

impl BookSource for GoogleBooks {
    fn name(&self) -> &'static str {
        "google_books"
    }

    async fn fetch(&self, isbn: &str) -> Result<PartialRecord, SourceError> {
        Ok(get_body(self.volumes_request(isbn), self.name())
            .await?
            .map(|body| Self::normalize(&body))
            .unwrap_or_default())
    }
}
