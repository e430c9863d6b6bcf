use crate::credentials::NotionCredentials;
use crate::error::SourceError;
use crate::record::CanonicalRecord;
use serde::Serialize;

/// Default Notion API base URL
pub const DEFAULT_NOTION_API_URL: &str = "https://api.notion.com/v1";

/// Notion API version sent with every request
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

/// Status given to every new page
pub const INITIAL_STATUS: &str = "To be read";

#[derive(Debug, Serialize)]
pub struct PagePayload {
    parent: Parent,
    properties: Properties,
    #[serde(skip_serializing_if = "Option::is_none")]
    cover: Option<Cover>,
}

#[derive(Debug, Serialize)]
struct Parent {
    database_id: String,
}

#[derive(Debug, Serialize)]
struct Properties {
    #[serde(rename = "Title")]
    title: TitleProperty,
    #[serde(rename = "Authors")]
    authors: RichTextProperty,
    #[serde(rename = "Categories/Subjects")]
    categories: MultiSelectProperty,
    #[serde(rename = "Page Count")]
    page_count: NumberProperty,
    #[serde(rename = "ISBN")]
    isbn: RichTextProperty,
    #[serde(rename = "Status")]
    status: StatusProperty,
}

#[derive(Debug, Serialize)]
struct TitleProperty {
    title: Vec<RichText>,
}

#[derive(Debug, Serialize)]
struct RichTextProperty {
    rich_text: Vec<RichText>,
}

#[derive(Debug, Serialize)]
struct RichText {
    text: TextContent,
}

#[derive(Debug, Serialize)]
struct TextContent {
    content: String,
}

#[derive(Debug, Serialize)]
struct MultiSelectProperty {
    multi_select: Vec<SelectOption>,
}

#[derive(Debug, Serialize)]
struct SelectOption {
    name: String,
}

#[derive(Debug, Serialize)]
struct NumberProperty {
    number: Option<u32>,
}

#[derive(Debug, Serialize)]
struct StatusProperty {
    status: SelectOption,
}

#[derive(Debug, Serialize)]
struct Cover {
    external: ExternalFile,
}

#[derive(Debug, Serialize)]
struct ExternalFile {
    url: String,
}

fn rich_text(content: &str) -> Vec<RichText> {
    vec![RichText {
        text: TextContent {
            content: content.to_string(),
        },
    }]
}

/// Split a comma-joined category string back into tags.
fn category_tags(categories: &str) -> Vec<SelectOption> {
    categories
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| SelectOption {
            name: name.to_string(),
        })
        .collect()
}

/// Translate a canonical record into a Notion page for `database_id`.
pub fn page_payload(database_id: &str, record: &CanonicalRecord) -> PagePayload {
    PagePayload {
        parent: Parent {
            database_id: database_id.to_string(),
        },
        properties: Properties {
            title: TitleProperty {
                title: rich_text(&record.title),
            },
            authors: RichTextProperty {
                rich_text: rich_text(&record.authors),
            },
            categories: MultiSelectProperty {
                multi_select: category_tags(&record.categories),
            },
            page_count: NumberProperty {
                number: record.page_count.as_number(),
            },
            isbn: RichTextProperty {
                rich_text: rich_text(&record.isbn),
            },
            status: StatusProperty {
                status: SelectOption {
                    name: INITIAL_STATUS.to_string(),
                },
            },
        },
        cover: record.has_cover().then(|| Cover {
            external: ExternalFile {
                url: record.cover_url.clone(),
            },
        }),
    }
}

/// Response to one page creation request.
#[derive(Debug, Clone, Serialize)]
pub struct PublishOutcome {
    pub isbn: String,
    pub status: u16,
    pub body: serde_json::Value,
}

impl PublishOutcome {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Notion's error message, if the body carries one.
    pub fn error_message(&self) -> Option<String> {
        if self.is_success() {
            return None;
        }
        self.body
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .or_else(|| Some(self.body.to_string()))
    }
}

/// Per-record result of a publish run.
#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    pub isbn: String,
    /// HTTP status, absent when the request never completed
    pub status: Option<u16>,
    pub error: Option<String>,
}

impl PublishReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.status.is_some_and(|s| (200..300).contains(&s))
    }
}

impl From<PublishOutcome> for PublishReport {
    fn from(outcome: PublishOutcome) -> Self {
        Self {
            error: outcome.error_message(),
            status: Some(outcome.status),
            isbn: outcome.isbn,
        }
    }
}

/// Creates pages in one Notion database.
#[derive(Debug, Clone)]
pub struct NotionClient {
    client: reqwest::Client,
    api_url: String,
    version: String,
    credentials: NotionCredentials,
}

impl NotionClient {
    pub fn new(
        client: reqwest::Client,
        api_url: &str,
        version: &str,
        credentials: NotionCredentials,
    ) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            version: version.to_string(),
            credentials,
        }
    }

    /// Create one page. A non-success status is reported, not raised.
    pub async fn publish(&self, record: &CanonicalRecord) -> Result<PublishOutcome, SourceError> {
        let url = format!("{}/pages", self.api_url);
        let payload = page_payload(&self.credentials.database_id, record);

        tracing::debug!(isbn = %record.isbn, url = %url, "Creating Notion page");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.credentials.token)
            .header("Notion-Version", self.version.as_str())
            .json(&payload)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let text = resp.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));

        Ok(PublishOutcome {
            isbn: record.isbn.clone(),
            status,
            body,
        })
    }

    /// Publish every record, collecting one report each. Never stops early.
    pub async fn publish_all(&self, records: &[CanonicalRecord]) -> Vec<PublishReport> {
        let mut reports = Vec::with_capacity(records.len());

        for record in records {
            let report = match self.publish(record).await {
                Ok(outcome) => PublishReport::from(outcome),
                Err(e) => PublishReport {
                    isbn: record.isbn.clone(),
                    status: None,
                    error: Some(e.to_string()),
                },
            };

            if report.is_success() {
                tracing::info!("Created Notion page for ISBN {}", report.isbn);
            } else {
                tracing::warn!(
                    "Failed to create page for ISBN {}: {}",
                    report.isbn,
                    report.error.as_deref().unwrap_or("unknown error")
                );
            }
            reports.push(report);
        }

        let failed = reports.iter().filter(|r| !r.is_success()).count();
        tracing::info!("Published {} of {} records", reports.len() - failed, reports.len());
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{PartialRecord, merge};
    use serde_json::json;

    fn record() -> CanonicalRecord {
        merge(
            "9780143127741",
            PartialRecord {
                title: Some("Sapiens".to_string()),
                authors: vec!["Yuval Noah Harari".to_string()],
                cover_url: Some("http://books.google.com/thumb".to_string()),
                categories: vec!["History".to_string(), "Anthropology".to_string()],
                page_count: Some(464),
            },
            PartialRecord::empty(),
        )
    }

    #[test]
    fn test_payload_schema() {
        let payload = serde_json::to_value(page_payload("db-1", &record())).unwrap();
        assert_eq!(
            payload,
            json!({
                "parent": {"database_id": "db-1"},
                "properties": {
                    "Title": {"title": [{"text": {"content": "Sapiens"}}]},
                    "Authors": {"rich_text": [{"text": {"content": "Yuval Noah Harari"}}]},
                    "Categories/Subjects": {
                        "multi_select": [{"name": "History"}, {"name": "Anthropology"}]
                    },
                    "Page Count": {"number": 464},
                    "ISBN": {"rich_text": [{"text": {"content": "9780143127741"}}]},
                    "Status": {"status": {"name": "To be read"}}
                },
                "cover": {"external": {"url": "http://books.google.com/thumb"}}
            })
        );
    }

    #[test]
    fn test_payload_for_unresolved_record() {
        let unresolved = merge("0000000000000", PartialRecord::empty(), PartialRecord::empty());
        let payload = serde_json::to_value(page_payload("db-1", &unresolved)).unwrap();

        assert!(payload.get("cover").is_none());
        assert_eq!(payload["properties"]["Page Count"]["number"], serde_json::Value::Null);
        assert_eq!(
            payload["properties"]["Categories/Subjects"]["multi_select"],
            json!([{"name": "N/A"}])
        );
        assert_eq!(payload["properties"]["Status"]["status"]["name"], "To be read");
    }

    #[test]
    fn test_category_tags_trim_and_skip_blanks() {
        let names: Vec<String> = category_tags(" Fiction ,, Classics,")
            .into_iter()
            .map(|o| o.name)
            .collect();
        assert_eq!(names, vec!["Fiction", "Classics"]);
    }

    #[test]
    fn test_outcome_error_message() {
        let ok = PublishOutcome {
            isbn: "1".to_string(),
            status: 200,
            body: json!({"object": "page"}),
        };
        assert!(ok.is_success());
        assert!(ok.error_message().is_none());

        let rejected = PublishOutcome {
            isbn: "1".to_string(),
            status: 400,
            body: json!({"object": "error", "message": "Title is not a property"}),
        };
        let report = PublishReport::from(rejected);
        assert!(!report.is_success());
        assert_eq!(report.status, Some(400));
        assert_eq!(report.error.as_deref(), Some("Title is not a property"));
    }

    #[tokio::test]
    async fn test_publish_all_collects_every_failure() {
        // Nothing listens on port 1, so every request fails at connect time.
        let client = NotionClient::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1/v1",
            DEFAULT_NOTION_VERSION,
            NotionCredentials {
                token: "secret".to_string(),
                database_id: "db-1".to_string(),
            },
        );
        let records = vec![
            record(),
            merge("0000000000000", PartialRecord::empty(), PartialRecord::empty()),
        ];

        let reports = client.publish_all(&records).await;
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| !r.is_success() && r.status.is_none()));
        assert_eq!(reports[1].isbn, "0000000000000");
    }
}
