//! HTTP-level tests against a local server with canned responses

use bookscan_core::record::merge;
use bookscan_core::sink::NotionClient;
use bookscan_core::sink::notion::DEFAULT_NOTION_VERSION;
use bookscan_core::{BookSource, GoogleBooks, NotionCredentials, OpenLibrary, PartialRecord};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Serve `responses` in order, one per connection, repeating the last one.
///
/// Returns the base URL and a counter of requests served.
async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let served = Arc::new(AtomicUsize::new(0));

    let counter = served.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let index = counter.fetch_add(1, Ordering::SeqCst);
            let (status, body) = responses[index.min(responses.len() - 1)];
            tokio::spawn(respond(socket, status, body));
        }
    });

    (format!("http://{}", addr), served)
}

async fn respond(mut socket: TcpStream, status: u16, body: &'static str) {
    read_request(&mut socket).await;
    let response = format!(
        "HTTP/1.1 {} Canned\r\ncontent-type: application/json\r\n\
         content-length: {}\r\nconnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    socket.write_all(response.as_bytes()).await.unwrap();
    socket.shutdown().await.ok();
}

/// Read headers and any `content-length` body so the client sees a clean exchange.
async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= header_end + 4 + content_length {
            return;
        }
    }
}

const GOOGLE_BODY: &str = r#"{"items": [{"volumeInfo": {"title": "Sapiens", "pageCount": 464}}]}"#;
const OPEN_LIBRARY_BODY: &str = r#"{"ISBN:9780441013593": {"title": "Dune"}}"#;

fn notion(base: &str) -> NotionClient {
    let credentials = NotionCredentials {
        token: "secret".to_string(),
        database_id: "db-1".to_string(),
    };
    NotionClient::new(reqwest::Client::new(), base, DEFAULT_NOTION_VERSION, credentials)
}

#[tokio::test]
async fn test_google_books_error_status_is_no_data() {
    // A usable body must still be ignored when the status is not 2xx.
    let (base, served) = serve(vec![(503, GOOGLE_BODY)]).await;
    let source = GoogleBooks::new(reqwest::Client::new(), &base);

    let record = source.fetch("9780143127741").await.unwrap();
    assert_eq!(record, PartialRecord::empty());
    assert_eq!(served.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_google_books_success_is_normalized() {
    let (base, _) = serve(vec![(200, GOOGLE_BODY)]).await;
    let source = GoogleBooks::new(reqwest::Client::new(), &base);

    let record = source.fetch("9780143127741").await.unwrap();
    assert_eq!(record.title.as_deref(), Some("Sapiens"));
    assert_eq!(record.page_count, Some(464));
}

#[tokio::test]
async fn test_open_library_error_status_is_no_data() {
    let (base, _) = serve(vec![(404, OPEN_LIBRARY_BODY)]).await;
    let source = OpenLibrary::new(reqwest::Client::new(), &base);

    let record = source.fetch("9780441013593").await.unwrap();
    assert_eq!(record, PartialRecord::empty());
}

#[tokio::test]
async fn test_open_library_success_is_normalized() {
    let (base, _) = serve(vec![(200, OPEN_LIBRARY_BODY)]).await;
    let source = OpenLibrary::new(reqwest::Client::new(), &base);

    let record = source.fetch("9780441013593").await.unwrap();
    assert_eq!(record.title.as_deref(), Some("Dune"));
}

#[tokio::test]
async fn test_publish_reports_rejection_status_and_body() {
    let rejection = r#"{"object": "error", "status": 400, "message": "Status is not a property"}"#;
    let (base, _) = serve(vec![(400, rejection)]).await;
    let client = notion(&base);
    let record = merge("1", PartialRecord::empty(), PartialRecord::empty());

    let outcome = client.publish(&record).await.unwrap();
    assert_eq!(outcome.status, 400);
    assert!(!outcome.is_success());
    assert_eq!(outcome.body["message"], "Status is not a property");
}

#[tokio::test]
async fn test_publish_all_continues_after_rejection() {
    let rejection = r#"{"object": "error", "message": "Title is not a property"}"#;
    let (base, served) = serve(vec![
        (400, rejection),
        (500, "upstream down"),
        (200, r#"{"object": "page"}"#),
    ])
    .await;
    let client = notion(&base);
    let records: Vec<_> = ["1", "2", "3"]
        .into_iter()
        .map(|isbn| merge(isbn, PartialRecord::empty(), PartialRecord::empty()))
        .collect();

    let reports = client.publish_all(&records).await;
    assert_eq!(served.load(Ordering::SeqCst), 3);
    assert_eq!(reports.len(), 3);

    assert_eq!(reports[0].isbn, "1");
    assert_eq!(reports[0].status, Some(400));
    assert_eq!(reports[0].error.as_deref(), Some("Title is not a property"));

    // Non-JSON bodies are kept as a string and reported as-is.
    assert_eq!(reports[1].status, Some(500));
    assert!(reports[1].error.as_deref().is_some_and(|e| e.contains("upstream down")));

    assert!(reports[2].is_success());
    assert_eq!(reports[2].status, Some(200));
}
