//! Runtime configuration.
//!
//! Values are layered with priority:
//! 1. Environment variables (`BOOKSCAN_*_URL`)
//! 2. Config file (`~/.config/bookscan/config.toml`)
//! 3. Default values

use crate::credentials::default_credential_paths;
use crate::sink::notion::{DEFAULT_NOTION_API_URL, DEFAULT_NOTION_VERSION};
use crate::sources::{
    DEFAULT_GOOGLE_BOOKS_URL, DEFAULT_MAX_ATTEMPTS, DEFAULT_OPEN_LIBRARY_URL, DEFAULT_RETRY_DELAY,
    RetryPolicy,
};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Default per-request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Environment variable names for endpoint overrides
const ENV_GOOGLE_BOOKS_URL: &str = "BOOKSCAN_GOOGLE_BOOKS_URL";
const ENV_OPEN_LIBRARY_URL: &str = "BOOKSCAN_OPEN_LIBRARY_URL";
const ENV_NOTION_API_URL: &str = "BOOKSCAN_NOTION_API_URL";

/// Configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    sources: Option<SourcesConfig>,
    notion: Option<NotionConfig>,
    fetch: Option<FetchConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct SourcesConfig {
    /// Google Books API base (e.g., "https://www.googleapis.com/books/v1")
    google_books_url: Option<String>,
    /// Open Library base (e.g., "https://openlibrary.org")
    open_library_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct NotionConfig {
    api_url: Option<String>,
    api_version: Option<String>,
    /// File holding the integration token
    token_file: Option<PathBuf>,
    /// File holding the target database id
    database_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct FetchConfig {
    timeout_secs: Option<u64>,
    retry_attempts: Option<u32>,
    retry_delay_ms: Option<u64>,
    concurrency: Option<usize>,
}

/// Effective runtime configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub google_books_url: String,
    pub open_library_url: String,
    pub notion_api_url: String,
    pub notion_version: String,
    pub token_file: PathBuf,
    pub database_file: PathBuf,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub concurrency: usize,
    /// Highest-priority layer that contributed a value (for logging)
    pub source: ConfigSource,
}

/// Where the configuration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigSource {
    /// Using default hardcoded values
    Default,
    /// Loaded from config file
    ConfigFile,
    /// Loaded from environment variable
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::ConfigFile => write!(f, "config file"),
        }
    }
}

/// Get the bookscan config directory
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .map(|p| p.join("bookscan"))
}

/// Get the path to the configuration file
fn get_config_file_path() -> Option<PathBuf> {
    get_config_dir().map(|p| p.join("config.toml"))
}

/// Parse config file content.
pub fn parse_config(content: &str) -> Result<ConfigFile, toml::de::Error> {
    toml::from_str(content)
}

/// Load configuration from the config file
fn load_config_file() -> Option<ConfigFile> {
    let path = get_config_file_path()?;

    if !path.exists() {
        return None;
    }

    match fs::read_to_string(&path) {
        Ok(content) => match parse_config(&content) {
            Ok(config) => {
                tracing::debug!("Loaded config from {:?}", path);
                Some(config)
            }
            Err(e) => {
                tracing::warn!("Failed to parse config file {:?}: {}", path, e);
                None
            }
        },
        Err(e) => {
            tracing::warn!("Failed to read config file {:?}: {}", path, e);
            None
        }
    }
}

fn clean_url(url: &str) -> Option<String> {
    let url = url.trim().trim_end_matches('/');
    (!url.is_empty()).then(|| url.to_string())
}

/// Pick a URL from env, then file, then default, tracking the source.
fn layered_url(
    env: Option<String>,
    file: Option<&String>,
    default: &str,
    source: &mut ConfigSource,
) -> String {
    if let Some(url) = env.as_deref().and_then(clean_url) {
        *source = (*source).max(ConfigSource::Environment);
        return url;
    }
    if let Some(url) = file.and_then(|u| clean_url(u)) {
        *source = (*source).max(ConfigSource::ConfigFile);
        return url;
    }
    default.to_string()
}

/// Combine a parsed config file and an environment lookup into the
/// effective configuration.
pub fn resolve_config<E>(file: Option<ConfigFile>, env: E) -> AppConfig
where
    E: Fn(&str) -> Option<String>,
{
    let file = file.unwrap_or_default();
    let sources = file.sources.unwrap_or_default();
    let notion = file.notion.unwrap_or_default();
    let fetch = file.fetch.unwrap_or_default();

    let mut source = ConfigSource::Default;

    let google_books_url = layered_url(
        env(ENV_GOOGLE_BOOKS_URL),
        sources.google_books_url.as_ref(),
        DEFAULT_GOOGLE_BOOKS_URL,
        &mut source,
    );
    let open_library_url = layered_url(
        env(ENV_OPEN_LIBRARY_URL),
        sources.open_library_url.as_ref(),
        DEFAULT_OPEN_LIBRARY_URL,
        &mut source,
    );
    let notion_api_url = layered_url(
        env(ENV_NOTION_API_URL),
        notion.api_url.as_ref(),
        DEFAULT_NOTION_API_URL,
        &mut source,
    );

    let file_values_present = notion.api_version.is_some()
        || notion.token_file.is_some()
        || notion.database_file.is_some()
        || fetch.timeout_secs.is_some()
        || fetch.retry_attempts.is_some()
        || fetch.retry_delay_ms.is_some()
        || fetch.concurrency.is_some();
    if file_values_present {
        source = source.max(ConfigSource::ConfigFile);
    }

    let (default_token_file, default_database_file) = default_credential_paths();

    AppConfig {
        google_books_url,
        open_library_url,
        notion_api_url,
        notion_version: notion
            .api_version
            .unwrap_or_else(|| DEFAULT_NOTION_VERSION.to_string()),
        token_file: notion
            .token_file
            .unwrap_or(default_token_file),
        database_file: notion
            .database_file
            .unwrap_or(default_database_file),
        request_timeout: Duration::from_secs(fetch.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        retry: RetryPolicy::new(
            fetch.retry_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
            fetch
                .retry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_RETRY_DELAY),
        ),
        concurrency: fetch.concurrency.unwrap_or(1).max(1),
        source,
    }
}

/// Load the effective configuration from environment, config file and defaults.
pub fn load_app_config() -> AppConfig {
    let config = resolve_config(load_config_file(), |key| std::env::var(key).ok());
    tracing::debug!("Using configuration from {}", config.source);
    config
}

/// Get the path to the config file for documentation purposes
pub fn get_config_file_path_string() -> String {
    get_config_file_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "~/.config/bookscan/config.toml".to_string())
}

/// Generate example config file content
pub fn generate_example_config() -> String {
    r#"# Bookscan Configuration
# Place this file at: ~/.config/bookscan/config.toml

[sources]
# Catalog endpoints (override for mirrors or proxies)
# google_books_url = "https://www.googleapis.com/books/v1"
# open_library_url = "https://openlibrary.org"

[notion]
# api_url = "https://api.notion.com/v1"
# api_version = "2022-06-28"
# token_file = "/path/to/notion-token.txt"
# database_file = "/path/to/notion-id.txt"

[fetch]
# timeout_secs = 10
# retry_attempts = 3
# retry_delay_ms = 2000
# concurrency = 1
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{DATABASE_FILE_NAME, TOKEN_FILE_NAME};

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let config = resolve_config(None, no_env);
        assert_eq!(config.google_books_url, DEFAULT_GOOGLE_BOOKS_URL);
        assert_eq!(config.open_library_url, DEFAULT_OPEN_LIBRARY_URL);
        assert_eq!(config.notion_api_url, "https://api.notion.com/v1");
        assert_eq!(config.notion_version, "2022-06-28");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.source, ConfigSource::Default);
        assert!(config.token_file.ends_with(TOKEN_FILE_NAME));
        assert!(config.database_file.ends_with(DATABASE_FILE_NAME));
    }

    #[test]
    fn test_config_file_values() {
        let file = parse_config(
            r#"
            [sources]
            open_library_url = "http://localhost:8080/"

            [notion]
            token_file = "/tmp/token.txt"

            [fetch]
            retry_attempts = 5
            retry_delay_ms = 250
            concurrency = 4
            "#,
        )
        .unwrap();

        let config = resolve_config(Some(file), no_env);
        assert_eq!(config.open_library_url, "http://localhost:8080");
        assert_eq!(config.google_books_url, DEFAULT_GOOGLE_BOOKS_URL);
        assert_eq!(config.token_file, PathBuf::from("/tmp/token.txt"));
        assert_eq!(config.retry, RetryPolicy::new(5, Duration::from_millis(250)));
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.source, ConfigSource::ConfigFile);
    }

    #[test]
    fn test_env_overrides_file() {
        let file = parse_config(
            r#"
            [sources]
            google_books_url = "http://from-file"
            "#,
        )
        .unwrap();

        let config = resolve_config(Some(file), |key| {
            (key == ENV_GOOGLE_BOOKS_URL).then(|| " http://from-env/ ".to_string())
        });
        assert_eq!(config.google_books_url, "http://from-env");
        assert_eq!(config.source, ConfigSource::Environment);
    }

    #[test]
    fn test_blank_values_fall_through() {
        let file = parse_config(
            r#"
            [sources]
            google_books_url = "  "
            "#,
        )
        .unwrap();

        let config = resolve_config(Some(file), |_| Some(String::new()));
        assert_eq!(config.google_books_url, DEFAULT_GOOGLE_BOOKS_URL);
        assert_eq!(config.source, ConfigSource::Default);
    }

    #[test]
    fn test_invalid_config_is_error() {
        assert!(parse_config("[fetch]\nretry_attempts = \"three\"").is_err());
    }

    #[test]
    fn test_example_config_parses() {
        assert!(parse_config(&generate_example_config()).is_ok());
    }
}
