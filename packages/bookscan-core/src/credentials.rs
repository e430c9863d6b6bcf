//! Notion credential files.
//!
//! Two plain-text files, each holding one secret:
//! - the integration token
//! - the id of the database new pages are created in
//!
//! They are read once at startup. A missing or empty file is fatal.

use crate::config::get_config_dir;
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

/// Token file name inside the config directory
pub const TOKEN_FILE_NAME: &str = "notion-token.txt";

/// Database id file name inside the config directory
pub const DATABASE_FILE_NAME: &str = "notion-id.txt";

#[derive(Clone)]
pub struct NotionCredentials {
    pub token: String,
    pub database_id: String,
}

impl std::fmt::Debug for NotionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionCredentials")
            .field("token", &"<redacted>")
            .field("database_id", &self.database_id)
            .finish()
    }
}

/// Default token and database id files in the bookscan config directory.
///
/// Falls back to the working directory when no config directory exists.
pub fn default_credential_paths() -> (PathBuf, PathBuf) {
    credential_paths_in(get_config_dir().as_deref())
}

fn credential_paths_in(dir: Option<&Path>) -> (PathBuf, PathBuf) {
    let path = |name: &str| dir.map(|d| d.join(name)).unwrap_or_else(|| PathBuf::from(name));
    (path(TOKEN_FILE_NAME), path(DATABASE_FILE_NAME))
}

/// Read a single-secret file, trimmed.
fn read_secret(path: &Path, what: &str) -> Result<String> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} file {}", what, path.display()))?;
    let secret = content.trim();
    if secret.is_empty() {
        bail!("{} file {} is empty", what, path.display());
    }
    Ok(secret.to_string())
}

/// Write a single-secret file readable by the owner only.
fn write_secret(path: &Path, secret: &str, what: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir).context("Failed to create credentials directory")?;
        }
    }

    // Set restrictive permissions on Unix before writing
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600) // Owner read/write only
            .open(path)
            .with_context(|| format!("Failed to create {} file", what))?;
        writeln!(file, "{}", secret).with_context(|| format!("Failed to write {} file", what))?;
    }

    #[cfg(not(unix))]
    {
        fs::write(path, format!("{}\n", secret))
            .with_context(|| format!("Failed to write {} file", what))?;
    }

    tracing::debug!("{} saved to {:?}", what, path);
    Ok(())
}

/// Load the Notion token and database id from their files.
pub fn load_credentials<P, Q>(token_path: P, database_path: Q) -> Result<NotionCredentials>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let token = read_secret(token_path.as_ref(), "Notion token")?;
    let database_id = read_secret(database_path.as_ref(), "Notion database id")?;
    tracing::debug!("Notion credentials loaded");
    Ok(NotionCredentials { token, database_id })
}

/// Store the Notion token and database id in their files.
pub fn save_credentials<P, Q>(
    creds: &NotionCredentials,
    token_path: P,
    database_path: Q,
) -> Result<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let token = creds.token.trim();
    let database_id = creds.database_id.trim();
    if token.is_empty() || database_id.is_empty() {
        bail!("Refusing to save empty Notion credentials");
    }

    write_secret(token_path.as_ref(), token, "Notion token")?;
    write_secret(database_path.as_ref(), database_id, "Notion database id")?;
    tracing::info!("Notion credentials saved");
    Ok(())
}
