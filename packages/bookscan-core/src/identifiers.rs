//! Identifier collection.
//!
//! Identifiers are ISBN strings used as the join key across sources. They
//! are not checksum-validated; uniqueness is the only rule enforced.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Deduplicate identifiers with set semantics.
///
/// Entries are trimmed and blanks dropped. The result is in sorted order,
/// not input order.
pub fn dedup<I, S>(identifiers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    identifiers
        .into_iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Parse one identifier per line, ignoring blank lines and duplicates.
pub fn parse_identifiers(text: &str) -> Vec<String> {
    dedup(text.lines())
}

/// Read an identifier file. A missing file is a fatal startup error.
pub fn read_identifiers<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read identifier file {}", path.display()))?;
    let identifiers = parse_identifiers(&content);
    tracing::debug!("Loaded {} identifiers from {:?}", identifiers.len(), path);
    Ok(identifiers)
}

/// Owned accumulator for identifiers gathered one at a time (scans or
/// manual entry).
#[derive(Debug, Clone, Default)]
pub struct IdentifierSet {
    items: BTreeSet<String>,
}

impl IdentifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an identifier. Returns false when it is blank or already present.
    pub fn add(&mut self, isbn: &str) -> bool {
        let isbn = isbn.trim();
        if isbn.is_empty() {
            return false;
        }
        self.items.insert(isbn.to_string())
    }

    pub fn contains(&self, isbn: &str) -> bool {
        self.items.contains(isbn.trim())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.items.into_iter().collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for IdentifierSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = IdentifierSet::new();
        for isbn in iter {
            set.add(isbn.as_ref());
        }
        set
    }
}
