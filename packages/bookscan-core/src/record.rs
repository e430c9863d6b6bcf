//! Book records and the reconciliation of two sources into one.
//!
//! Each source produces a [`PartialRecord`]. [`merge`] resolves every field
//! independently: the first source wins when its value is non-empty, the
//! second source fills in otherwise, and [`NOT_AVAILABLE`] marks a field
//! neither source could provide.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Sentinel for a field that no source could provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// Separator used when flattening authors and categories.
pub const LIST_SEPARATOR: &str = ", ";

/// Metadata for one identifier as reported by a single source.
///
/// An absent value and an empty list both mean "no data" to [`merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialRecord {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub cover_url: Option<String>,
    pub categories: Vec<String>,
    pub page_count: Option<u32>,
}

impl PartialRecord {
    /// A record with every field absent.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when no field carries usable data.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty_value()
            && self.authors.is_empty_value()
            && self.cover_url.is_empty_value()
            && self.categories.is_empty_value()
            && self.page_count.is_empty_value()
    }
}

/// Canonical page count: a number or the "N/A" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCount {
    Pages(u32),
    NotAvailable,
}

impl PageCount {
    pub fn as_number(&self) -> Option<u32> {
        match self {
            PageCount::Pages(n) => Some(*n),
            PageCount::NotAvailable => None,
        }
    }
}

impl From<Option<u32>> for PageCount {
    fn from(value: Option<u32>) -> Self {
        value.map_or(PageCount::NotAvailable, PageCount::Pages)
    }
}

impl fmt::Display for PageCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageCount::Pages(n) => write!(f, "{}", n),
            PageCount::NotAvailable => write!(f, "{}", NOT_AVAILABLE),
        }
    }
}

impl Serialize for PageCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageCount::Pages(n) => serializer.serialize_u32(*n),
            PageCount::NotAvailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

/// The reconciled record for one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalRecord {
    #[serde(rename = "ISBN")]
    pub isbn: String,
    #[serde(rename = "Title")]
    pub title: String,
    /// Comma-joined author names
    #[serde(rename = "Authors")]
    pub authors: String,
    #[serde(rename = "Cover URL")]
    pub cover_url: String,
    /// Comma-joined categories or subjects
    #[serde(rename = "Categories/Subjects")]
    pub categories: String,
    #[serde(rename = "Page Count")]
    pub page_count: PageCount,
}

impl CanonicalRecord {
    /// Column order used by the tabular export.
    pub const CSV_HEADER: [&'static str; 6] = [
        "ISBN",
        "Title",
        "Authors",
        "Cover URL",
        "Categories/Subjects",
        "Page Count",
    ];

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.isbn.clone(),
            self.title.clone(),
            self.authors.clone(),
            self.cover_url.clone(),
            self.categories.clone(),
            self.page_count.to_string(),
        ]
    }

    pub fn has_cover(&self) -> bool {
        self.cover_url != NOT_AVAILABLE
    }

    /// True when every field fell through to the sentinel.
    pub fn is_unresolved(&self) -> bool {
        self.title == NOT_AVAILABLE
            && self.authors == NOT_AVAILABLE
            && self.cover_url == NOT_AVAILABLE
            && self.categories == NOT_AVAILABLE
            && self.page_count == PageCount::NotAvailable
    }
}

/// Values that can be "empty" for precedence purposes.
///
/// Empty means: `None`, the empty string, an empty list, or the integer 0.
/// Whitespace is not trimmed, so `" "` counts as a value.
pub trait Emptiness {
    fn is_empty_value(&self) -> bool;
}

impl Emptiness for String {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl Emptiness for u32 {
    fn is_empty_value(&self) -> bool {
        *self == 0
    }
}

impl<T> Emptiness for Vec<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Emptiness> Emptiness for Option<T> {
    fn is_empty_value(&self) -> bool {
        self.as_ref().is_none_or(Emptiness::is_empty_value)
    }
}

/// Pick `a` if it is non-empty, else `b` if it is non-empty, else `None`.
///
/// A page count of 0 is treated as missing, so it can never win.
pub fn first_non_empty<T: Emptiness>(a: T, b: T) -> Option<T> {
    if !a.is_empty_value() {
        Some(a)
    } else if !b.is_empty_value() {
        Some(b)
    } else {
        None
    }
}

fn resolve_text(a: Option<String>, b: Option<String>) -> String {
    first_non_empty(a, b)
        .flatten()
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn resolve_list(a: Vec<String>, b: Vec<String>) -> String {
    first_non_empty(a, b)
        .map(|names| names.join(LIST_SEPARATOR))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Reconcile two partial records into one canonical record.
///
/// `primary` takes precedence field by field; `fallback` only fills gaps.
/// Total and deterministic.
pub fn merge(isbn: &str, primary: PartialRecord, fallback: PartialRecord) -> CanonicalRecord {
    CanonicalRecord {
        isbn: isbn.to_string(),
        title: resolve_text(primary.title, fallback.title),
        authors: resolve_list(primary.authors, fallback.authors),
        cover_url: resolve_text(primary.cover_url, fallback.cover_url),
        categories: resolve_list(primary.categories, fallback.categories),
        page_count: first_non_empty(primary.page_count, fallback.page_count)
            .flatten()
            .into(),
    }
}
