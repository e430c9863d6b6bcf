//! Batch lookup pipeline.
//!
//! For every unique identifier both sources are queried, the results are
//! reconciled with [`merge`], and the canonical record is collected. The
//! pipeline holds no state between calls; the caller owns the identifier
//! collection.

use crate::error::SourceError;
use crate::identifiers::dedup;
use crate::record::{CanonicalRecord, merge};
use crate::sources::{BookSource, RetryPolicy, fetch_with_retry};
use futures::stream::{self, StreamExt};
use std::time::Instant;

pub struct Pipeline<A, B> {
    primary: A,
    fallback: B,
    retry: RetryPolicy,
    concurrency: usize,
}

impl<A: BookSource, B: BookSource> Pipeline<A, B> {
    /// `primary` wins every field it has data for; `fallback` fills the gaps.
    pub fn new(primary: A, fallback: B) -> Self {
        Self {
            primary,
            fallback,
            retry: RetryPolicy::default(),
            concurrency: 1,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Maximum identifiers resolved at once (at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Interactive lookup: one attempt per source, transport errors propagate.
    pub async fn lookup(&self, isbn: &str) -> Result<CanonicalRecord, SourceError> {
        let (primary, fallback) =
            futures::join!(self.primary.fetch(isbn), self.fallback.fetch(isbn));
        Ok(merge(isbn, primary?, fallback?))
    }

    /// Resolve one identifier under the retry policy. Never fails.
    pub async fn resolve(&self, isbn: &str) -> CanonicalRecord {
        let (primary, fallback) = futures::join!(
            fetch_with_retry(&self.primary, isbn, &self.retry),
            fetch_with_retry(&self.fallback, isbn, &self.retry),
        );

        let record = merge(isbn, primary, fallback);
        if record.is_unresolved() {
            tracing::warn!(isbn = %isbn, "No source returned data");
        } else {
            tracing::debug!(isbn = %isbn, title = %record.title, "Resolved");
        }
        record
    }

    /// Deduplicate `identifiers` and resolve each one.
    ///
    /// Yields exactly one record per unique identifier, in deduplicated
    /// order rather than input order. An identifier nobody knows still
    /// produces an all-"N/A" record.
    pub async fn process<I, S>(&self, identifiers: I) -> Vec<CanonicalRecord>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique = dedup(identifiers);
        let start = Instant::now();

        tracing::info!(
            "Processing {} unique identifiers ({} in flight)",
            unique.len(),
            self.concurrency
        );

        let records: Vec<CanonicalRecord> = stream::iter(unique.iter())
            .map(|isbn| self.resolve(isbn))
            .buffered(self.concurrency)
            .collect()
            .await;

        let unresolved = records.iter().filter(|r| r.is_unresolved()).count();
        tracing::info!(
            "Batch complete: {} records ({} without data) in {:.1}s",
            records.len(),
            unresolved,
            start.elapsed().as_secs_f64()
        );

        records
    }
}
