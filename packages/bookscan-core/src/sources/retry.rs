use super::BookSource;
use crate::record::PartialRecord;
use std::time::Duration;
use tokio::time::sleep;

/// Default number of attempts per source and identifier
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default fixed delay between attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Bounded retry with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

/// Fetch `isbn` from `source`, retrying transport failures per `policy`.
///
/// Never fails: when every attempt errors the failure is logged and an
/// empty record is returned.
pub async fn fetch_with_retry<S: BookSource>(
    source: &S,
    isbn: &str,
    policy: &RetryPolicy,
) -> PartialRecord {
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        match source.fetch(isbn).await {
            Ok(record) => return record,
            Err(e) if e.is_transient() && attempt < max_attempts => {
                tracing::warn!(
                    source = source.name(),
                    isbn = %isbn,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    delay_ms = policy.delay.as_millis() as u64,
                    error = %e,
                    "Fetch failed, retrying"
                );
                sleep(policy.delay).await;
            }
            Err(e) => {
                tracing::error!(
                    source = source.name(),
                    isbn = %isbn,
                    attempts = attempt,
                    error = %e,
                    "Fetch failed, giving up"
                );
                break;
            }
        }
    }

    PartialRecord::empty()
}
