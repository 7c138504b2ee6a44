//! Collects per-repository check failures into a reportable summary.

use serde::{Deserialize, Serialize};

use crate::compat::{ErrorInfo, ErrorKind};

/// Failed repositories grouped by failure kind.
///
/// Each list holds repository full names. `NotFound` failures (repository
/// gone or blocked) are reported under `other`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanningErrorSummary {
    pub total_errors: usize,
    pub rate_limited: Vec<String>,
    pub network_errors: Vec<String>,
    pub server_errors: Vec<String>,
    pub other: Vec<String>,
    /// Longest wait the platform asked for across rate-limited checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

impl ScanningErrorSummary {
    /// One-line description for display, e.g.
    /// "3 of 40 repositories could not be checked".
    pub fn describe(&self, total: usize) -> String {
        let noun = if total == 1 { "repository" } else { "repositories" };
        let mut text = format!(
            "{} of {total} {noun} could not be checked",
            self.total_errors
        );
        if !self.rate_limited.is_empty() {
            text.push_str(&format!(" ({} rate limited", self.rate_limited.len()));
            if let Some(secs) = self.retry_after_seconds {
                text.push_str(&format!(", retry in {secs}s"));
            }
            text.push(')');
        }
        text
    }

    /// Every failed repository, bucket by bucket.
    pub fn repositories(&self) -> impl Iterator<Item = &str> {
        self.rate_limited
            .iter()
            .chain(&self.network_errors)
            .chain(&self.server_errors)
            .chain(&self.other)
            .map(String::as_str)
    }
}

/// Accumulates failures during one scan.
#[derive(Debug, Default)]
pub struct ErrorAggregator {
    summary: ScanningErrorSummary,
}

impl ErrorAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a terminal failure for `repository`.
    pub fn record(&mut self, repository: &str, error: &ErrorInfo) {
        let bucket = match error.kind {
            ErrorKind::RateLimit => {
                if let Some(secs) = error.retry_after_seconds {
                    let current = self.summary.retry_after_seconds.get_or_insert(secs);
                    *current = (*current).max(secs);
                }
                &mut self.summary.rate_limited
            }
            ErrorKind::Network => &mut self.summary.network_errors,
            ErrorKind::ServerError => &mut self.summary.server_errors,
            ErrorKind::NotFound | ErrorKind::Other => &mut self.summary.other,
        };
        bucket.push(repository.to_string());
        self.summary.total_errors += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.summary.total_errors == 0
    }

    /// The summary, or `None` when nothing was recorded.
    pub fn summarize(&self) -> Option<ScanningErrorSummary> {
        (!self.is_empty()).then(|| self.summary.clone())
    }

    /// Like [`summarize`](Self::summarize), consuming the aggregator.
    pub fn into_summary(self) -> Option<ScanningErrorSummary> {
        (!self.is_empty()).then_some(self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(kind: ErrorKind, retry_after_seconds: Option<u64>) -> ErrorInfo {
        ErrorInfo {
            kind,
            message: "failed".to_string(),
            retryable: matches!(
                kind,
                ErrorKind::RateLimit | ErrorKind::Network | ErrorKind::ServerError
            ),
            retry_after_seconds,
        }
    }

    #[test]
    fn empty_aggregator_summarizes_to_none() {
        let aggregator = ErrorAggregator::new();
        assert!(aggregator.is_empty());
        assert_eq!(aggregator.summarize(), None);
        assert_eq!(aggregator.into_summary(), None);
    }

    #[test]
    fn failures_are_bucketed_by_kind() {
        let mut aggregator = ErrorAggregator::new();
        aggregator.record("who/a", &info(ErrorKind::RateLimit, Some(30)));
        aggregator.record("who/b", &info(ErrorKind::RateLimit, Some(90)));
        aggregator.record("who/c", &info(ErrorKind::Network, None));
        aggregator.record("who/d", &info(ErrorKind::ServerError, None));
        aggregator.record("who/e", &info(ErrorKind::NotFound, None));
        aggregator.record("who/f", &info(ErrorKind::Other, None));

        let summary = aggregator.summarize().expect("failures were recorded");
        assert_eq!(summary.total_errors, 6);
        assert_eq!(summary.rate_limited, vec!["who/a", "who/b"]);
        assert_eq!(summary.network_errors, vec!["who/c"]);
        assert_eq!(summary.server_errors, vec!["who/d"]);
        assert_eq!(summary.other, vec!["who/e", "who/f"]);
        assert_eq!(summary.retry_after_seconds, Some(90));
        assert_eq!(summary.repositories().count(), 6);
    }

    #[test]
    fn describe_reports_counts() {
        let mut aggregator = ErrorAggregator::new();
        aggregator.record("who/a", &info(ErrorKind::Network, None));
        let summary = aggregator.into_summary().expect("one failure");
        assert_eq!(
            summary.describe(4),
            "1 of 4 repositories could not be checked"
        );
    }

    #[test]
    fn describe_mentions_rate_limit_wait() {
        let mut aggregator = ErrorAggregator::new();
        aggregator.record("who/a", &info(ErrorKind::RateLimit, Some(45)));
        let summary = aggregator.into_summary().expect("one failure");
        assert_eq!(
            summary.describe(1),
            "1 of 1 repository could not be checked (1 rate limited, retry in 45s)"
        );
    }
}
