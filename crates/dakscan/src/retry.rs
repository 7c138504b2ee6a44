//! Retry policy for compatibility checks.
//!
//! The policy decides *whether* a classified failure is retried
//! ([`RetryPolicy::is_retryable`]) and *how long* to wait between attempts
//! (exponential backoff via backon). It is injected into the
//! [`CompatibilityChecker`](crate::compat::CompatibilityChecker) rather than
//! hard-coded in the check itself.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

use crate::compat::ErrorInfo;

/// Default delay before the first retry.
pub const INITIAL_BACKOFF_MS: u64 = 1_000;

/// Upper bound for any single backoff delay.
pub const MAX_BACKOFF_MS: u64 = 10_000;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: usize = 1;

/// Bounded exponential retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub min_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Maximum number of retries (0 disables retrying).
    pub max_retries: usize,
    /// Whether to add jitter to delays.
    pub with_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_delay: Duration::from_millis(MAX_BACKOFF_MS),
            max_retries: DEFAULT_MAX_RETRIES,
            with_jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with custom bounds. Jitter is enabled.
    #[must_use]
    pub fn new(min_delay: Duration, max_delay: Duration, max_retries: usize) -> Self {
        Self {
            min_delay,
            max_delay,
            max_retries,
            with_jitter: true,
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Set whether to use jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.with_jitter = jitter;
        self
    }

    /// Set the retry bound.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Whether a failure should be attempted again.
    #[must_use]
    pub fn is_retryable(&self, error: &ErrorInfo) -> bool {
        self.max_retries > 0 && error.retryable
    }

    /// Build an exponential backoff strategy from this policy.
    #[must_use]
    pub fn into_backoff(self) -> ExponentialBuilder {
        let mut builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries);

        if self.with_jitter {
            builder = builder.with_jitter();
        }

        builder
    }
}

/// Run `operation` under `policy`, retrying retryable [`ErrorInfo`] failures.
///
/// The error returned after the bound is exhausted is the last one observed,
/// marked as no longer retryable. `label` identifies the operation in debug logs (usually `owner/repo`).
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
    label: &str,
) -> Result<T, ErrorInfo>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ErrorInfo>>,
{
    let attempt = AtomicU32::new(0);

    let retry_op = || {
        attempt.fetch_add(1, Ordering::SeqCst);
        operation()
    };

    retry_op
        .retry(policy.clone().into_backoff())
        .notify(|err: &ErrorInfo, dur: Duration| {
            tracing::debug!(
                operation = label,
                kind = %err.kind,
                attempt = attempt.load(Ordering::SeqCst),
                "Retrying in {:?}: {}",
                dur,
                err.message
            );
        })
        .when(|err: &ErrorInfo| policy.is_retryable(err))
        .await
        .map_err(|mut err| {
            err.retryable = false;
            err
        })
}
