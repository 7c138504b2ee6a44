//! Per-repository DAK compatibility check.
//!
//! A repository is a DAK when its marker file (`sushi-config.yaml` by
//! default) declares the base DAK dependency (`smart.who.int.base`). A
//! missing marker file is a plain negative, not a failure. Every other
//! platform failure is classified exactly once into an [`ErrorInfo`].

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_yaml_ng::Value;

use crate::platform::{PlatformClient, PlatformError, short_error_message};
use crate::retry::{RetryPolicy, with_retry};

/// Default marker file inspected in each repository.
pub const DEFAULT_MARKER_PATH: &str = "sushi-config.yaml";

/// Default dependency key identifying a DAK.
pub const DEFAULT_DEPENDENCY_KEY: &str = "smart.who.int.base";

/// Failure categories reported for a repository check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    RateLimit,
    NotFound,
    Network,
    ServerError,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RateLimit => "rate_limit",
            Self::NotFound => "not_found",
            Self::Network => "network",
            Self::ServerError => "server_error",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// A classified check failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

impl ErrorInfo {
    /// Classify a platform error.
    ///
    /// Returns `None` for [`PlatformError::NotFound`]: an absent marker file
    /// is a negative result, never a failure.
    pub fn classify(err: &PlatformError) -> Option<Self> {
        Self::classify_at(err, Utc::now())
    }

    /// Same as [`classify`](Self::classify) with an explicit "now" for
    /// computing rate-limit waits.
    pub fn classify_at(err: &PlatformError, now: DateTime<Utc>) -> Option<Self> {
        let (kind, retryable) = match err {
            PlatformError::NotFound { .. } => return None,
            PlatformError::RateLimited { .. } => (ErrorKind::RateLimit, true),
            PlatformError::Network { .. } => (ErrorKind::Network, true),
            PlatformError::Server { .. } => (ErrorKind::ServerError, true),
            PlatformError::RepositoryUnavailable { .. } => (ErrorKind::NotFound, false),
            PlatformError::Api { .. }
            | PlatformError::AuthRequired
            | PlatformError::Internal { .. } => (ErrorKind::Other, false),
        };

        Some(Self {
            kind,
            message: short_error_message(err),
            retryable,
            retry_after_seconds: err.retry_after_secs(now),
        })
    }

    /// An `Other` failure that did not come from the platform.
    pub fn other(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Other,
            message: message.into(),
            retryable: false,
            retry_after_seconds: None,
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Outcome of checking one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityResult {
    /// Full name (`owner/name`) of the checked repository.
    pub repository: String,
    pub compatible: bool,
    pub error: Option<ErrorInfo>,
}

impl CompatibilityResult {
    fn settled(repository: String, compatible: bool) -> Self {
        Self {
            repository,
            compatible,
            error: None,
        }
    }

    fn failed(repository: String, error: ErrorInfo) -> Self {
        Self {
            repository,
            compatible: false,
            error: Some(error),
        }
    }
}

/// What the checker looks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityConfig {
    pub marker_path: String,
    pub dependency_key: String,
}

impl Default for CompatibilityConfig {
    fn default() -> Self {
        Self {
            marker_path: DEFAULT_MARKER_PATH.to_string(),
            dependency_key: DEFAULT_DEPENDENCY_KEY.to_string(),
        }
    }
}

/// Check whether marker file content declares `key` as a dependency.
///
/// Valid YAML is inspected structurally: `key` must appear under the
/// top-level `dependencies` (as a mapping key or a list entry). Content that
/// does not parse falls back to a plain substring search.
pub fn is_dak_marker(content: &str, key: &str) -> bool {
    match serde_yaml_ng::from_str::<Value>(content) {
        Ok(doc) => doc
            .get("dependencies")
            .is_some_and(|deps| declares_dependency(deps, key)),
        Err(e) => {
            tracing::debug!("Marker file is not valid YAML, falling back to text search: {e}");
            content.contains(key)
        }
    }
}

fn declares_dependency(deps: &Value, key: &str) -> bool {
    match deps {
        Value::Mapping(map) => map.contains_key(key),
        Value::Sequence(items) => items.iter().any(|item| match item {
            Value::String(s) => s == key,
            Value::Mapping(map) => map.contains_key(key),
            _ => false,
        }),
        Value::String(s) => s == key,
        _ => false,
    }
}

/// Classifies repositories by fetching and inspecting their marker file.
pub struct CompatibilityChecker<C: ?Sized> {
    client: Arc<C>,
    config: CompatibilityConfig,
    retry_policy: RetryPolicy,
}

impl<C: ?Sized> Clone for CompatibilityChecker<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            config: self.config.clone(),
            retry_policy: self.retry_policy.clone(),
        }
    }
}

impl<C: PlatformClient + ?Sized> CompatibilityChecker<C> {
    pub fn new(client: Arc<C>, config: CompatibilityConfig, retry_policy: RetryPolicy) -> Self {
        Self {
            client,
            config,
            retry_policy,
        }
    }

    /// Check one repository, applying the retry policy to transient failures.
    pub async fn check(&self, owner: &str, repo: &str) -> CompatibilityResult {
        let full_name = format!("{owner}/{repo}");

        let fetched = with_retry(
            &self.retry_policy,
            || self.fetch_marker(owner, repo),
            &full_name,
        )
        .await;

        match fetched {
            Ok(Some(content)) => {
                let compatible = is_dak_marker(&content, &self.config.dependency_key);
                tracing::debug!(repository = %full_name, compatible, "Marker file inspected");
                CompatibilityResult::settled(full_name, compatible)
            }
            Ok(None) => {
                tracing::debug!(repository = %full_name, "No marker file");
                CompatibilityResult::settled(full_name, false)
            }
            Err(error) => {
                tracing::warn!(
                    repository = %full_name,
                    kind = %error.kind,
                    "Compatibility check failed: {}",
                    error.message
                );
                CompatibilityResult::failed(full_name, error)
            }
        }
    }

    /// One fetch attempt. `Ok(None)` means the marker file does not exist.
    async fn fetch_marker(&self, owner: &str, repo: &str) -> Result<Option<String>, ErrorInfo> {
        match self
            .client
            .get_file_content(owner, repo, &self.config.marker_path)
            .await
        {
            Ok(content) => Ok(Some(content)),
            Err(err) => match ErrorInfo::classify(&err) {
                None => Ok(None),
                Some(info) => Err(info),
            },
        }
    }
}
