use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::ScanningErrorSummary;
use crate::compat::CompatibilityConfig;
use crate::platform::{OwnerKind, RepositorySummary};
use crate::retry::RetryPolicy;

/// Default number of repositories checked at the same time.
pub const DEFAULT_SCAN_CONCURRENCY: usize = 8;

/// Snapshot emitted each time a repository check settles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanProgress {
    /// Number of settled checks so far. Never decreases within a scan.
    pub current: usize,
    pub total: usize,
    /// Repository that just settled, when known.
    pub current_repository_name: Option<String>,
    /// 0 to 100.
    pub percentage: u8,
    pub completed: bool,
}

impl ScanProgress {
    pub fn new(current: usize, total: usize, current_repository_name: Option<String>) -> Self {
        let percentage = if total == 0 {
            100
        } else {
            u8::try_from(current.min(total) * 100 / total).unwrap_or(100)
        };
        Self {
            current,
            total,
            current_repository_name,
            percentage,
            completed: current >= total,
        }
    }
}

/// Result of a scan that got past the listing step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOutcome {
    /// Compatible repositories, in no particular order.
    pub repositories: Vec<RepositorySummary>,
    /// `None` when every check settled without a failure.
    pub scanning_errors: Option<ScanningErrorSummary>,
    /// Number of repositories the owner has.
    #[serde(default)]
    pub total_repositories: usize,
    /// Account kind the listing was made as. Organization listings include
    /// repositories a user listing does not.
    #[serde(default)]
    pub owner_kind: OwnerKind,
    /// Whether this outcome was served from the result cache.
    #[serde(default, skip_serializing)]
    pub from_cache: bool,
}

impl ScanOutcome {
    /// Whether some repositories could not be checked.
    pub fn is_degraded(&self) -> bool {
        self.scanning_errors.is_some()
    }
}

/// Payload stored in the scanner's result cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanCacheEntry {
    /// Whole-owner outcome, stored under `CacheScope::Owner`.
    Outcome(ScanOutcome),
    /// One repository's check, stored under `CacheScope::Repository`.
    Compatibility { compatible: bool },
}

/// Scanner settings.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Maximum checks in flight. Values below 1 are treated as 1.
    pub concurrency: usize,
    pub compatibility: CompatibilityConfig,
    pub retry_policy: RetryPolicy,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_SCAN_CONCURRENCY,
            compatibility: CompatibilityConfig::default(),
            retry_policy: RetryPolicy::default(),
        }
    }
}

/// Lifecycle of one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Listing,
    Checking,
    Aggregating,
    Done,
    FailedFatal,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Listing => "listing",
            Self::Checking => "checking",
            Self::Aggregating => "aggregating",
            Self::Done => "done",
            Self::FailedFatal => "failed",
        };
        f.write_str(s)
    }
}
