//! dakscan - find Digital Adaptation Kit (DAK) repositories.
//!
//! A repository is a DAK when its `sushi-config.yaml` declares the
//! `smart.who.int.base` dependency. This library scans every repository of
//! a user or organization for that marker, with bounded concurrency,
//! per-repository retries and a time-boxed result cache. A failed check
//! never fails the scan; only a failed repository listing does.
//!
//! # Features
//!
//! - `github` (default) - [`github::GitHubClient`], a reqwest-backed
//!   [`PlatformClient`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use dakscan::{OwnerKind, ScanOptions, Scanner, github::GitHubClient};
//!
//! let client = Arc::new(GitHubClient::new(Some(&token))?);
//! let scanner = Scanner::new(client, ScanOptions::default());
//! let outcome = scanner
//!     .scan("WorldHealthOrganization", OwnerKind::Organization, None, None)
//!     .await?;
//!
//! for repo in &outcome.repositories {
//!     println!("{}", repo.full_name());
//! }
//! if let Some(errors) = &outcome.scanning_errors {
//!     eprintln!("{}", errors.describe(outcome.total_repositories));
//! }
//! ```

pub mod cache;
pub mod compat;
pub mod http;
pub mod platform;
pub mod retry;
pub mod scan;

#[cfg(feature = "github")]
pub mod github;

pub use cache::{CacheInfo, CacheScope, DEFAULT_CACHE_TTL, ResultCache};
pub use compat::{
    CompatibilityChecker, CompatibilityConfig, CompatibilityResult, ErrorInfo, ErrorKind,
};
pub use platform::{
    ApiRateLimiter, OwnerKind, PlatformClient, PlatformError, RateLimitedClient,
    RepositorySummary, rate_limits,
};
pub use retry::RetryPolicy;
pub use scan::{
    ScanCacheEntry, ScanError, ScanOptions, ScanOutcome, ScanProgress, Scanner,
    ScanningErrorSummary,
};
