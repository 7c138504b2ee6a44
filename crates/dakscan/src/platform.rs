//! Platform-agnostic trait for code forge clients.
//!
//! This module defines the `PlatformClient` trait the scanner consumes, the
//! `PlatformError` failure shapes a client must surface, and proactive rate
//! limiting helpers.
//!
//! # Example
//!
//! ```ignore
//! use dakscan::platform::{OwnerKind, PlatformClient, PlatformError};
//!
//! async fn names<C: PlatformClient>(client: &C, owner: &str) -> Result<Vec<String>, PlatformError> {
//!     let repos = client.list_repositories(owner, OwnerKind::Organization).await?;
//!     Ok(repos.iter().map(|r| r.full_name()).collect())
//! }
//! ```

mod errors;
mod rate_limit;
mod types;

pub use errors::{PlatformError, Result, short_error_message};
pub use rate_limit::{ApiRateLimiter, RateLimitedClient, rate_limits};
pub use types::{OwnerKind, PlatformClient, RepositorySummary};
