//! GitHub implementation of the platform client.
//!
//! # Module Structure
//!
//! - `client` - `GitHubClient`, listing and file-content requests
//! - `error` - Response classification into `PlatformError`
//! - `pagination` - Link header parsing
//! - `convert` - Conversion to `RepositorySummary`
//!
//! # Example
//!
//! ```ignore
//! use dakscan::github::GitHubClient;
//! use dakscan::platform::{OwnerKind, PlatformClient};
//!
//! let client = GitHubClient::new(Some(&token))?;
//! let repos = client.list_repositories("WorldHealthOrganization", OwnerKind::Organization).await?;
//! ```

mod client;
mod convert;
mod error;
mod pagination;
mod types;

pub use client::{GITHUB_API_URL, GitHubClient};
pub use convert::to_repository_summary;
pub use error::{Endpoint, classify_response, classify_transport, is_rate_limit_response};
pub use pagination::{LinkPagination, parse_link_header};
pub use types::{GitHubErrorBody, GitHubOwner, GitHubRepo};
