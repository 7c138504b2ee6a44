use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::errors::Result;

/// Which kind of account owns the repositories being listed.
///
/// GitHub exposes user and organization repositories on different endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    /// A personal account.
    #[default]
    User,
    /// An organization account.
    Organization,
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Organization => f.write_str("org"),
        }
    }
}

/// A repository as returned by the listing call.
///
/// This is an immutable snapshot; a scan never refreshes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    /// Repository owner (user or org).
    pub owner: String,
    /// Repository name.
    pub name: String,
    /// Repository description.
    pub description: Option<String>,
    /// Repository topics/tags.
    #[serde(default)]
    pub topics: Vec<String>,
    /// Default branch name.
    pub default_branch: String,
}

impl RepositorySummary {
    /// Create a summary with only identity fields set.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            description: None,
            topics: Vec::new(),
            default_branch: "main".to_string(),
        }
    }

    /// Get the full name (owner/name).
    #[inline]
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Trait for code hosting platform clients.
///
/// The scanner only needs two calls from a platform: list an owner's
/// repositories and read one file out of a repository. Authentication is the
/// implementor's business; the scanner receives a ready-to-use client.
///
/// # Implementation Notes
///
/// Implementors should:
/// - Handle pagination internally in `list_repositories`
/// - Report a missing file as `PlatformError::NotFound`
/// - Report throttling as `PlatformError::RateLimited`, with reset hints when known
/// - Report transport failures (no response) as `PlatformError::Network`
/// - Report 5xx responses as `PlatformError::Server`
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// List all repositories for an owner.
    async fn list_repositories(
        &self,
        owner: &str,
        kind: OwnerKind,
    ) -> Result<Vec<RepositorySummary>>;

    /// Fetch the raw text content of one file in a repository.
    async fn get_file_content(&self, owner: &str, repo: &str, path: &str) -> Result<String>;
}
