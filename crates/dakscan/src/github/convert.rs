//! Conversion from GitHub API types to platform-agnostic summaries.

use super::types::GitHubRepo;
use crate::platform::RepositorySummary;

/// Convert a GitHub repository to a platform-agnostic `RepositorySummary`.
pub fn to_repository_summary(repo: GitHubRepo) -> RepositorySummary {
    RepositorySummary {
        owner: repo.owner.login,
        name: repo.name,
        description: repo.description.filter(|d| !d.is_empty()),
        topics: repo.topics,
        default_branch: repo.default_branch.unwrap_or_else(|| "main".to_string()),
    }
}
