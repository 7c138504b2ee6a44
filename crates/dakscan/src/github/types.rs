//! GitHub API data types.

use serde::Deserialize;

/// Repository owner as embedded in the repository listing.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubOwner {
    pub login: String,
}

/// The subset of GitHub's repository object the scanner reads.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRepo {
    pub name: String,
    pub owner: GitHubOwner,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// Error body GitHub sends alongside 4xx/5xx statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubErrorBody {
    #[serde(default)]
    pub message: String,
}
