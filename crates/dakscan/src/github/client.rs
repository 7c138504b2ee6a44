//! GitHub API client implementing [`PlatformClient`].

use std::sync::Arc;

use async_trait::async_trait;

use super::convert::to_repository_summary;
use super::error::{Endpoint, classify_response, classify_transport};
use super::pagination::parse_link_header;
use super::types::GitHubRepo;
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::platform::{self, OwnerKind, PlatformClient, PlatformError, RepositorySummary};

/// Public GitHub REST API root.
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Repositories requested per listing page (GitHub's maximum).
const PER_PAGE: u32 = 100;

/// Upper bound on listing pages, guarding against a Link header loop.
const MAX_LISTING_PAGES: u32 = 1_000;

/// GitHub API client implementing the PlatformClient trait.
///
/// Generic over the HTTP transport so response classification can be tested
/// without a network.
pub struct GitHubClient<T = ReqwestTransport> {
    transport: Arc<T>,
    api_url: Arc<str>,
    token: Option<Arc<str>>,
}

impl<T> Clone for GitHubClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            api_url: Arc::clone(&self.api_url),
            token: self.token.clone(),
        }
    }
}

impl GitHubClient<ReqwestTransport> {
    /// Create a client for api.github.com backed by reqwest.
    ///
    /// A token is optional; without one only public repositories are visible
    /// and the unauthenticated rate limit applies.
    pub fn new(token: Option<&str>) -> Result<Self, PlatformError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("dakscan/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PlatformError::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_transport(
            ReqwestTransport::new(client),
            GITHUB_API_URL,
            token,
        ))
    }
}

impl<T: HttpTransport> GitHubClient<T> {
    /// Create a client over an arbitrary transport and API root.
    pub fn with_transport(transport: T, api_url: &str, token: Option<&str>) -> Self {
        Self {
            transport: Arc::new(transport),
            api_url: Arc::from(api_url.trim_end_matches('/')),
            token: token.filter(|t| !t.is_empty()).map(Arc::from),
        }
    }

    /// The API root this client talks to.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn request(&self, url: String, accept: &str) -> HttpRequest {
        let request = HttpRequest::get(url)
            .header("Accept", accept)
            .header("User-Agent", "dakscan")
            .header("X-GitHub-Api-Version", "2022-11-28");
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {token}")),
            None => request,
        }
    }

    async fn send(&self, request: HttpRequest) -> platform::Result<HttpResponse> {
        self.transport
            .send(request)
            .await
            .map_err(classify_transport)
    }

    fn listing_url(&self, owner: &str, kind: OwnerKind) -> String {
        match kind {
            OwnerKind::Organization => format!(
                "{}/orgs/{owner}/repos?per_page={PER_PAGE}&type=all",
                self.api_url
            ),
            OwnerKind::User => format!(
                "{}/users/{owner}/repos?per_page={PER_PAGE}&type=owner",
                self.api_url
            ),
        }
    }

    fn contents_url(&self, owner: &str, repo: &str, path: &str) -> String {
        format!(
            "{}/repos/{owner}/{repo}/contents/{}",
            self.api_url,
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl<T: HttpTransport + 'static> PlatformClient for GitHubClient<T> {
    async fn list_repositories(
        &self,
        owner: &str,
        kind: OwnerKind,
    ) -> platform::Result<Vec<RepositorySummary>> {
        let mut repos = Vec::new();
        let mut next = Some(self.listing_url(owner, kind));
        let mut pages = 0u32;

        while let Some(url) = next.take() {
            pages += 1;
            if pages > MAX_LISTING_PAGES {
                return Err(PlatformError::internal(format!(
                    "listing for {owner} exceeded {MAX_LISTING_PAGES} pages"
                )));
            }

            let response = self
                .send(self.request(url, "application/vnd.github+json"))
                .await?;
            if !(200..300).contains(&response.status) {
                return Err(classify_response(&response, Endpoint::Listing, owner));
            }

            let page: Vec<GitHubRepo> = serde_json::from_slice(&response.body)
                .map_err(|e| PlatformError::api(format!("invalid repository listing: {e}")))?;
            tracing::debug!(owner, page = pages, count = page.len(), "Fetched listing page");
            repos.extend(page.into_iter().map(to_repository_summary));

            let links = response
                .header("link")
                .map(parse_link_header)
                .unwrap_or_default();
            if pages == 1
                && let Some(last_page) = links.last_page
            {
                tracing::debug!(owner, last_page, "Listing spans multiple pages");
            }
            next = links.next_url;
        }

        Ok(repos)
    }

    async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> platform::Result<String> {
        let response = self
            .send(self.request(
                self.contents_url(owner, repo, path),
                "application/vnd.github.raw+json",
            ))
            .await?;

        if (200..300).contains(&response.status) {
            return Ok(response.text());
        }

        let resource = format!("{owner}/{repo}/{path}");
        Err(classify_response(&response, Endpoint::Contents, &resource))
    }
}
