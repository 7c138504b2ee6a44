use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use dakscan::github::GitHubClient;
use dakscan::http::reqwest_transport::ReqwestTransport;
use dakscan::scan::ScanCacheEntry;
use dakscan::{
    OwnerKind, PlatformClient, RateLimitedClient, RepositorySummary, ResultCache, ScanOutcome,
    Scanner,
};

use crate::ScanArgs;
use crate::commands::OutputFormat;
use crate::config::Config;
use crate::progress::ScanReporter;
use crate::shutdown;

/// Per-request timeout for GitHub API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Exit status after Ctrl+C.
const EXIT_INTERRUPTED: i32 = 130;

/// A compatible repository for display.
#[derive(Debug, Clone, serde::Serialize, tabled::Tabled)]
pub(crate) struct RepositoryRow {
    #[tabled(rename = "Repository")]
    pub repository: String,
    #[tabled(rename = "Description")]
    pub description: String,
    #[tabled(rename = "Topics")]
    pub topics: String,
}

impl From<&RepositorySummary> for RepositoryRow {
    fn from(repo: &RepositorySummary) -> Self {
        Self {
            repository: repo.full_name(),
            description: repo.description.clone().unwrap_or_default(),
            topics: repo.topics.join(", "),
        }
    }
}

/// Build the platform client from configuration.
fn build_client(
    config: &Config,
    no_rate_limit: bool,
) -> Result<Arc<dyn PlatformClient>, Box<dyn std::error::Error>> {
    let transport = ReqwestTransport::with_timeout(REQUEST_TIMEOUT)?;
    let client = GitHubClient::with_transport(
        transport,
        &config.github.api_url,
        config.github_token(),
    );

    if config.github_token().is_none() {
        tracing::warn!("No GitHub token configured; only public repositories are visible");
    }

    let rps = config.scan.requests_per_second;
    if no_rate_limit || rps == 0 {
        Ok(Arc::new(client))
    } else {
        Ok(Arc::new(RateLimitedClient::new(client, rps)))
    }
}

/// Load the persisted cache, starting empty if it cannot be read.
pub(crate) fn load_cache(config: &Config) -> ResultCache<ScanCacheEntry> {
    let cache = ResultCache::new(config.cache_ttl());
    if let Some(path) = config.cache_path() {
        match cache.load_from(&path) {
            Ok(restored) => tracing::debug!(restored, "Loaded cache from {:?}", path),
            Err(e) => tracing::warn!("Ignoring unreadable cache file {:?}: {}", path, e),
        }
    }
    cache
}

/// Load every cached entry, stale ones included, for display.
pub(crate) fn inspect_cache(config: &Config) -> ResultCache<ScanCacheEntry> {
    let cache = ResultCache::new(config.cache_ttl());
    if let Some(path) = config.cache_path()
        && let Err(e) = cache.load_all_from(&path)
    {
        tracing::warn!("Ignoring unreadable cache file {:?}: {}", path, e);
    }
    cache
}

/// Persist the fresh part of the cache, logging instead of failing.
pub(crate) fn save_cache(cache: &ResultCache<ScanCacheEntry>, path: Option<&Path>) {
    let Some(path) = path else {
        return;
    };
    let purged = cache.purge_expired();
    if purged > 0 {
        tracing::debug!(purged, "Dropped expired cache entries before saving");
    }
    if let Err(e) = cache.save_to(path) {
        tracing::warn!("Failed to save cache to {:?}: {}", path, e);
    }
}

/// Handle the scan command.
pub(crate) async fn handle_scan(
    args: ScanArgs,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = config.scan_options();
    if let Some(concurrency) = args.concurrency {
        options.concurrency = concurrency.max(1);
    }

    let owner_kind = if args.org {
        OwnerKind::Organization
    } else {
        OwnerKind::User
    };

    let client = build_client(config, args.no_rate_limit)?;
    let cache = Arc::new(load_cache(config));
    let cache_path = config.cache_path();
    let scanner = Scanner::new(client, options).with_cache(Arc::clone(&cache));

    let reporter = Arc::new(ScanReporter::new(
        &args.owner,
        matches!(args.output, OutputFormat::Json),
    ));
    let on_found = reporter.found_callback();
    let on_progress = reporter.progress_callback();

    let result = tokio::select! {
        result = scanner.scan_cached(
            &args.owner,
            owner_kind,
            args.refresh,
            Some(&on_found),
            Some(&on_progress),
        ) => result,
        _ = shutdown::interrupted() => {
            reporter.finish();
            save_cache(&cache, cache_path.as_deref());
            std::process::exit(EXIT_INTERRUPTED);
        }
    };
    reporter.finish();
    save_cache(&cache, cache_path.as_deref());

    let outcome = result.map_err(|e| {
        format!(
            "Scan of {} failed: {}. Nothing was checked; try again later.",
            args.owner, e
        )
    })?;

    print_outcome(&args.owner, &outcome, args.output)?;
    Ok(())
}

fn print_outcome(
    owner: &str,
    outcome: &ScanOutcome,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(outcome)?);
        }
        OutputFormat::Table => {
            let mut rows: Vec<RepositoryRow> =
                outcome.repositories.iter().map(RepositoryRow::from).collect();
            rows.sort_by(|a, b| a.repository.cmp(&b.repository));

            if rows.is_empty() {
                println!("No DAK repositories found for {owner}");
            } else {
                let mut table = tabled::Table::new(rows);
                table.with(tabled::settings::Style::rounded());
                println!("{}", table);
            }

            if outcome.from_cache {
                println!("(cached result, use --refresh to rescan)");
            }
        }
    }

    if let Some(errors) = &outcome.scanning_errors {
        eprintln!("{}", errors.describe(outcome.total_repositories));
        for repo in errors.repositories() {
            tracing::warn!(repo, "Could not be checked");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_row_from_summary() {
        let mut repo = RepositorySummary::new("WorldHealthOrganization", "smart-anc");
        repo.description = Some("Antenatal care DAK".to_string());
        repo.topics = vec!["dak".to_string(), "fhir".to_string()];

        let row = RepositoryRow::from(&repo);
        assert_eq!(row.repository, "WorldHealthOrganization/smart-anc");
        assert_eq!(row.description, "Antenatal care DAK");
        assert_eq!(row.topics, "dak, fhir");
    }

    #[test]
    fn load_cache_tolerates_corrupt_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scan-cache.json");
        std::fs::write(&path, b"not json").expect("write");

        let mut config = Config::default();
        config.cache.path = Some(path);
        let cache = load_cache(&config);
        assert!(cache.is_empty());
    }

    #[test]
    fn save_cache_drops_expired_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scan-cache.json");
        let mut config = Config::default();
        config.cache.path = Some(path.clone());
        config.cache.ttl_secs = 0;

        let cache = load_cache(&config);
        cache.set(
            "who",
            &dakscan::CacheScope::Repository("smart-base".to_string()),
            ScanCacheEntry::Compatibility { compatible: true },
        );
        save_cache(&cache, Some(&path));

        assert!(cache.is_empty());
        assert!(inspect_cache(&config).is_empty());
    }

    #[test]
    fn saved_cache_is_reloaded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scan-cache.json");
        let mut config = Config::default();
        config.cache.path = Some(path.clone());

        let cache = load_cache(&config);
        cache.set(
            "who",
            &dakscan::CacheScope::Repository("smart-base".to_string()),
            ScanCacheEntry::Compatibility { compatible: true },
        );
        save_cache(&cache, Some(&path));

        let reloaded = load_cache(&config);
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn build_client_without_rate_limit() {
        let config = Config::default();
        assert!(build_client(&config, true).is_ok());
        assert!(build_client(&config, false).is_ok());
    }
}
