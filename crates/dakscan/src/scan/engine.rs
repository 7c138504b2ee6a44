//! Scan coordinator.
//!
//! Lists an owner's repositories once, checks them with bounded concurrency,
//! and pushes each settled check to the caller as it happens.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};

use super::errors::ErrorAggregator;
use super::progress::{FoundCallback, ProgressCallback, emit, emit_found};
use super::types::{ScanCacheEntry, ScanOptions, ScanOutcome, ScanProgress, ScanState};
use crate::cache::{CacheScope, ResultCache};
use crate::compat::{CompatibilityChecker, CompatibilityResult, ErrorInfo};
use crate::platform::{OwnerKind, PlatformClient, PlatformError, RepositorySummary};

/// A scan that could not produce any result.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The repository listing failed, so there was nothing to check.
    #[error("failed to list repositories for {owner}: {source}")]
    Listing {
        owner: String,
        #[source]
        source: PlatformError,
    },
}

impl ScanError {
    /// The underlying platform error.
    pub fn platform_error(&self) -> &PlatformError {
        match self {
            Self::Listing { source, .. } => source,
        }
    }
}

/// Scans owners for DAK repositories.
pub struct Scanner<C: ?Sized> {
    client: Arc<C>,
    checker: CompatibilityChecker<C>,
    concurrency: usize,
    cache: Option<Arc<ResultCache<ScanCacheEntry>>>,
}

impl<C: PlatformClient + ?Sized + 'static> Scanner<C> {
    pub fn new(client: Arc<C>, options: ScanOptions) -> Self {
        let checker = CompatibilityChecker::new(
            Arc::clone(&client),
            options.compatibility,
            options.retry_policy,
        );
        Self {
            client,
            checker,
            concurrency: options.concurrency.max(1),
            cache: None,
        }
    }

    /// Attach a result cache. Used by [`scan_cached`](Self::scan_cached);
    /// [`scan`](Self::scan) only writes to it.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<ResultCache<ScanCacheEntry>>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Scan every repository of `owner`.
    ///
    /// Fails only when the listing fails. Individual check failures end up in
    /// [`ScanOutcome::scanning_errors`].
    pub async fn scan(
        &self,
        owner: &str,
        owner_kind: OwnerKind,
        on_found: Option<&FoundCallback>,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<ScanOutcome, ScanError> {
        self.run(owner, owner_kind, false, on_found, on_progress)
            .await
    }

    /// Scan `owner`, serving a fresh cached outcome when one exists.
    ///
    /// A cached outcome is served only when it was listed as the same
    /// `owner_kind`. With `refresh` set, every cached entry for the owner is
    /// dropped first. Without a cache attached this is the same as
    /// [`scan`](Self::scan). Only clean outcomes are stored at owner scope, so a degraded scan is
    /// retried on the next call; per-repository results are reused either way.
    pub async fn scan_cached(
        &self,
        owner: &str,
        owner_kind: OwnerKind,
        refresh: bool,
        on_found: Option<&FoundCallback>,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<ScanOutcome, ScanError> {
        let Some(cache) = &self.cache else {
            return self.scan(owner, owner_kind, on_found, on_progress).await;
        };

        if refresh {
            let dropped = cache.forget_owner(owner);
            tracing::debug!(owner, dropped, "Refresh requested, dropped cached entries");
        } else if let Some(ScanCacheEntry::Outcome(mut outcome)) =
            cache.get(owner, &CacheScope::Owner)
            && outcome.owner_kind == owner_kind
        {
            tracing::info!(
                owner,
                found = outcome.repositories.len(),
                "Using cached scan result"
            );
            for repo in &outcome.repositories {
                emit_found(on_found, repo);
            }
            let total = outcome.total_repositories;
            emit(on_progress, ScanProgress::new(total, total, None));
            outcome.from_cache = true;
            return Ok(outcome);
        }

        let outcome = self
            .run(owner, owner_kind, !refresh, on_found, on_progress)
            .await?;
        if !outcome.is_degraded() {
            cache.set(
                owner,
                &CacheScope::Owner,
                ScanCacheEntry::Outcome(outcome.clone()),
            );
        }
        Ok(outcome)
    }

    #[tracing::instrument(
        name = "scan",
        skip(self, on_found, on_progress),
        fields(owner_kind = %owner_kind, concurrency = self.concurrency)
    )]
    async fn run(
        &self,
        owner: &str,
        owner_kind: OwnerKind,
        reuse_cached_checks: bool,
        on_found: Option<&FoundCallback>,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<ScanOutcome, ScanError> {
        let mut state = ScanState::Idle;

        transition(&mut state, ScanState::Listing);
        let repos = match self.client.list_repositories(owner, owner_kind).await {
            Ok(repos) => repos,
            Err(source) => {
                transition(&mut state, ScanState::FailedFatal);
                tracing::warn!(owner, "Repository listing failed: {source}");
                return Err(ScanError::Listing {
                    owner: owner.to_string(),
                    source,
                });
            }
        };

        let total = repos.len();
        tracing::info!(owner, total, "Scanning repositories");
        transition(&mut state, ScanState::Checking);

        let mut settlement = Settlement::new(total, owner_kind, on_found, on_progress);

        if total == 0 {
            emit(on_progress, ScanProgress::new(0, 0, None));
        }

        // Checks already answered by the cache settle without a request.
        let mut pending = Vec::with_capacity(total);
        for (index, repo) in repos.iter().enumerate() {
            match self.cached_check(owner, repo, reuse_cached_checks) {
                Some(compatible) => settlement.settle(
                    repo,
                    CompatibilityResult {
                        repository: repo.full_name(),
                        compatible,
                        error: None,
                    },
                ),
                None => pending.push(index),
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency.min(pending.len().max(1))));
        let mut join_set: JoinSet<CompatibilityResult> = JoinSet::new();
        let mut tasks: HashMap<Id, usize> = HashMap::with_capacity(pending.len());

        for &index in &pending {
            let checker = self.checker.clone();
            let semaphore = Arc::clone(&semaphore);
            let owner = repos[index].owner.clone();
            let name = repos[index].name.clone();

            let handle = join_set.spawn(async move {
                match semaphore.acquire().await {
                    Ok(_permit) => checker.check(&owner, &name).await,
                    Err(_) => CompatibilityResult {
                        repository: format!("{owner}/{name}"),
                        compatible: false,
                        error: Some(ErrorInfo::other("Semaphore closed unexpectedly")),
                    },
                }
            });
            tasks.insert(handle.id(), index);
        }

        while let Some(joined) = join_set.join_next_with_id().await {
            let (id, joined) = match joined {
                Ok((id, result)) => (id, Ok(result)),
                Err(e) => (e.id(), Err(e)),
            };
            let Some(index) = tasks.remove(&id) else {
                tracing::warn!(owner, task = %id, "Joined a task that was never spawned");
                continue;
            };
            let repo = &repos[index];
            let result = joined.unwrap_or_else(|e| {
                tracing::warn!(repository = %repo.full_name(), "Compatibility check task failed: {e}");
                CompatibilityResult {
                    repository: repo.full_name(),
                    compatible: false,
                    error: Some(ErrorInfo::other(e.to_string())),
                }
            });
            if result.error.is_none() {
                self.remember_check(owner, repo, result.compatible);
            }
            settlement.settle(repo, result);
        }

        transition(&mut state, ScanState::Aggregating);
        let outcome = settlement.finish();
        transition(&mut state, ScanState::Done);

        tracing::info!(
            owner,
            total,
            found = outcome.repositories.len(),
            errors = outcome
                .scanning_errors
                .as_ref()
                .map_or(0, |s| s.total_errors),
            "Scan complete"
        );
        Ok(outcome)
    }

    fn cached_check(&self, owner: &str, repo: &RepositorySummary, reuse: bool) -> Option<bool> {
        if !reuse {
            return None;
        }
        let scope = CacheScope::Repository(repo.name.clone());
        match self.cache.as_ref()?.get(owner, &scope)? {
            ScanCacheEntry::Compatibility { compatible } => Some(compatible),
            ScanCacheEntry::Outcome(_) => None,
        }
    }

    fn remember_check(&self, owner: &str, repo: &RepositorySummary, compatible: bool) {
        if let Some(cache) = &self.cache {
            cache.set(
                owner,
                &CacheScope::Repository(repo.name.clone()),
                ScanCacheEntry::Compatibility { compatible },
            );
        }
    }
}

fn transition(state: &mut ScanState, next: ScanState) {
    tracing::debug!(from = %state, to = %next, "Scan state transition");
    *state = next;
}

/// Coordinator-side bookkeeping for settled checks.
///
/// Only the coordinating task touches this, which keeps `current` monotonic.
struct Settlement<'a> {
    total: usize,
    current: usize,
    found: Vec<RepositorySummary>,
    owner_kind: OwnerKind,
    errors: ErrorAggregator,
    on_found: Option<&'a FoundCallback>,
    on_progress: Option<&'a ProgressCallback>,
}

impl<'a> Settlement<'a> {
    fn new(
        total: usize,
        owner_kind: OwnerKind,
        on_found: Option<&'a FoundCallback>,
        on_progress: Option<&'a ProgressCallback>,
    ) -> Self {
        Self {
            total,
            current: 0,
            found: Vec::new(),
            owner_kind,
            errors: ErrorAggregator::new(),
            on_found,
            on_progress,
        }
    }

    fn settle(&mut self, repo: &RepositorySummary, result: CompatibilityResult) {
        match &result.error {
            Some(error) => self.errors.record(&result.repository, error),
            None if result.compatible => {
                emit_found(self.on_found, repo);
                self.found.push(repo.clone());
            }
            None => {}
        }
        self.current += 1;
        emit(
            self.on_progress,
            ScanProgress::new(self.current, self.total, Some(repo.name.clone())),
        );
    }

    fn finish(self) -> ScanOutcome {
        ScanOutcome {
            repositories: self.found,
            scanning_errors: self.errors.into_summary(),
            total_repositories: self.total,
            owner_kind: self.owner_kind,
            from_cache: false,
        }
    }
}
