//! Time-boxed result cache.
//!
//! Avoids rescanning an owner (or re-checking a repository) that was scanned
//! moments ago. Entries are keyed by owner plus a [`CacheScope`], overwritten
//! wholesale on `set`, and considered stale once older than the TTL fixed at
//! construction.
//!
//! The cache is an explicit instance shared through `Arc`; there is no
//! process-global cache. For one-shot processes the contents can be
//! persisted with [`ResultCache::save_to`] and [`ResultCache::load_from`].

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default time-to-live for cache entries.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// What an entry describes within an owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "name", rename_all = "snake_case")]
pub enum CacheScope {
    /// A single repository of the owner.
    Repository(String),
    /// The owner's whole scan.
    Owner,
}

/// Cache lookup key. Owner and repository names are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub owner: String,
    pub scope: CacheScope,
}

impl CacheKey {
    pub fn new(owner: &str, scope: &CacheScope) -> Self {
        let scope = match scope {
            CacheScope::Repository(name) => CacheScope::Repository(name.to_lowercase()),
            CacheScope::Owner => CacheScope::Owner,
        };
        Self {
            owner: owner.to_lowercase(),
            scope,
        }
    }
}

/// A stored payload with the time it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<P> {
    pub key: CacheKey,
    pub payload: P,
    pub timestamp: DateTime<Utc>,
}

/// Freshness report for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheInfo {
    pub cached: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub age_ms: Option<u64>,
    pub valid: bool,
}

/// Errors from persisting the cache.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("cache file I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("cache file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// In-memory TTL cache, safe to share across tasks.
pub struct ResultCache<P> {
    entries: RwLock<HashMap<CacheKey, CacheEntry<P>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<P> std::fmt::Debug for ResultCache<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("ttl", &self.ttl)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl<P> Default for ResultCache<P> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl<P> ResultCache<P> {
    /// Create a cache using the system clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create a cache with an explicit clock.
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of stored entries, fresh or stale.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store `payload`, replacing any existing entry and stamping the time.
    pub fn set(&self, owner: &str, scope: &CacheScope, payload: P) {
        let key = CacheKey::new(owner, scope);
        let entry = CacheEntry {
            key: key.clone(),
            payload,
            timestamp: self.clock.now(),
        };
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, entry);
    }

    /// Freshness information for a key, for display.
    pub fn info(&self, owner: &str, scope: &CacheScope) -> CacheInfo {
        let key = CacheKey::new(owner, scope);
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        match entries.get(&key) {
            Some(entry) => {
                let age = self.age(entry.timestamp);
                CacheInfo {
                    cached: true,
                    last_updated: Some(entry.timestamp),
                    age_ms: Some(u64::try_from(age.as_millis()).unwrap_or(u64::MAX)),
                    valid: age < self.ttl,
                }
            }
            None => CacheInfo {
                cached: false,
                last_updated: None,
                age_ms: None,
                valid: false,
            },
        }
    }

    /// Remove an entry regardless of its age.
    ///
    /// Returns whether an entry was present.
    pub fn force_refresh(&self, owner: &str, scope: &CacheScope) -> bool {
        let key = CacheKey::new(owner, scope);
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&key)
            .is_some()
    }

    /// Remove every entry belonging to `owner`, both scopes.
    pub fn forget_owner(&self, owner: &str) -> usize {
        let owner = owner.to_lowercase();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|key, _| key.owner != owner);
        before - entries.len()
    }

    /// Remove every entry.
    pub fn clear_all(&self) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Drop stale entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        let now = self.clock.now();
        let ttl = self.ttl;
        entries.retain(|_, entry| age_between(entry.timestamp, now) < ttl);
        before - entries.len()
    }

    fn age(&self, timestamp: DateTime<Utc>) -> Duration {
        age_between(timestamp, self.clock.now())
    }
}

impl<P: Clone> ResultCache<P> {
    /// Fetch a payload, or `None` when absent or stale.
    pub fn get(&self, owner: &str, scope: &CacheScope) -> Option<P> {
        let key = CacheKey::new(owner, scope);
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(&key)
            .filter(|entry| self.age(entry.timestamp) < self.ttl)
            .map(|entry| entry.payload.clone())
    }

    /// Copy of every stored entry, fresh or stale.
    pub fn snapshot(&self) -> Vec<CacheEntry<P>> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect()
    }

    /// Load entries written earlier, keeping only those still fresh.
    ///
    /// Existing entries with the same key are replaced. Timestamps are kept
    /// as recorded, so a restored entry expires when the original would
    /// have. Returns the number of entries restored.
    pub fn restore(&self, snapshot: Vec<CacheEntry<P>>) -> usize {
        let now = self.clock.now();
        self.insert_entries(
            snapshot
                .into_iter()
                .filter(|entry| age_between(entry.timestamp, now) < self.ttl),
        )
    }

    /// Load entries written earlier, stale ones included.
    ///
    /// Stale entries stay invisible to [`get`](Self::get) but show up in
    /// [`info`](Self::info) as cached and not valid.
    pub fn restore_all(&self, snapshot: Vec<CacheEntry<P>>) -> usize {
        self.insert_entries(snapshot)
    }

    fn insert_entries(&self, snapshot: impl IntoIterator<Item = CacheEntry<P>>) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let mut restored = 0;
        for entry in snapshot {
            entries.insert(entry.key.clone(), entry);
            restored += 1;
        }
        restored
    }
}

impl<P: Clone + Serialize + DeserializeOwned> ResultCache<P> {
    /// Write a JSON snapshot to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), PersistError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(&self.snapshot())?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Restore the fresh entries of a JSON snapshot at `path`.
    ///
    /// A missing file is an empty cache, not an error.
    pub fn load_from(&self, path: &Path) -> Result<usize, PersistError> {
        Ok(self.restore(read_snapshot(path)?))
    }

    /// Restore every entry of a JSON snapshot at `path`, for inspection.
    pub fn load_all_from(&self, path: &Path) -> Result<usize, PersistError> {
        Ok(self.restore_all(read_snapshot(path)?))
    }
}

fn read_snapshot<P: DeserializeOwned>(path: &Path) -> Result<Vec<CacheEntry<P>>, PersistError> {
    match fs::read(path) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// Elapsed time from `then` to `now`; a timestamp in the future counts as zero.
fn age_between(then: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - then).to_std().unwrap_or(Duration::ZERO)
}
