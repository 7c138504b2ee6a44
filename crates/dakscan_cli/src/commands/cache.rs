use dakscan::{CacheInfo, CacheScope};

use crate::CacheAction;
use crate::commands::scan::{inspect_cache, save_cache};
use crate::commands::{OutputFormat, format_duration};
use crate::config::Config;

/// Cache freshness for display.
#[derive(Debug, Clone, serde::Serialize, tabled::Tabled)]
pub(crate) struct CacheInfoDisplay {
    #[tabled(rename = "Owner")]
    pub owner: String,
    #[tabled(rename = "Scope")]
    pub scope: String,
    #[tabled(rename = "Cached")]
    pub cached: bool,
    #[tabled(rename = "Valid")]
    pub valid: bool,
    #[tabled(rename = "Last Updated")]
    pub last_updated: String,
    #[tabled(rename = "Age")]
    pub age: String,
}

impl CacheInfoDisplay {
    pub(crate) fn new(owner: &str, scope: &CacheScope, info: CacheInfo) -> Self {
        let scope = match scope {
            CacheScope::Owner => "(owner)".to_string(),
            CacheScope::Repository(name) => name.clone(),
        };
        Self {
            owner: owner.to_string(),
            scope,
            cached: info.cached,
            valid: info.valid,
            last_updated: info
                .last_updated
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "-".to_string()),
            age: info
                .age_ms
                .map(|ms| {
                    format_duration(chrono::Duration::milliseconds(
                        i64::try_from(ms).unwrap_or(i64::MAX),
                    ))
                })
                .unwrap_or_else(|| "-".to_string()),
        }
    }

    pub(crate) fn print(self, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
        match format {
            OutputFormat::Table => {
                let mut table = tabled::Table::new(vec![self]);
                table.with(tabled::settings::Style::rounded());
                println!("{}", table);
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&self)?);
            }
        }
        Ok(())
    }
}

/// Handle the cache command.
pub(crate) fn handle_cache(
    action: CacheAction,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        CacheAction::Info {
            owner,
            repo,
            output,
        } => {
            let cache = inspect_cache(config);
            let scope = match repo {
                Some(name) => CacheScope::Repository(name),
                None => CacheScope::Owner,
            };
            CacheInfoDisplay::new(&owner, &scope, cache.info(&owner, &scope)).print(output)?;
        }
        CacheAction::Clear => {
            let cache = inspect_cache(config);
            let count = cache.len();
            cache.clear_all();
            save_cache(&cache, config.cache_path().as_deref());
            println!("Cleared {count} cached result(s)");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn display_for_missing_entry() {
        let info = CacheInfo {
            cached: false,
            last_updated: None,
            age_ms: None,
            valid: false,
        };
        let display = CacheInfoDisplay::new("who", &CacheScope::Owner, info);
        assert_eq!(display.scope, "(owner)");
        assert_eq!(display.last_updated, "-");
        assert_eq!(display.age, "-");
    }

    #[test]
    fn display_for_repository_entry() {
        let info = CacheInfo {
            cached: true,
            last_updated: Some(Utc::now()),
            age_ms: Some(125_000),
            valid: true,
        };
        let scope = CacheScope::Repository("smart-base".to_string());
        let display = CacheInfoDisplay::new("who", &scope, info);
        assert_eq!(display.scope, "smart-base");
        assert_eq!(display.age, "2m 5s");
        assert!(display.valid);
    }

    #[test]
    fn info_reports_expired_entry_as_cached_but_not_valid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scan-cache.json");
        let cache: dakscan::ResultCache<dakscan::ScanCacheEntry> =
            dakscan::ResultCache::new(dakscan::DEFAULT_CACHE_TTL);
        cache.set(
            "who",
            &CacheScope::Repository("smart-base".to_string()),
            dakscan::ScanCacheEntry::Compatibility { compatible: true },
        );
        cache.save_to(&path).expect("save");

        let mut config = Config::default();
        config.cache.path = Some(path);
        config.cache.ttl_secs = 0;

        let scope = CacheScope::Repository("smart-base".to_string());
        let info = inspect_cache(&config).info("who", &scope);
        let display = CacheInfoDisplay::new("who", &scope, info);
        assert!(display.cached);
        assert!(!display.valid);
        assert_ne!(display.last_updated, "-");
    }
}
