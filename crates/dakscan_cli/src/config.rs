//! Configuration file support for dakscan.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `DAKSCAN_`, nested keys joined
//!    with `__`, e.g. `DAKSCAN_SCAN__MAX_RETRIES`)
//! 3. Config file (./dakscan.toml, then ~/.config/dakscan/config.toml)
//! 4. Built-in defaults
//!
//! `DAKSCAN_GITHUB_TOKEN` and `GITHUB_TOKEN` are also accepted for the token.
//!
//! Example config file:
//! ```toml
//! [github]
//! token = "ghp_..."  # or use DAKSCAN_GITHUB_TOKEN
//! api_url = "https://api.github.com"
//!
//! [scan]
//! concurrency = 8
//! max_retries = 1
//! requests_per_second = 10
//! marker_path = "sushi-config.yaml"
//! dependency_key = "smart.who.int.base"
//!
//! [cache]
//! ttl_secs = 300
//! path = "~/.cache/dakscan/scan-cache.json"  # optional, this is the default
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config as ConfigBuilder, ConfigBuilder as Builder, Environment, File, FileFormat};
use dakscan::compat::{DEFAULT_DEPENDENCY_KEY, DEFAULT_MARKER_PATH};
use dakscan::github::GITHUB_API_URL;
use dakscan::retry::DEFAULT_MAX_RETRIES;
use dakscan::scan::DEFAULT_SCAN_CONCURRENCY;
use dakscan::{CompatibilityConfig, DEFAULT_CACHE_TTL, RetryPolicy, ScanOptions, rate_limits};
use directories::ProjectDirs;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github: GitHubConfig,
    pub scan: ScanConfig,
    pub cache: CacheConfig,
}

/// GitHub configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token. Optional; only public repositories are visible
    /// without one.
    pub token: Option<String>,
    /// API root, for GitHub Enterprise Server.
    pub api_url: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: GITHUB_API_URL.to_string(),
        }
    }
}

/// Default scan options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Maximum concurrent compatibility checks.
    pub concurrency: usize,
    /// Retries per repository after the first attempt.
    pub max_retries: usize,
    /// Proactive request pacing. 0 disables it.
    pub requests_per_second: u32,
    /// Marker file inspected in each repository.
    pub marker_path: String,
    /// Dependency that identifies a DAK.
    pub dependency_key: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_SCAN_CONCURRENCY,
            max_retries: DEFAULT_MAX_RETRIES,
            requests_per_second: rate_limits::GITHUB_DEFAULT_RPS,
            marker_path: DEFAULT_MARKER_PATH.to_string(),
            dependency_key: DEFAULT_DEPENDENCY_KEY.to_string(),
        }
    }
}

/// Result cache options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a scan result stays fresh.
    pub ttl_secs: u64,
    /// Cache file location. Defaults to the XDG cache directory.
    pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_CACHE_TTL.as_secs(),
            path: None,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/dakscan/config.toml)
    /// 3. Local config file (./dakscan.toml)
    /// 4. Environment variables with DAKSCAN_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from("dakscan.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./dakscan.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // e.g., DAKSCAN_SCAN__CONCURRENCY -> scan.concurrency
        builder = builder.add_source(
            Environment::with_prefix("DAKSCAN")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Self::from_builder(builder, token_from_env())
    }

    /// Build and deserialize, falling back to defaults on error.
    fn from_builder(builder: Builder<DefaultState>, env_token: Option<String>) -> Self {
        let builder = match builder.set_override_option("github.token", env_token) {
            Ok(builder) => builder,
            Err(e) => {
                tracing::warn!("Failed to apply token override: {}", e);
                return Config::default();
            }
        };

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Get the GitHub token, ignoring an empty value.
    pub fn github_token(&self) -> Option<&str> {
        self.github.token.as_deref().filter(|t| !t.is_empty())
    }

    /// Scanner options from the `[scan]` section.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            concurrency: self.scan.concurrency.max(1),
            compatibility: CompatibilityConfig {
                marker_path: self.scan.marker_path.clone(),
                dependency_key: self.scan.dependency_key.clone(),
            },
            retry_policy: RetryPolicy::default().with_max_retries(self.scan.max_retries),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    /// Cache file path, falling back to the default cache directory.
    pub fn cache_path(&self) -> Option<PathBuf> {
        self.cache.path.clone().or_else(|| {
            ProjectDirs::from("", "", "dakscan")
                .map(|dirs| dirs.cache_dir().join("scan-cache.json"))
        })
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dakscan").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Token from the conventional environment variables, first match wins.
fn token_from_env() -> Option<String> {
    ["DAKSCAN_GITHUB_TOKEN", "GITHUB_TOKEN"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(content: &str) -> Config {
        let builder =
            ConfigBuilder::builder().add_source(config::File::from_str(content, FileFormat::Toml));
        Config::from_builder(builder, None)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.github.token.is_none());
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.scan.concurrency, 8);
        assert_eq!(config.scan.max_retries, 1);
        assert_eq!(config.scan.marker_path, "sushi-config.yaml");
        assert_eq!(config.scan.dependency_key, "smart.who.int.base");
        assert_eq!(config.cache.ttl_secs, 300);
        assert!(config.cache.path.is_none());
    }

    #[test]
    fn test_config_from_toml() {
        let config = from_toml(
            r#"
            [github]
            token = "ghp_test123"
            api_url = "https://ghe.example.com/api/v3"

            [scan]
            concurrency = 4
            max_retries = 3
            dependency_key = "smart.who.int.custom"

            [cache]
            ttl_secs = 60
            path = "/tmp/dakscan-cache.json"
            "#,
        );

        assert_eq!(config.github_token(), Some("ghp_test123"));
        assert_eq!(config.github.api_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.scan.concurrency, 4);
        assert_eq!(config.scan.max_retries, 3);
        assert_eq!(config.scan.marker_path, "sushi-config.yaml");
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert_eq!(
            config.cache_path(),
            Some(PathBuf::from("/tmp/dakscan-cache.json"))
        );
    }

    #[test]
    fn test_env_token_overrides_file() {
        let builder = ConfigBuilder::builder().add_source(config::File::from_str(
            "[github]\ntoken = \"from-file\"\n",
            FileFormat::Toml,
        ));
        let config = Config::from_builder(builder, Some("from-env".to_string()));
        assert_eq!(config.github_token(), Some("from-env"));
    }

    #[test]
    fn test_empty_token_is_none() {
        let config = from_toml("[github]\ntoken = \"\"\n");
        assert_eq!(config.github_token(), None);
    }

    #[test]
    fn test_scan_options_from_config() {
        let config = from_toml(
            r#"
            [scan]
            concurrency = 0
            max_retries = 2
            marker_path = "input/sushi-config.yaml"
            "#,
        );
        let options = config.scan_options();
        assert_eq!(options.concurrency, 1);
        assert_eq!(options.retry_policy.max_retries, 2);
        assert_eq!(options.compatibility.marker_path, "input/sushi-config.yaml");
    }

    #[test]
    fn test_invalid_value_falls_back_to_defaults() {
        let config = from_toml("[scan]\nconcurrency = \"lots\"\n");
        assert_eq!(config.scan.concurrency, 8);
    }

    #[test]
    fn test_config_unknown_fields_ignored() {
        let config = from_toml("[scan]\nconcurrency = 3\nunknown_field = \"ignored\"\n");
        assert_eq!(config.scan.concurrency, 3);
    }

    #[test]
    fn test_default_cache_path_mentions_dakscan() {
        let config = Config::default();
        if let Some(path) = config.cache_path() {
            assert!(path.to_string_lossy().contains("dakscan"));
        }
    }
}
