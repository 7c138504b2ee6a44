//! dakscan CLI - find DAK repositories on GitHub.

mod commands;
mod config;
mod progress;
mod shutdown;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

use crate::commands::OutputFormat;

#[derive(Parser)]
#[command(name = "dakscan")]
#[command(version)]
#[command(about = "Find Digital Adaptation Kit (DAK) repositories on GitHub")]
#[command(
    long_about = "dakscan checks every repository of a GitHub user or organization for a \
sushi-config.yaml that depends on smart.who.int.base, and lists the repositories that are DAKs. \
Results are cached for a few minutes so repeated scans are cheap."
)]
#[command(after_long_help = r#"EXAMPLES
    Scan an organization:
        $ dakscan scan WorldHealthOrganization --org

    Scan a user, ignoring cached results:
        $ dakscan scan some-user --refresh

    Machine-readable output:
        $ dakscan scan WorldHealthOrganization --org --output json

    Inspect the cache for one repository:
        $ dakscan cache info WorldHealthOrganization smart-base

    Generate shell completions:
        $ dakscan completions bash > ~/.local/share/bash-completion/completions/dakscan

CONFIGURATION
    dakscan reads configuration from:
      1. ~/.config/dakscan/config.toml (or $XDG_CONFIG_HOME/dakscan/config.toml)
      2. ./dakscan.toml
      3. Environment variables (DAKSCAN_ prefix, e.g. DAKSCAN_SCAN__CONCURRENCY)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    DAKSCAN_GITHUB_TOKEN      GitHub personal access token (GITHUB_TOKEN also works)
    DAKSCAN_GITHUB__API_URL   GitHub API root (default: https://api.github.com)
    DAKSCAN_CACHE__TTL_SECS   Cache lifetime in seconds (default: 300)
    RUST_LOG                  Log filter when output is not a terminal
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan an owner's repositories for DAKs
    Scan(ScanArgs),
    /// Inspect or clear the result cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

/// Options for the scan command.
#[derive(Debug, Clone, clap::Args)]
struct ScanArgs {
    /// GitHub user or organization
    owner: String,

    /// Treat the owner as an organization
    #[arg(long)]
    org: bool,

    /// Ignore cached results and rescan every repository
    #[arg(short = 'r', long)]
    refresh: bool,

    /// Maximum concurrent checks (default from config or 8)
    #[arg(short = 'c', long)]
    concurrency: Option<usize>,

    /// Disable proactive rate limiting (may cause API throttling)
    #[arg(short = 'R', long)]
    no_rate_limit: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show cache freshness for an owner or one of its repositories
    Info {
        /// GitHub user or organization
        owner: String,
        /// Repository name (omit for the owner's whole scan)
        repo: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Remove every cached result
    Clear,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Structured logging only when not attached to a terminal
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("dakscan=info,dakscan_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let config = config::Config::load();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(args) => {
            commands::scan::handle_scan(args, &config).await?;
        }
        Commands::Cache { action } => {
            commands::cache::handle_cache(action, &config)?;
        }
        Commands::Completions { shell } => {
            commands::meta::handle_completions(shell)?;
        }
    }

    Ok(())
}
