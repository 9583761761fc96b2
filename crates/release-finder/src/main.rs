//! Release finder CLI application.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use release_finder::{parse_catalogue_ref, HttpClient, ReleaseSelector, SeadexClient, SearchProvider};
use serde::Serialize;
use shared::{Config, LogConfig};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve an AniList id or URL to its AniDB mapping
    Mapping {
        /// AniList id or anime URL
        catalogue: String,
    },
    /// Ranked releases for one episode
    Episode {
        /// AniList id or anime URL
        catalogue: String,
        /// Episode label exactly as the mapping lists it
        episode: String,
    },
    /// Ranked releases for a whole series by AniDB id
    Series {
        /// AniDB anime id
        secondary_id: String,
    },
    /// Ranked series releases for an AniList id or URL
    Catalogue {
        /// AniList id or anime URL
        catalogue: String,
    },
    /// Extract a single torrent detail page
    Inspect {
        /// Detail page URL
        url: String,
    },
    /// SeaDex curated releases for an AniList id or URL
    Seadex {
        /// AniList id or anime URL
        catalogue: String,
    },
    /// Write the default configuration to the --config path
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Initialize logging
    let mut log_config = LogConfig::from_config(&config.logging, "release-finder");
    if args.verbose {
        log_config.default_level = tracing::Level::DEBUG;
    }
    shared::logging::init(log_config)?;

    debug!(config_file = %args.config.display(), "Loaded configuration");

    run(args.command, &config, &args.config).await
}

fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("Refusing to overwrite existing config {}", path.display());
    }
    Config::default().save(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

async fn run(command: Command, config: &Config, config_path: &Path) -> Result<()> {
    let selector = ReleaseSelector::from_config(config).context("Failed to build pipeline")?;

    match command {
        Command::Mapping { catalogue } => {
            let mapping = selector.mapping(&catalogue).await?;
            print_json(&mapping)
        }
        Command::Episode { catalogue, episode } => {
            info!(catalogue = %catalogue, episode = %episode, "Looking up episode releases");
            let releases = selector.best_release_for_episode(&catalogue, &episode).await?;
            print_json(&releases)
        }
        Command::Series { secondary_id } => {
            let releases = selector.releases_for_series(&secondary_id).await?;
            print_json(&releases)
        }
        Command::Catalogue { catalogue } => {
            let releases = selector.releases_for_catalogue(&catalogue).await?;
            print_json(&releases)
        }
        Command::Inspect { url } => {
            let client = HttpClient::new(&config.http)?;
            let search = SearchProvider::new(client, &config.providers.search_url);
            let release = search
                .release_at(&url)
                .await
                .with_context(|| format!("Failed to extract {}", url))?;
            print_json(&release)
        }
        Command::Seadex { catalogue } => {
            let catalogue_ref = parse_catalogue_ref(&catalogue)
                .ok_or_else(|| anyhow!("Not an AniList id or URL: {}", catalogue))?;
            let client = HttpClient::new(&config.http)?;
            let seadex = SeadexClient::new(client, &config.providers.seadex_url);
            let entry = seadex
                .release_data(&catalogue_ref)
                .await
                .context("SeaDex lookup failed")?;
            print_json(&entry)
        }
        Command::InitConfig => init_config(config_path),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{}", json);
    Ok(())
}
