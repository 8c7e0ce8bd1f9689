//! Sumi-Mirror main entry point
//!
//! This is the command-line interface for the Sumi-Mirror website cloner.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use sumi_mirror::config::{load_config, validate, Config};
use sumi_mirror::output::print_statistics;
use sumi_mirror::storage::{ExistingClone, JsonMetadataStore, MetadataStore};
use sumi_mirror::{validate_target_url, CloneResult, Coordinator};
use tracing_subscriber::EnvFilter;

/// Sumi-Mirror: an offline website cloner
///
/// Sumi-Mirror crawls a website from the given URL, rewrites its pages to
/// reference local copies of images, stylesheets and scripts, and writes a
/// directory tree that can be browsed without network access.
///
/// The output directory is cleared before every clone.
#[derive(Parser, Debug)]
#[command(name = "sumi-mirror")]
#[command(version)]
#[command(about = "An offline website cloner", long_about = None)]
struct Cli {
    /// URL of the site to clone
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Output directory (default: <base-dir>/<host>)
    #[arg(short, long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Maximum number of pages to visit
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Maximum simultaneous asset downloads
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Do not fetch or honor robots.txt
    #[arg(long)]
    ignore_robots: bool,

    /// Only download assets from the site's own origin
    #[arg(long)]
    no_external_assets: bool,

    /// Clone even if the output directory already holds a clone of this URL
    #[arg(long)]
    force: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli).context("Invalid configuration")?;
    let source_url = validate_target_url(&cli.url)
        .with_context(|| format!("Invalid target URL: {}", cli.url))?;
    let out_dir = config.output.resolve(&source_url);

    let store = JsonMetadataStore::new();
    if !cli.force {
        if let Some(existing) = store.find_existing(&out_dir, &source_url) {
            report_existing(&existing);
            return Ok(());
        }
    }

    let coordinator = Coordinator::new(config).context("Failed to build HTTP client")?;
    let result = match coordinator.clone_site(&cli.url).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Clone failed: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = save_metadata(&store, &result) {
        tracing::warn!(
            "Failed to write clone metadata to {}: {}",
            result.output_path.display(),
            e
        );
    }

    if !cli.quiet {
        println!("Cloned {} into {}\n", result.source_url, result.output_path.display());
        print_statistics(&result.statistics);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_mirror=info,warn"),
            1 => EnvFilter::new("sumi_mirror=debug,info"),
            2 => EnvFilter::new("sumi_mirror=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file (or defaults) and applies command-line overrides
fn build_config(cli: &Cli) -> sumi_mirror::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)?
        }
        None => Config::default(),
    };

    if let Some(out) = &cli.out {
        config.output.out_dir = Some(out.clone());
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.concurrency = concurrency;
    }
    if cli.ignore_robots {
        config.crawler.respect_robots = false;
    }
    if cli.no_external_assets {
        config.crawler.mirror_external_assets = false;
    }

    validate(&config)?;
    Ok(config)
}

/// Records provenance next to a finished clone
fn save_metadata(store: &impl MetadataStore, result: &CloneResult) -> sumi_mirror::Result<()> {
    let metadata = store.save(&result.output_path, result)?;
    tracing::debug!("Recorded clone of {} at {}", metadata.source_url, metadata.cloned_at);
    Ok(())
}

/// Tells the user about a clone that is already on disk
fn report_existing(existing: &ExistingClone) {
    println!("A clone already exists in {}", existing.path.display());

    if existing.is_legacy {
        println!("  (created by an older version; clone date unknown)");
    } else {
        if let Some(source) = &existing.source_url {
            println!("  Source: {}", source);
        }
        if let Some(cloned_at) = &existing.cloned_at {
            println!("  Cloned at: {}", cloned_at.to_rfc3339());
        }
        if let Some(stats) = &existing.statistics {
            println!(
                "  Pages: {}, assets: {}",
                stats.pages_cloned, stats.assets_downloaded
            );
        }
    }

    println!("\nRun again with --force to replace it.");
}
