//! Cachecrawl main entry point
//!
//! This is the command-line interface for the content-addressed crawler.

use anyhow::Context;
use cachecrawl::config::{load_config_with_hash, override_rounds, Config};
use cachecrawl::crawler::Coordinator;
use cachecrawl::output::{load_statistics, print_report, print_statistics};
use cachecrawl::storage::open_storage;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Cachecrawl: a content-addressed breadth-first crawler
///
/// Crawls one site in fixed rounds through a pool of proxies, storing every
/// page and its outbound links under a digest of the page URL. Re-running
/// resumes from whatever is already stored.
#[derive(Parser, Debug)]
#[command(name = "cachecrawl")]
#[command(version)]
#[command(about = "A content-addressed breadth-first crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Override the number of rounds from the config file
    #[arg(long, value_name = "N")]
    rounds: Option<u32>,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics about the stored pages and links and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if let Some(rounds) = cli.rounds {
        override_rounds(&mut config, rounds).context("applying --rounds")?;
    }

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("cachecrawl=info,warn"),
            1 => EnvFilter::new("cachecrawl=debug,info"),
            2 => EnvFilter::new("cachecrawl=trace,debug"),
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

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Cachecrawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed: {}", config.crawler.seed);
    println!("  Rounds: {}", config.crawler.rounds);
    println!("  Pool size: {}", config.crawler.pool_size);
    println!(
        "  Timeouts: {}s connect, {}s request",
        config.crawler.connect_timeout_secs, config.crawler.request_timeout_secs
    );

    println!("\nStorage:");
    println!("  Pages: {}", config.storage.pages_dir.display());
    println!("  Links: {}", config.storage.links_dir.display());

    println!("\nProxies ({}):", config.proxy.endpoints.len());
    for endpoint in &config.proxy.endpoints {
        println!("  - {} (user {})", endpoint, endpoint.username);
    }
    if config.proxy.endpoints.is_empty() {
        println!("  (none: requests go out directly)");
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: summarizes the stores on disk
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let (pages, links) = open_storage(&config.storage).context("opening stores")?;
    let stats = load_statistics(&pages, &links).context("reading stores")?;
    print_statistics(&stats);
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling {} for {} rounds with {} workers",
        config.crawler.seed,
        config.crawler.rounds,
        config.crawler.pool_size
    );

    let mut coordinator = Coordinator::new(config).context("initializing crawler")?;
    match coordinator.run().await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
