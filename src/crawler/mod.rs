//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Proxy rotation for outbound requests
//! - Cache-first fetching into the content store and link index
//! - HTML sanitizing and link extraction
//! - Round-based crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod proxy;

pub use coordinator::{Coordinator, CrawlPhase};
pub use fetcher::{FetchOutcome, FetchSource, Fetcher};
pub use parser::{extract_hrefs, parse_page, ParsedPage};
pub use proxy::{build_http_client, ProxyPool, ProxyRoute};

use crate::config::Config;
use crate::url::LinkSet;
use crate::CrawlError;
use chrono::{DateTime, Utc};

/// URLs to visit in the current round
pub type Frontier = LinkSet;

/// Counters for one completed round
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundStats {
    pub round: u32,

    /// URLs dispatched this round
    pub frontier: usize,

    /// Served from the link index
    pub cached: usize,

    /// Links re-derived from an already stored page
    pub recovered: usize,

    /// Downloaded and stored
    pub fetched: usize,

    /// Network, status or task failures
    pub failed: usize,

    /// Size of the union handed to the next round
    pub next_frontier: usize,
}

/// Summary of a whole crawl run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub rounds: Vec<RoundStats>,

    /// URLs that would make up the next round
    pub final_frontier: usize,
}

impl CrawlReport {
    /// Pages downloaded across all rounds
    pub fn pages_fetched(&self) -> usize {
        self.rounds.iter().map(|r| r.fetched).sum()
    }

    pub fn failures(&self) -> usize {
        self.rounds.iter().map(|r| r.failed).sum()
    }

    /// True once a round produced an empty frontier
    pub fn converged(&self) -> bool {
        self.rounds.iter().any(|r| r.next_frontier == 0)
    }
}

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the content store and link index
/// 2. Build the proxy pool
/// 3. Seed or resume the frontier
/// 4. Run the configured number of rounds
///
/// # Example
///
/// ```no_run
/// use cachecrawl::config::load_config;
/// use cachecrawl::crawler::crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("crawl.toml"))?;
/// let report = crawl(&config).await?;
/// println!("{} pages fetched", report.pages_fetched());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: &Config) -> Result<CrawlReport, CrawlError> {
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run().await
}
