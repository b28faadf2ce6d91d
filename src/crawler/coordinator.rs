//! Crawler coordinator - round-based BFS orchestration
//!
//! This module contains the crawl loop:
//! - Seeding the frontier from the link index, or from the seed URL
//! - Fanning each round's frontier out over a bounded pool of tasks
//! - Unioning the returned link sets into the next frontier
//! - Repeating for a fixed number of rounds

use crate::config::Config;
use crate::crawler::fetcher::{FetchOutcome, FetchSource, Fetcher};
use crate::crawler::proxy::ProxyPool;
use crate::crawler::{CrawlReport, Frontier, RoundStats};
use crate::storage::open_storage;
use crate::url::{CanonicalUrl, LinkNormalizer};
use crate::{CrawlError, FetchError};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

/// Completed fetches between progress log lines
const PROGRESS_INTERVAL: usize = 100;

type Joined = Result<Result<FetchOutcome, FetchError>, JoinError>;

/// Where the driver is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Seeding,
    Running { round: u32 },
    Done,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    fetcher: Arc<Fetcher>,
    seed: CanonicalUrl,
    rounds: u32,
    pool_size: usize,
    phase: CrawlPhase,
}

impl Coordinator {
    /// Creates a coordinator from configuration
    ///
    /// Opens both stores, builds the proxy pool and pins the crawl to the
    /// seed's origin.
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(CrawlError)` - A store could not be opened or a client built
    pub fn new(config: &Config) -> Result<Self, CrawlError> {
        let (pages, links) = open_storage(&config.storage)?;
        let proxies = ProxyPool::new(&config.proxy.endpoints, &config.crawler)?;
        let normalizer = LinkNormalizer::new(&config.crawler.seed)?;
        let seed = normalizer.canonicalize(&config.crawler.seed)?;

        let fetcher = Fetcher::new(pages, links, proxies, normalizer);
        Ok(Self::with_fetcher(
            fetcher,
            seed,
            config.crawler.rounds,
            config.crawler.pool_size,
        ))
    }

    /// Creates a coordinator around an existing fetcher
    pub fn with_fetcher(fetcher: Fetcher, seed: CanonicalUrl, rounds: u32, pool_size: usize) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            seed,
            rounds,
            pool_size: pool_size.max(1),
            phase: CrawlPhase::Seeding,
        }
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Builds the round-0 frontier
    ///
    /// Resumes from every persisted link set; falls back to the seed when the
    /// link index holds no links at all.
    pub fn seed_frontier(&mut self) -> Result<Frontier, CrawlError> {
        self.phase = CrawlPhase::Seeding;

        let mut frontier = self.fetcher.links().load_frontier()?;
        if frontier.is_empty() {
            tracing::info!("Link index is empty, seeding with {}", self.seed);
            frontier.insert(self.seed.clone());
        } else {
            tracing::info!("Resuming with {} URLs from the link index", frontier.len());
        }

        Ok(frontier)
    }

    /// Runs every configured round
    ///
    /// An empty frontier is not treated specially: the remaining rounds still
    /// run and do nothing.
    pub async fn run(&mut self) -> Result<CrawlReport, CrawlError> {
        let started_at = Utc::now();
        let mut frontier = self.seed_frontier()?;
        let mut rounds = Vec::with_capacity(self.rounds as usize);

        for round in 0..self.rounds {
            let (next, stats) = self.run_round(round, frontier).await?;
            rounds.push(stats);
            frontier = next;
        }

        self.phase = CrawlPhase::Done;
        let report = CrawlReport {
            started_at,
            finished_at: Utc::now(),
            rounds,
            final_frontier: frontier.len(),
        };

        tracing::info!(
            "Crawl finished: {} rounds, {} pages fetched, {} URLs left in frontier",
            report.rounds.len(),
            report.pages_fetched(),
            report.final_frontier
        );

        Ok(report)
    }

    /// Fetches every frontier URL and unions the results
    ///
    /// At most `pool_size` fetches are in flight at once. The returned frontier
    /// is only built after every fetch of this round has completed. A fatal
    /// (storage) error stops dispatching, waits for in-flight fetches and is
    /// returned.
    pub async fn run_round(
        &mut self,
        round: u32,
        frontier: Frontier,
    ) -> Result<(Frontier, RoundStats), CrawlError> {
        self.phase = CrawlPhase::Running { round };
        tracing::info!("Round {}: {} URLs in frontier", round, frontier.len());

        let mut tally = RoundTally::new(round, frontier.len());
        let semaphore = Arc::new(Semaphore::new(self.pool_size));
        let mut tasks = JoinSet::new();

        for url in frontier {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| CrawlError::WorkerPool(e.to_string()))?;

            let fetcher = Arc::clone(&self.fetcher);
            tasks.spawn(async move {
                let _permit = permit;
                fetcher.fetch(&url).await
            });

            while let Some(joined) = tasks.try_join_next() {
                tally.absorb(joined);
            }
            if tally.fatal.is_some() {
                break;
            }
        }

        while let Some(joined) = tasks.join_next().await {
            tally.absorb(joined);
        }

        let (next, stats) = tally.finish()?;
        tracing::info!(
            "Round {} done: {} fetched, {} cached, {} recovered, {} failed; next frontier {}",
            round,
            stats.fetched,
            stats.cached,
            stats.recovered,
            stats.failed,
            stats.next_frontier
        );

        Ok((next, stats))
    }
}

/// Accumulates one round's results
struct RoundTally {
    stats: RoundStats,
    next: Frontier,
    completed: usize,
    fatal: Option<FetchError>,
}

impl RoundTally {
    fn new(round: u32, frontier: usize) -> Self {
        Self {
            stats: RoundStats {
                round,
                frontier,
                ..RoundStats::default()
            },
            next: Frontier::new(),
            completed: 0,
            fatal: None,
        }
    }

    fn absorb(&mut self, joined: Joined) {
        self.completed += 1;

        match joined {
            Ok(Ok(outcome)) => {
                match outcome.source {
                    FetchSource::Cached => self.stats.cached += 1,
                    FetchSource::Recovered => self.stats.recovered += 1,
                    FetchSource::Fetched => self.stats.fetched += 1,
                }
                self.next.extend(outcome.links);
            }
            Ok(Err(e)) if e.is_fatal() => {
                tracing::error!("{}", e);
                self.stats.failed += 1;
                if self.fatal.is_none() {
                    self.fatal = Some(e);
                }
            }
            Ok(Err(e)) => {
                tracing::warn!("{}", e);
                self.stats.failed += 1;
            }
            Err(e) => {
                tracing::error!("Fetch task failed: {}", e);
                self.stats.failed += 1;
            }
        }

        if self.completed % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                "Round {}: {}/{} done, {} URLs queued for next round",
                self.stats.round,
                self.completed,
                self.stats.frontier,
                self.next.len()
            );
        }
    }

    fn finish(mut self) -> Result<(Frontier, RoundStats), CrawlError> {
        if let Some(e) = self.fatal.take() {
            return Err(e.into());
        }
        self.stats.next_frontier = self.next.len();
        Ok((self.next, self.stats))
    }
}
