//! Statistics over the persisted stores
//!
//! This module provides functionality for inspecting what a crawl has
//! accumulated on disk without running another round.

use crate::storage::{ContentStore, DigestStore, LinkIndex, StorageError};

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Entries in the content store
    pub pages: usize,

    /// Entries in the link index
    pub link_sets: usize,

    /// Size of the frontier a resumed crawl would start with
    pub resume_frontier: usize,

    /// Resume frontier URLs that have no stored page yet
    pub unfetched: usize,
}

/// Loads statistics from both stores
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - A store could not be read
pub fn load_statistics(
    pages: &ContentStore,
    links: &LinkIndex,
) -> Result<CrawlStatistics, StorageError> {
    let frontier = links.load_frontier()?;
    let unfetched = frontier
        .iter()
        .filter(|url| !pages.has(&url.digest()))
        .count();

    Ok(CrawlStatistics {
        pages: pages.len()?,
        link_sets: links.len()?,
        resume_frontier: frontier.len(),
        unfetched,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Stores:");
    println!("  Pages stored: {}", stats.pages);
    println!("  Link sets stored: {}", stats.link_sets);
    println!();

    println!("Resume:");
    println!("  Frontier size: {}", stats.resume_frontier);
    let percentage = if stats.resume_frontier > 0 {
        (stats.unfetched as f64 / stats.resume_frontier as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "  Not yet fetched: {} ({:.1}%)",
        stats.unfetched, percentage
    );
}
