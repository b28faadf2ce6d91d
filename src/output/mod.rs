//! Output module for crawl summaries
//!
//! This module handles:
//! - Printing the per-round report of a finished crawl
//! - Reporting what the persisted stores hold

pub mod stats;

pub use stats::{load_statistics, print_statistics, CrawlStatistics};

use crate::crawler::CrawlReport;

/// Prints a finished crawl's report to stdout
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    let elapsed = report.finished_at - report.started_at;
    println!("Started:  {}", report.started_at.to_rfc3339());
    println!("Finished: {}", report.finished_at.to_rfc3339());
    println!("Duration: {}s", elapsed.num_seconds());
    println!();

    println!(
        "{:>5} {:>9} {:>8} {:>7} {:>9} {:>7} {:>6}",
        "round", "frontier", "fetched", "cached", "recovered", "failed", "next"
    );
    for round in &report.rounds {
        println!(
            "{:>5} {:>9} {:>8} {:>7} {:>9} {:>7} {:>6}",
            round.round,
            round.frontier,
            round.fetched,
            round.cached,
            round.recovered,
            round.failed,
            round.next_frontier
        );
    }
    println!();

    println!("Pages fetched: {}", report.pages_fetched());
    println!("Failed fetches: {}", report.failures());
    if report.converged() {
        println!("Frontier emptied: crawl has converged");
    } else {
        println!("URLs left for the next run: {}", report.final_frontier);
    }
}
