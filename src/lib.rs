//! Cachecrawl: a content-addressed breadth-first crawler
//!
//! This crate crawls a single web property in fixed rounds, persisting every
//! fetched page and its outbound links under a digest of the page URL so that
//! repeated runs never fetch or process the same page twice.

pub mod config;
pub mod crawler;
pub mod output;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid proxy entry on line {line}: {message}")]
    InvalidProxy { line: usize, message: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("URL has no hierarchical path: {0}")]
    NotHierarchical(String),
}

/// Errors raised at the fetcher boundary
///
/// Everything except [`FetchError::Storage`] is absorbed by the crawl driver
/// and treated as "this page has no outbound links this round".
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Unexpected HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Storage error for {url}: {source}")]
    Storage {
        url: String,
        source: storage::StorageError,
    },
}

impl FetchError {
    /// Returns true if the error must abort the crawl
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }

    /// The URL the failed fetch was for
    pub fn url(&self) -> &str {
        match self {
            Self::Http { url, .. }
            | Self::Timeout { url }
            | Self::Status { url, .. }
            | Self::Storage { url, .. } => url,
        }
    }
}

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlReport, Fetcher, Frontier, ProxyPool};
pub use storage::{ContentStore, DigestStore, LinkIndex};
pub use crate::url::{digest, CanonicalUrl, Digest, LinkNormalizer, LinkSet};
