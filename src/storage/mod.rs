//! Storage module for persisting crawl data
//!
//! This module handles the two on-disk, digest-keyed stores the crawl writes:
//! - The content store: sanitized page bodies
//! - The link index: each page's normalized outbound links
//!
//! Both are directories of gzip-compressed files named by digest. They are
//! append-only, which is what makes a crawl safely restartable at any point.

mod blob;
mod links;
mod pages;
mod traits;

pub use links::LinkIndex;
pub use pages::ContentStore;
pub use traits::{DigestStore, StorageError, StorageResult};

use crate::config::StorageConfig;

/// Opens both stores described by the configuration
///
/// # Arguments
///
/// * `config` - The storage section of the crawler configuration
///
/// # Returns
///
/// * `Ok((ContentStore, LinkIndex))` - Both directories exist and are usable
/// * `Err(StorageError)` - A directory could not be created
pub fn open_storage(config: &StorageConfig) -> StorageResult<(ContentStore, LinkIndex)> {
    let pages = ContentStore::open(&config.pages_dir)?;
    let links = LinkIndex::open(&config.links_dir)?;
    Ok((pages, links))
}
