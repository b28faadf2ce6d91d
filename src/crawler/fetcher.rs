//! Cache-first page fetcher
//!
//! This module turns a canonical URL into that page's outbound links:
//! - Link index hit: stored links, no network
//! - Page stored but links missing: links re-derived from the stored page
//! - Otherwise: one GET through a random proxy, then sanitize, store the page,
//!   extract and store its links
//!
//! Network and content failures surface as non-fatal [`FetchError`]s and leave
//! nothing behind in either store, so the URL can be retried if rediscovered.

use crate::crawler::parser::{extract_hrefs, parse_page};
use crate::crawler::proxy::ProxyPool;
use crate::storage::{ContentStore, DigestStore, LinkIndex, StorageError, StorageResult};
use crate::url::{CanonicalUrl, Digest, LinkNormalizer, LinkSet};
use crate::FetchError;
use chrono::Utc;

/// How a link set was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    /// Read from the link index
    Cached,

    /// Re-derived from a stored page whose link set was never written
    Recovered,

    /// Downloaded in this call
    Fetched,
}

/// Result of a successful fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub links: LinkSet,
    pub source: FetchSource,
}

/// Fetches pages through the proxy pool, caching everything it downloads
///
/// Holds no mutable state of its own; share it between workers behind an
/// `Arc`.
#[derive(Debug)]
pub struct Fetcher {
    pages: ContentStore,
    links: LinkIndex,
    proxies: ProxyPool,
    normalizer: LinkNormalizer,
}

impl Fetcher {
    pub fn new(
        pages: ContentStore,
        links: LinkIndex,
        proxies: ProxyPool,
        normalizer: LinkNormalizer,
    ) -> Self {
        Self {
            pages,
            links,
            proxies,
            normalizer,
        }
    }

    pub fn pages(&self) -> &ContentStore {
        &self.pages
    }

    pub fn links(&self) -> &LinkIndex {
        &self.links
    }

    pub fn normalizer(&self) -> &LinkNormalizer {
        &self.normalizer
    }

    /// Returns the outbound links of `url`, fetching it only if uncached
    ///
    /// A link index hit is returned exactly as stored. Newly written link sets
    /// leave out links pointing at pages that already have a content store
    /// entry.
    ///
    /// Store reads and writes run on tokio's blocking pool.
    ///
    /// # Returns
    ///
    /// * `Ok(FetchOutcome)` - The page's links and where they came from
    /// * `Err(FetchError)` - Network/status failure (non-fatal) or storage
    ///   failure (fatal, see [`FetchError::is_fatal`])
    pub async fn fetch(&self, url: &CanonicalUrl) -> Result<FetchOutcome, FetchError> {
        let digest = url.digest();

        let links = self.links.clone();
        let key = digest.clone();
        if let Some(cached) = blocking(url, move || links.get(&key)).await? {
            tracing::trace!("Link index hit for {} ({})", url, digest);
            return Ok(FetchOutcome {
                links: cached,
                source: FetchSource::Cached,
            });
        }

        let pages = self.pages.clone();
        let key = digest.clone();
        if let Some(html) = blocking(url, move || pages.get(&key)).await? {
            tracing::debug!("Recovering links for stored page {}", url);
            let links = self.store_links(url, &digest, extract_hrefs(&html)).await?;
            return Ok(FetchOutcome {
                links,
                source: FetchSource::Recovered,
            });
        }

        let body = self.download(url).await?;
        let page = parse_page(&body, url.as_str(), Utc::now());

        let pages = self.pages.clone();
        let key = digest.clone();
        let html = page.html;
        blocking(url, move || pages.put(&key, &html)).await?;

        let links = self.store_links(url, &digest, page.hrefs).await?;
        tracing::debug!("Fetched {} ({} new links)", url, links.len());
        Ok(FetchOutcome {
            links,
            source: FetchSource::Fetched,
        })
    }

    /// Issues one GET through a randomly chosen route
    async fn download(&self, url: &CanonicalUrl) -> Result<String, FetchError> {
        let route = self.proxies.pick();
        tracing::trace!("GET {} via {}", url, route.label());

        let response = route
            .client()
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| network_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| network_error(url, e))
    }

    /// Normalizes `hrefs`, drops already stored pages and writes the set
    async fn store_links(
        &self,
        url: &CanonicalUrl,
        digest: &Digest,
        hrefs: Vec<String>,
    ) -> Result<LinkSet, FetchError> {
        let candidates: LinkSet = hrefs
            .iter()
            .filter_map(|href| self.normalizer.normalize(href))
            .collect();

        let pages = self.pages.clone();
        let links = self.links.clone();
        let key = digest.clone();
        blocking(url, move || {
            // Best-effort: a concurrent fetch may store one of these pages
            // right after the check. The round's set union absorbs that.
            let fresh: LinkSet = candidates
                .into_iter()
                .filter(|link| !pages.has(&link.digest()))
                .collect();
            links.put(&key, &fresh)?;
            Ok(fresh)
        })
        .await
    }
}

/// Runs a store operation on the blocking pool
async fn blocking<T, F>(url: &CanonicalUrl, task: F) -> Result<T, FetchError>
where
    F: FnOnce() -> StorageResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(StorageError::from)
        .and_then(|result| result)
        .map_err(storage_error(url))
}

fn storage_error(url: &CanonicalUrl) -> impl FnOnce(StorageError) -> FetchError + '_ {
    move |source| FetchError::Storage {
        url: url.to_string(),
        source,
    }
}

fn network_error(url: &CanonicalUrl, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
