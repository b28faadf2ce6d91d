use crate::url::CanonicalUrl;
use crate::{UrlError, UrlResult};
use url::Url;

/// Rewrites URLs into the crawl's canonical form
///
/// The crawl covers exactly one origin, taken from the seed URL. Every link is
/// forced onto that origin regardless of the host or scheme it was written
/// with; only path, query and fragment are kept from the link itself.
#[derive(Debug, Clone)]
pub struct LinkNormalizer {
    origin: Url,
}

impl LinkNormalizer {
    /// Creates a normalizer pinned to the scheme, host and port of `seed`
    ///
    /// # Examples
    ///
    /// ```
    /// use cachecrawl::url::LinkNormalizer;
    ///
    /// let normalizer = LinkNormalizer::new("https://example.test/").unwrap();
    /// let url = normalizer.normalize("https://other.test/b?x=1").unwrap();
    /// assert_eq!(url.as_str(), "https://example.test/b?x=1");
    /// ```
    pub fn new(seed: &str) -> UrlResult<Self> {
        let mut origin = Url::parse(seed).map_err(|e| UrlError::Parse(e.to_string()))?;

        if origin.scheme() != "http" && origin.scheme() != "https" {
            return Err(UrlError::InvalidScheme(origin.scheme().to_string()));
        }
        if origin.host_str().is_none() {
            return Err(UrlError::MissingHost);
        }

        // Credentials never belong to the identity space
        let _ = origin.set_username("");
        let _ = origin.set_password(None);
        origin.set_path("/");
        origin.set_query(None);
        origin.set_fragment(None);

        Ok(Self { origin })
    }

    pub fn scheme(&self) -> &str {
        self.origin.scheme()
    }

    pub fn host(&self) -> &str {
        self.origin.host_str().unwrap_or_default()
    }

    pub fn port(&self) -> Option<u16> {
        self.origin.port()
    }

    /// Canonicalizes `raw`, reporting why it was rejected
    ///
    /// Relative, root-relative, protocol-relative and absolute targets are
    /// resolved against the origin first. Targets without a hierarchical path
    /// (`mailto:`, `javascript:`, `data:`) are rejected.
    pub fn canonicalize(&self, raw: &str) -> UrlResult<CanonicalUrl> {
        let resolved = self
            .origin
            .join(raw)
            .map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

        if resolved.cannot_be_a_base() {
            return Err(UrlError::NotHierarchical(raw.to_string()));
        }

        let mut url = self.origin.clone();
        url.set_path(resolved.path());
        url.set_query(resolved.query());
        url.set_fragment(resolved.fragment());

        Ok(CanonicalUrl::from_url(url))
    }

    /// Canonicalizes an anchor target, dropping anything malformed
    pub fn normalize(&self, href: &str) -> Option<CanonicalUrl> {
        match self.canonicalize(href) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::trace!("Dropping link {:?}: {}", href, e);
                None
            }
        }
    }
}
