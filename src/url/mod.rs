//! URL handling module
//!
//! This module provides the crawl's addressing space: canonical URLs pinned to
//! a fixed scheme and host, the digest used as their storage identity, and the
//! normalizer that turns raw anchor targets into canonical URLs.

mod digest;
mod normalize;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// Re-export main functions
pub use digest::{digest, Digest, DIGEST_LEN};
pub use normalize::LinkNormalizer;

/// A URL rewritten to the crawl's fixed scheme and host
///
/// Only [`LinkNormalizer`] constructs these from raw input. Values read back
/// from the link index are trusted as already canonical.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalUrl(String);

impl CanonicalUrl {
    pub(crate) fn from_url(url: ::url::Url) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Storage identity of this URL
    pub fn digest(&self) -> Digest {
        digest(&self.0)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Outbound links discovered on one page
///
/// Ordered so that the persisted JSON array is stable across runs.
pub type LinkSet = BTreeSet<CanonicalUrl>;
