use sha2::{Digest as _, Sha224};
use std::fmt;

/// Number of hex characters kept from the SHA-224 output
pub const DIGEST_LEN: usize = 24;

/// Fixed-length storage key derived from a URL
///
/// Lowercase hex, safe to use directly as a file name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest(String);

impl Digest {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recovers a digest from a cache entry file name
    ///
    /// Returns `None` for anything that is not exactly [`DIGEST_LEN`] lowercase
    /// hex characters, so stray files in a store directory are ignored.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let valid = name.len() == DIGEST_LEN
            && name
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(name.to_string()))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes the storage digest of a string
///
/// The first [`DIGEST_LEN`] hex characters of SHA-224 over the UTF-8 bytes.
/// Not used for any security purpose.
///
/// # Example
///
/// ```
/// use cachecrawl::url::digest;
///
/// assert_eq!(digest("abc").as_str(), "23097d223405d8228642a477");
/// ```
pub fn digest(input: &str) -> Digest {
    let hash = Sha224::digest(input.as_bytes());
    let mut encoded = hex::encode(hash);
    encoded.truncate(DIGEST_LEN);
    Digest(encoded)
}
