use crate::storage::blob::CompressedDir;
use crate::storage::traits::{DigestStore, StorageError, StorageResult};
use crate::url::{CanonicalUrl, Digest};
use std::path::Path;

/// Persistent digest → sanitized page body map
///
/// This is also the read API for consumers of the crawl output: look a page
/// up by the digest of its canonical URL.
#[derive(Debug, Clone)]
pub struct ContentStore {
    dir: CompressedDir,
}

impl ContentStore {
    pub fn open(path: &Path) -> StorageResult<Self> {
        Ok(Self {
            dir: CompressedDir::open(path)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.root()
    }

    /// Reads the cached body of `url`, if it was ever fetched
    pub fn get_page(&self, url: &CanonicalUrl) -> StorageResult<Option<String>> {
        self.get(&url.digest())
    }
}

impl DigestStore for ContentStore {
    type Value = String;

    fn has(&self, digest: &Digest) -> bool {
        self.dir.contains(digest)
    }

    fn get(&self, digest: &Digest) -> StorageResult<Option<String>> {
        match self.dir.read(digest)? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| StorageError::Encoding {
                    digest: digest.to_string(),
                }),
            None => Ok(None),
        }
    }

    fn put(&self, digest: &Digest, value: &String) -> StorageResult<bool> {
        self.dir.write_once(digest, value.as_bytes())
    }

    fn digests(&self) -> StorageResult<Vec<Digest>> {
        self.dir.digests()
    }
}
