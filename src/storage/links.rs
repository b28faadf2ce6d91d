use crate::storage::blob::CompressedDir;
use crate::storage::traits::{DigestStore, StorageResult};
use crate::url::{Digest, LinkSet};
use std::path::Path;

/// Persistent digest → outbound link set map
///
/// Each entry is a JSON array of canonical URL strings.
#[derive(Debug, Clone)]
pub struct LinkIndex {
    dir: CompressedDir,
}

impl LinkIndex {
    pub fn open(path: &Path) -> StorageResult<Self> {
        Ok(Self {
            dir: CompressedDir::open(path)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.root()
    }

    /// Unions every stored link set
    ///
    /// This is the frontier a resumed crawl starts from.
    pub fn load_frontier(&self) -> StorageResult<LinkSet> {
        let mut frontier = LinkSet::new();
        for digest in self.digests()? {
            if let Some(links) = self.get(&digest)? {
                frontier.extend(links);
            }
        }
        Ok(frontier)
    }
}

impl DigestStore for LinkIndex {
    type Value = LinkSet;

    fn has(&self, digest: &Digest) -> bool {
        self.dir.contains(digest)
    }

    fn get(&self, digest: &Digest) -> StorageResult<Option<LinkSet>> {
        match self.dir.read(digest)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put(&self, digest: &Digest, value: &LinkSet) -> StorageResult<bool> {
        let payload = serde_json::to_vec(value)?;
        self.dir.write_once(digest, &payload)
    }

    fn digests(&self) -> StorageResult<Vec<Digest>> {
        self.dir.digests()
    }
}
