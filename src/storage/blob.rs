//! Directory of gzip-compressed, digest-named files
//!
//! Both stores sit on top of this. Each entry is one file named by its
//! digest; writes go to a hidden temporary file first and are renamed into
//! place, so a reader either sees the complete entry or nothing.

use crate::storage::traits::{StorageError, StorageResult};
use crate::url::Digest;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub(crate) struct CompressedDir {
    root: PathBuf,
}

impl CompressedDir {
    /// Opens (creating if necessary) the directory at `root`
    pub(crate) fn open(root: &Path) -> StorageResult<Self> {
        fs::create_dir_all(root).map_err(|e| StorageError::io(root, e))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn path_for(&self, digest: &Digest) -> PathBuf {
        self.root.join(digest.as_str())
    }

    pub(crate) fn contains(&self, digest: &Digest) -> bool {
        self.path_for(digest).is_file()
    }

    /// Reads and decompresses an entry
    pub(crate) fn read(&self, digest: &Digest) -> StorageResult<Option<Vec<u8>>> {
        let path = self.path_for(digest);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io(path, e)),
        };

        let mut payload = Vec::new();
        GzDecoder::new(file)
            .read_to_end(&mut payload)
            .map_err(|e| StorageError::io(&path, e))?;
        Ok(Some(payload))
    }

    /// Compresses and writes an entry unless it already exists
    pub(crate) fn write_once(&self, digest: &Digest, payload: &[u8]) -> StorageResult<bool> {
        let path = self.path_for(digest);
        if path.is_file() {
            return Ok(false);
        }

        let temp = self.root.join(format!(
            ".{}.{}.{}.tmp",
            digest,
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(e) = write_compressed(&temp, payload) {
            let _ = fs::remove_file(&temp);
            return Err(StorageError::io(temp, e));
        }

        // Another writer may have finished first; its payload is identical
        if path.is_file() {
            let _ = fs::remove_file(&temp);
            return Ok(false);
        }

        fs::rename(&temp, &path).map_err(|e| StorageError::io(&path, e))?;
        Ok(true)
    }

    /// Lists digests of all complete entries
    pub(crate) fn digests(&self) -> StorageResult<Vec<Digest>> {
        let entries = fs::read_dir(&self.root).map_err(|e| StorageError::io(&self.root, e))?;

        let mut digests = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io(&self.root, e))?;
            if let Some(digest) = entry.file_name().to_str().and_then(Digest::from_file_name) {
                digests.push(digest);
            }
        }
        digests.sort();
        Ok(digests)
    }
}

fn write_compressed(path: &Path, payload: &[u8]) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(payload)?;
    let file = encoder.finish()?;
    file.sync_all()
}
