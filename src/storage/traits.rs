//! Storage traits and error types
//!
//! This module defines the trait interface shared by the content store and
//! the link index, and associated error types.

use crate::url::Digest;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Entry {digest} is not valid UTF-8")]
    Encoding { digest: String },

    #[error("Store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A persistent, write-once map keyed by URL digest
///
/// Implementations never evict, update or invalidate an entry once `put`
/// succeeds. Concurrent `put`s of the same digest are allowed and the first
/// writer wins; concurrent writers of distinct digests never contend.
pub trait DigestStore: Send + Sync {
    type Value;

    /// Checks whether an entry exists for `digest`
    fn has(&self, digest: &Digest) -> bool;

    /// Reads the entry for `digest`, if any
    fn get(&self, digest: &Digest) -> StorageResult<Option<Self::Value>>;

    /// Stores `value` under `digest` unless an entry already exists
    ///
    /// Returns `true` if this call created the entry.
    fn put(&self, digest: &Digest, value: &Self::Value) -> StorageResult<bool>;

    /// Lists every digest currently stored
    fn digests(&self) -> StorageResult<Vec<Digest>>;

    /// Counts stored entries
    fn len(&self) -> StorageResult<usize> {
        Ok(self.digests()?.len())
    }

    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}
