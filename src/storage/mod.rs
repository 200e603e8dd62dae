//! Storage seams: where PDFs, previews and records live.
//!
//! The workflow only talks to the [`BlobStore`] and [`KvStore`] traits. The
//! shipped implementations keep everything under one directory:
//!
//! ```text
//! <storage_dir>/
//!  ├─ files/   uploaded PDFs and preview PNGs   (FsBlobStore)
//!  └─ kv.json  record store, key → JSON text    (FsKvStore)
//! ```

pub mod blob;
pub mod kv;

pub use blob::FsBlobStore;
pub use kv::{glob_match, FsKvStore};

use crate::error::ResumindError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Handle to a stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    /// Store-relative path, used to read the blob back.
    pub path: String,
    /// Original file name.
    pub name: String,
    pub size: u64,
}

/// A key and its value as returned by [`KvStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvItem {
    pub key: String,
    pub value: String,
}

/// Opaque file storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under a fresh path derived from `name`.
    async fn upload(&self, name: &str, bytes: &[u8]) -> Result<StoredFile, ResumindError>;

    /// Read a blob previously returned by [`BlobStore::upload`].
    async fn read(&self, path: &str) -> Result<Vec<u8>, ResumindError>;

    /// Remove a blob. Removing a missing blob is not an error.
    async fn delete(&self, path: &str) -> Result<(), ResumindError>;
}

/// String-valued key-value storage.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn set(&self, key: &str, value: &str) -> Result<(), ResumindError>;

    async fn get(&self, key: &str) -> Result<Option<String>, ResumindError>;

    /// All entries whose key matches the glob `pattern` (`*` wildcards),
    /// ordered by key.
    async fn list(&self, pattern: &str) -> Result<Vec<KvItem>, ResumindError>;

    /// Returns whether the key existed.
    async fn delete(&self, key: &str) -> Result<bool, ResumindError>;
}
