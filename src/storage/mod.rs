//! Storage backends: a synchronous key-value snapshot store and an
//! asynchronous per-project asset store.
//!
//! DESIGN
//! ======
//! Snapshots are small JSON strings written on every autosave, so the store
//! is synchronous and last-write-wins. Background images are large binary
//! blobs read and written off the hot path, so the asset store is async.
//! Both are traits so the session can run against memory in tests and
//! against a data directory from the CLI. MIME types are not stored with
//! assets; the document descriptor carries them.

pub mod fs;
pub mod memory;
pub mod project;

use async_trait::async_trait;

pub use fs::{DirAssetStore, DirSnapshotStore};
pub use memory::{MemoryAssetStore, MemorySnapshotStore};
pub use project::ProjectStorage;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Synchronous key to string mapping.
pub trait SnapshotStore: Send + Sync {
    /// Read a value; a missing key is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns a backend failure.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns a backend failure.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns a backend failure.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Asynchronous key to bytes mapping, one entry per project id.
///
/// Callers must not overlap a `put` and `delete` for the same key.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store `bytes` under `key`, overwriting any previous blob.
    ///
    /// # Errors
    ///
    /// Returns a backend failure.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError>;

    /// Read the blob under `key`; a missing key is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns a backend failure.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Delete the blob under `key`. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns a backend failure.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Encode a key into a portable file name: ASCII alphanumerics, `-` and `_`
/// pass through, everything else becomes `%XX`.
pub(crate) fn file_name_for(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}
