//! Storage trait definition.

use crate::BlobKey;
use std::path::PathBuf;
use vitrine_error::VitrineResult;

/// Trait for pluggable blob storage backends.
///
/// Implementations handle the actual storage and retrieval of bytes, while
/// records and reference counts are managed separately in the database.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under `key`, replacing any previous content.
    ///
    /// Readers must never observe a partially written blob: the
    /// implementation writes to a private temporary location and then
    /// atomically moves it into place.
    async fn put(&self, key: &BlobKey, data: &[u8]) -> VitrineResult<()>;

    /// Read the bytes stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageErrorKind::NotFound` if nothing is stored there.
    async fn get(&self, key: &BlobKey) -> VitrineResult<Vec<u8>>;

    /// Remove the blob under `key`.
    ///
    /// # Returns
    ///
    /// `true` if a blob was removed, `false` if none existed
    async fn delete(&self, key: &BlobKey) -> VitrineResult<bool>;

    /// Check if a blob exists.
    async fn exists(&self, key: &BlobKey) -> VitrineResult<bool>;

    /// Size of the blob in bytes.
    async fn size(&self, key: &BlobKey) -> VitrineResult<u64>;

    /// Make `dst` hold exactly the bytes of `src` without re-encoding.
    ///
    /// Backends may share storage between the two keys (hard link) or copy.
    async fn alias(&self, src: &BlobKey, dst: &BlobKey) -> VitrineResult<()>;

    /// Local filesystem path a transport can stream `key` from.
    fn local_path(&self, key: &BlobKey) -> PathBuf;
}
