//! Filesystem-based blob storage implementation.
//!
//! Keys map one-to-one onto paths below the storage root.

use crate::{BlobKey, BlobStore};
use std::path::{Path, PathBuf};
use uuid::Uuid;
use vitrine_error::{StorageError, StorageErrorKind, VitrineResult};

/// Filesystem storage backend.
///
/// # Features
///
/// - **Atomic writes**: Uses a uniquely named temp file + rename, so
///   concurrent writers of the same key never interleave their bytes
/// - **Portable aliases**: Hard link when the filesystem allows it, plain
///   copy otherwise
#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    base_path: PathBuf,
}

impl FileSystemStorage {
    /// Create a new filesystem storage backend.
    ///
    /// Creates the base directory if it doesn't exist.
    ///
    /// # Arguments
    ///
    /// * `base_path` - Root directory for image storage
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or accessed.
    #[tracing::instrument(skip(base_path))]
    pub fn new(base_path: impl Into<PathBuf>) -> VitrineResult<Self> {
        let base_path = base_path.into();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;

        tracing::info!(path = %base_path.display(), "Created filesystem storage");
        Ok(Self { base_path })
    }

    /// Root directory of this backend.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    async fn ensure_parent(path: &Path) -> VitrineResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }
        Ok(())
    }

    fn temp_path(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        path.with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4()))
    }

    fn read_error(path: &Path, e: std::io::Error) -> StorageError {
        if e.kind() == std::io::ErrorKind::NotFound {
            StorageError::new(StorageErrorKind::NotFound(path.display().to_string()))
        } else {
            StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                path.display(),
                e
            )))
        }
    }
}

#[async_trait::async_trait]
impl BlobStore for FileSystemStorage {
    #[tracing::instrument(skip(self, data), fields(key = %key, size = data.len()))]
    async fn put(&self, key: &BlobKey, data: &[u8]) -> VitrineResult<()> {
        let path = self.local_path(key);
        Self::ensure_parent(&path).await?;

        // Write to temp file first, then rename for atomicity
        let temp_path = Self::temp_path(&path);
        tokio::fs::write(&temp_path, data).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;

        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StorageError::new(StorageErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
            .into());
        }

        tracing::debug!(path = %path.display(), size = data.len(), "Stored blob");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(key = %key))]
    async fn get(&self, key: &BlobKey) -> VitrineResult<Vec<u8>> {
        let path = self.local_path(key);
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| Self::read_error(&path, e))?;
        tracing::debug!(path = %path.display(), size = data.len(), "Retrieved blob");
        Ok(data)
    }

    #[tracing::instrument(skip(self), fields(key = %key))]
    async fn delete(&self, key: &BlobKey) -> VitrineResult<bool> {
        let path = self.local_path(key);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Deleted blob");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::new(StorageErrorKind::FileRemove(format!(
                "{}: {}",
                path.display(),
                e
            )))
            .into()),
        }
    }

    async fn exists(&self, key: &BlobKey) -> VitrineResult<bool> {
        let path = self.local_path(key);
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| Self::read_error(&path, e).into())
    }

    async fn size(&self, key: &BlobKey) -> VitrineResult<u64> {
        let path = self.local_path(key);
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| Self::read_error(&path, e))?;
        Ok(metadata.len())
    }

    #[tracing::instrument(skip(self), fields(src = %src, dst = %dst))]
    async fn alias(&self, src: &BlobKey, dst: &BlobKey) -> VitrineResult<()> {
        let src_path = self.local_path(src);
        let dst_path = self.local_path(dst);
        Self::ensure_parent(&dst_path).await?;

        // Link under a temp name and rename so a racing writer never sees
        // an `AlreadyExists` or a half-copied file.
        let temp_path = Self::temp_path(&dst_path);
        if tokio::fs::hard_link(&src_path, &temp_path).await.is_err() {
            tokio::fs::copy(&src_path, &temp_path)
                .await
                .map_err(|e| Self::read_error(&src_path, e))?;
        }

        if let Err(e) = tokio::fs::rename(&temp_path, &dst_path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StorageError::new(StorageErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                dst_path.display(),
                e
            )))
            .into());
        }
        // rename(2) is a no-op when both names already share the inode
        let _ = tokio::fs::remove_file(&temp_path).await;

        tracing::debug!(
            src = %src_path.display(),
            dst = %dst_path.display(),
            "Aliased blob"
        );
        Ok(())
    }

    fn local_path(&self, key: &BlobKey) -> PathBuf {
        key.to_path(&self.base_path)
    }
}
