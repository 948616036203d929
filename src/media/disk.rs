/// Disk-based media storage backend
use crate::{
    error::{AppError, AppResult},
    media::MediaBackend,
};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

/// Disk storage backend
///
/// Stores assets on the local filesystem with directory sharding based on
/// content-hash prefixes to prevent too many files in one directory.
#[derive(Clone)]
pub struct DiskMediaBackend {
    base_path: PathBuf,
}

impl DiskMediaBackend {
    /// Create a new disk storage backend
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Get the file path for a content hash
    ///
    /// Uses directory sharding: {base}/{first2chars}/{hash}
    fn asset_path(&self, content_hash: &str) -> PathBuf {
        if content_hash.len() >= 2 {
            let shard = &content_hash[0..2];
            self.base_path.join(shard).join(content_hash)
        } else {
            self.base_path.join("_").join(content_hash)
        }
    }

    /// Ensure the directory for an asset exists
    async fn ensure_asset_dir(&self, content_hash: &str) -> AppResult<PathBuf> {
        let path = self.asset_path(content_hash);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::MediaStorage(format!("Failed to create media directory: {}", e))
            })?;
        }
        Ok(path)
    }
}

#[async_trait]
impl MediaBackend for DiskMediaBackend {
    async fn put(&self, content_hash: &str, data: Vec<u8>) -> AppResult<()> {
        let path = self.ensure_asset_dir(content_hash).await?;

        fs::write(&path, data).await.map_err(|e| {
            AppError::MediaStorage(format!("Failed to write asset {}: {}", content_hash, e))
        })?;

        Ok(())
    }

    async fn delete(&self, content_hash: &str) -> AppResult<()> {
        match fs::remove_file(self.asset_path(content_hash)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::MediaStorage(format!(
                "Failed to delete asset {}: {}",
                content_hash, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_put_writes_sharded_file() {
        let dir = tempdir().unwrap();
        let backend = DiskMediaBackend::new(dir.path().to_path_buf());

        let hash = "c0ffee123456";
        let data = b"avatar bytes".to_vec();

        backend.put(hash, data.clone()).await.unwrap();

        let written = tokio::fs::read(backend.asset_path(hash)).await.unwrap();
        assert_eq!(written, data);
    }

    #[tokio::test]
    async fn test_delete_asset_is_idempotent() {
        let dir = tempdir().unwrap();
        let backend = DiskMediaBackend::new(dir.path().to_path_buf());

        let hash = "deadbeef0001";
        backend.put(hash, b"bytes".to_vec()).await.unwrap();
        assert!(backend.asset_path(hash).exists());

        backend.delete(hash).await.unwrap();
        assert!(!backend.asset_path(hash).exists());

        // Deleting again is a no-op, not an error
        backend.delete(hash).await.unwrap();
    }

    #[tokio::test]
    async fn test_directory_sharding() {
        let dir = tempdir().unwrap();
        let backend = DiskMediaBackend::new(dir.path().to_path_buf());

        let path = backend.asset_path("c0ffee123456");
        assert!(path.to_string_lossy().contains("/c0/"));
    }
}
