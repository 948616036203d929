/// Media store manager
///
/// Coordinates the storage backend behind the two operations the account
/// lifecycle needs: store an asset and remove an asset by reference.
use crate::{
    error::{AppError, AppResult},
    media::{disk::DiskMediaBackend, is_placeholder, MediaBackend, MediaStorageConfig},
};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// A stored asset: its public reference plus metadata
#[derive(Debug, Clone)]
pub struct StoredMedia {
    pub url: String,
    pub content_type: String,
    pub size: usize,
}

/// Main media store
#[derive(Clone)]
pub struct MediaStore {
    config: MediaStorageConfig,
    backend: Arc<dyn MediaBackend>,
}

impl MediaStore {
    /// Create a media store over the disk backend
    pub fn new(config: MediaStorageConfig) -> Self {
        let backend = Arc::new(DiskMediaBackend::new(config.root.clone()));
        Self { config, backend }
    }

    /// Create a media store over a custom backend
    pub fn with_backend(config: MediaStorageConfig, backend: Arc<dyn MediaBackend>) -> Self {
        Self { config, backend }
    }

    /// Compute the content hash used as the asset's storage key
    fn content_hash(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    /// Extract the content hash from an asset reference
    fn hash_from_url(url: &str) -> Option<&str> {
        url.rsplit('/').next().filter(|s| !s.is_empty())
    }

    /// Store an asset and return its reference
    pub async fn store(&self, data: Vec<u8>, content_type: &str) -> AppResult<StoredMedia> {
        if data.is_empty() {
            return Err(AppError::Validation("Media file is empty".to_string()));
        }
        if data.len() > self.config.max_asset_size {
            return Err(AppError::Validation(format!(
                "Media file exceeds the {} byte limit",
                self.config.max_asset_size
            )));
        }

        let hash = Self::content_hash(&data);
        let size = data.len();
        self.backend.put(&hash, data).await?;

        tracing::debug!(size, content_type, "media asset stored");

        Ok(StoredMedia {
            url: format!("/media/{}/{}", &hash[0..2], hash),
            content_type: content_type.to_string(),
            size,
        })
    }

    /// Remove an asset by reference
    ///
    /// The reserved placeholder refs are never deleted; removing one is a
    /// successful no-op.
    pub async fn remove(&self, url: &str) -> AppResult<()> {
        if is_placeholder(url) {
            return Ok(());
        }

        let hash = Self::hash_from_url(url)
            .ok_or_else(|| AppError::MediaStorage(format!("Malformed asset reference: {}", url)))?;

        self.backend.delete(hash).await?;
        tracing::debug!(%url, "media asset removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{DEFAULT_AVATAR_URL, DEFAULT_COVER_URL};
    use tempfile::tempdir;

    fn test_store(root: std::path::PathBuf) -> MediaStore {
        MediaStore::new(MediaStorageConfig {
            root,
            max_asset_size: 1024,
        })
    }

    #[tokio::test]
    async fn test_store_and_remove() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path().to_path_buf());

        let stored = store.store(b"image bytes".to_vec(), "image/png").await.unwrap();
        assert!(stored.url.starts_with("/media/"));
        assert_eq!(stored.size, 11);

        store.remove(&stored.url).await.unwrap();
    }

    #[tokio::test]
    async fn test_placeholders_are_never_deleted() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path().to_path_buf());

        // No backing file exists for either, yet removal succeeds
        store.remove(DEFAULT_AVATAR_URL).await.unwrap();
        store.remove(DEFAULT_COVER_URL).await.unwrap();
    }

    #[tokio::test]
    async fn test_oversized_asset_rejected() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path().to_path_buf());

        let err = store.store(vec![0u8; 2048], "image/png").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_empty_asset_rejected() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path().to_path_buf());

        assert!(store.store(Vec::new(), "image/png").await.is_err());
    }
}
