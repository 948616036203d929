/// Media storage system
///
/// Handles externally referenced binary assets (avatars, cover images).
/// Assets are content-addressed by SHA-256 and referenced by URL; the two
/// reserved placeholder refs are never stored or deleted here.

pub mod disk;
pub mod store;

pub use store::{MediaStore, StoredMedia};

use crate::error::AppResult;
use async_trait::async_trait;
use std::path::PathBuf;

/// Default avatar reference assigned at registration; must never be deleted
pub const DEFAULT_AVATAR_URL: &str = "/media/defaults/avatar.png";

/// Default cover image reference assigned at registration; must never be deleted
pub const DEFAULT_COVER_URL: &str = "/media/defaults/cover.png";

/// Returns true for the two reserved placeholder refs
pub fn is_placeholder(url: &str) -> bool {
    url == DEFAULT_AVATAR_URL || url == DEFAULT_COVER_URL
}

/// Media storage backend trait
///
/// The account lifecycle needs exactly two primitives: write an asset and
/// delete one. Deletion of a missing asset is a successful no-op.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Store an asset under its content hash
    async fn put(&self, content_hash: &str, data: Vec<u8>) -> AppResult<()>;

    /// Delete an asset by content hash
    async fn delete(&self, content_hash: &str) -> AppResult<()>;
}

/// Configuration for media storage
#[derive(Debug, Clone)]
pub struct MediaStorageConfig {
    /// Root directory for the disk backend
    pub root: PathBuf,

    /// Maximum asset size in bytes (default: 5MB)
    pub max_asset_size: usize,
}

impl Default for MediaStorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./data/media"),
            max_asset_size: 5 * 1024 * 1024,
        }
    }
}
