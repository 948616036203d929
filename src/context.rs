/// Application context and dependency injection
use crate::{
    account::AccountManager,
    config::ServerConfig,
    db,
    error::{AppError, AppResult},
    media::{MediaStorageConfig, MediaStore},
    password::PasswordHasher,
    token::TokenIssuer,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub account_manager: Arc<AccountManager>,
    pub media_store: Arc<MediaStore>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> AppResult<Self> {
        config.validate()?;

        Self::ensure_directories(&config).await?;

        let pool = db::create_pool(&config.storage.user_db, db::DatabaseOptions::default()).await?;
        db::run_migrations(&pool).await?;
        db::test_connection(&pool).await?;

        let media_store = Arc::new(MediaStore::new(MediaStorageConfig {
            root: config.storage.media_directory.clone(),
            max_asset_size: config.service.media_upload_limit,
        }));

        let tokens = TokenIssuer::new(config.tokens.clone());
        let account_manager = Arc::new(AccountManager::new(
            pool.clone(),
            tokens,
            PasswordHasher::new(),
            Arc::clone(&media_store),
        ));

        Ok(Self {
            config: Arc::new(config),
            db: pool,
            account_manager,
            media_store,
        })
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> AppResult<()> {
        for dir in [&config.storage.data_directory, &config.storage.media_directory] {
            if !dir.exists() {
                tokio::fs::create_dir_all(dir).await.map_err(|e| {
                    AppError::Internal(format!("Failed to create directory {:?}: {}", dir, e))
                })?;
            }
        }

        Ok(())
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
