/// Configuration management for streamhub
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub tokens: TokenConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub media_upload_limit: usize,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub user_db: PathBuf,
    pub media_directory: PathBuf,
}

/// Token signing configuration
///
/// Access and refresh tokens carry distinct secrets and validity windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    pub access_secret: String,
    pub access_expiry_secs: i64,
    pub refresh_secret: String,
    pub refresh_expiry_secs: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Parse duration strings like "15m", "12h", "7d" to seconds
pub fn parse_expiry(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.len() < 2 {
        return None;
    }

    let (num_str, unit) = s.split_at(s.len() - 1);
    let num: i64 = num_str.parse().ok()?;
    if num <= 0 {
        return None;
    }

    match unit {
        "s" => Some(num),
        "m" => Some(num * 60),
        "h" => Some(num * 3600),
        "d" => Some(num * 24 * 3600),
        "w" => Some(num * 7 * 24 * 3600),
        _ => None,
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("STREAMHUB_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("STREAMHUB_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|_| AppError::Validation("Invalid port number".to_string()))?;
        let media_upload_limit = env::var("STREAMHUB_MEDIA_UPLOAD_LIMIT")
            .unwrap_or_else(|_| "5242880".to_string())
            .parse()
            .unwrap_or(5242880);

        let data_directory: PathBuf = env::var("STREAMHUB_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let user_db = env::var("STREAMHUB_DB_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("streamhub.sqlite"));
        let media_directory = env::var("STREAMHUB_MEDIA_DIRECTORY")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("media"));

        let access_secret = env::var("ACCESS_TOKEN_SECRET")
            .map_err(|_| AppError::Validation("ACCESS_TOKEN_SECRET required".to_string()))?;
        let refresh_secret = env::var("REFRESH_TOKEN_SECRET")
            .map_err(|_| AppError::Validation("REFRESH_TOKEN_SECRET required".to_string()))?;

        let access_expiry_secs = env::var("ACCESS_TOKEN_EXPIRY")
            .ok()
            .as_deref()
            .and_then(parse_expiry)
            .unwrap_or(15 * 60); // 15 minutes
        let refresh_expiry_secs = env::var("REFRESH_TOKEN_EXPIRY")
            .ok()
            .as_deref()
            .and_then(parse_expiry)
            .unwrap_or(7 * 24 * 3600); // 7 days

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                media_upload_limit,
            },
            storage: StorageConfig {
                data_directory,
                user_db,
                media_directory,
            },
            tokens: TokenConfig {
                access_secret,
                access_expiry_secs,
                refresh_secret,
                refresh_expiry_secs,
            },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.service.hostname.is_empty() {
            return Err(AppError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.tokens.access_secret.len() < 32 {
            return Err(AppError::Validation(
                "ACCESS_TOKEN_SECRET must be at least 32 characters".to_string(),
            ));
        }

        if self.tokens.refresh_secret.len() < 32 {
            return Err(AppError::Validation(
                "REFRESH_TOKEN_SECRET must be at least 32 characters".to_string(),
            ));
        }

        // The two token classes must not share a signing key
        if self.tokens.access_secret == self.tokens.refresh_secret {
            return Err(AppError::Validation(
                "Access and refresh token secrets must differ".to_string(),
            ));
        }

        if self.tokens.access_expiry_secs >= self.tokens.refresh_expiry_secs {
            return Err(AppError::Validation(
                "Refresh token expiry must exceed access token expiry".to_string(),
            ));
        }

        Ok(())
    }
}
