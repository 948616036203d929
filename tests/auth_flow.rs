/// End-to-end credential and session lifecycle tests
///
/// Drives the account manager through the full register / login / refresh /
/// logout / delete sequence against an in-memory database and a temp-dir
/// media store.
use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use streamhub::{
    account::{AccountManager, DeleteAccountRequest, LoginRequest, RegisterRequest},
    config::TokenConfig,
    db,
    error::AppError,
    media::{MediaStorageConfig, MediaStore},
    password::PasswordHasher,
    token::TokenIssuer,
};
use tempfile::TempDir;

async fn setup() -> (AccountManager, TempDir) {
    // Single connection so the in-memory database is shared
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .unwrap();
    db::run_migrations(&pool).await.unwrap();

    let tokens = TokenIssuer::new(TokenConfig {
        access_secret: "integration-access-secret-0123456789".to_string(),
        access_expiry_secs: 900,
        refresh_secret: "integration-refresh-secret-0123456789".to_string(),
        refresh_expiry_secs: 604800,
    });

    let dir = TempDir::new().unwrap();
    let media = Arc::new(MediaStore::new(MediaStorageConfig {
        root: dir.path().to_path_buf(),
        max_asset_size: 1024 * 1024,
    }));

    (
        AccountManager::new(pool, tokens, PasswordHasher::new(), media),
        dir,
    )
}

#[tokio::test]
async fn full_session_lifecycle() {
    let (manager, _dir) = setup().await;

    // Register
    let created = manager
        .register(RegisterRequest {
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            password: "secret1".to_string(),
            full_name: "Alice A".to_string(),
        })
        .await
        .unwrap();

    // The projection carries no secret material
    let json = serde_json::to_string(&created).unwrap();
    assert!(!json.contains("password"));
    assert!(!json.contains("sessionToken"));

    // Login
    let (user, pair) = manager
        .login(&LoginRequest {
            username: Some("alice".to_string()),
            email: None,
            password: "secret1".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(user.id, created.id);
    assert!(!pair.access_token.is_empty());
    assert!(!pair.refresh_token.is_empty());

    // Refresh: rotation yields a different refresh token
    let rotated = manager.refresh_session(&pair.refresh_token).await.unwrap();
    assert_ne!(rotated.refresh_token, pair.refresh_token);

    // Logout
    manager.logout(&created.id).await.unwrap();

    // Refresh with the pre-logout token fails with an authentication error
    let err = manager
        .refresh_session(&rotated.refresh_token)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authentication(_)));
}

#[tokio::test]
async fn stale_token_is_rejected_after_rotation() {
    let (manager, _dir) = setup().await;

    manager
        .register(RegisterRequest {
            username: "bob".to_string(),
            email: "bob@x.com".to_string(),
            password: "hunter22".to_string(),
            full_name: "Bob B".to_string(),
        })
        .await
        .unwrap();

    let (_, pair) = manager
        .login(&LoginRequest {
            username: Some("bob".to_string()),
            email: None,
            password: "hunter22".to_string(),
        })
        .await
        .unwrap();

    // First refresh wins
    let rotated = manager.refresh_session(&pair.refresh_token).await.unwrap();

    // Second refresh with the original token must fail, not succeed
    let err = manager
        .refresh_session(&pair.refresh_token)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authentication(_)));

    // The winner's token is still usable
    manager.refresh_session(&rotated.refresh_token).await.unwrap();
}

#[tokio::test]
async fn deletion_demands_exact_identifier_match() {
    let (manager, _dir) = setup().await;

    manager
        .register(RegisterRequest {
            username: "carol".to_string(),
            email: "carol@x.com".to_string(),
            password: "pass123".to_string(),
            full_name: "Carol C".to_string(),
        })
        .await
        .unwrap();

    // Password is correct but the email belongs to nobody: NotFound
    let err = manager
        .delete_account(&DeleteAccountRequest {
            username: "carol".to_string(),
            email: "wrong@x.com".to_string(),
            password: "pass123".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // Exact match deletes the record and the login stops working
    manager
        .delete_account(&DeleteAccountRequest {
            username: "carol".to_string(),
            email: "carol@x.com".to_string(),
            password: "pass123".to_string(),
        })
        .await
        .unwrap();

    let err = manager
        .login(&LoginRequest {
            username: Some("carol".to_string()),
            email: None,
            password: "pass123".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
