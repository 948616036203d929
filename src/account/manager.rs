/// Account manager implementation using runtime queries
///
/// Owns every mutation of the users table. The session slot contract: the
/// `session_token` column is written only by login (overwrite) and refresh
/// rotation (compare-and-swap), and cleared only by logout and deletion.
use crate::{
    account::{
        ChangePasswordRequest, DeleteAccountRequest, LoginRequest, RegisterRequest, TokenPair,
        UpdateAccountRequest,
    },
    db::user::{PublicUser, User},
    error::{AppError, AppResult},
    media::{MediaStore, DEFAULT_AVATAR_URL, DEFAULT_COVER_URL},
    password::PasswordHasher,
    token::TokenIssuer,
};
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Normalize a unique identifier: surrounding whitespace trimmed, lowercased
fn normalize(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

/// Account manager service
pub struct AccountManager {
    db: SqlitePool,
    tokens: TokenIssuer,
    hasher: PasswordHasher,
    media: Arc<MediaStore>,
}

impl AccountManager {
    /// Create a new account manager
    pub fn new(
        db: SqlitePool,
        tokens: TokenIssuer,
        hasher: PasswordHasher,
        media: Arc<MediaStore>,
    ) -> Self {
        Self {
            db,
            tokens,
            hasher,
            media,
        }
    }

    /// Register a new account
    ///
    /// Uniqueness and password-strength checks run before the insert; the
    /// new account starts logged out with placeholder media refs.
    pub async fn register(&self, req: RegisterRequest) -> AppResult<PublicUser> {
        let req = RegisterRequest {
            username: normalize(&req.username),
            email: normalize(&req.email),
            full_name: req.full_name.trim().to_string(),
            password: req.password,
        };
        req.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if self.email_exists(&req.email).await? {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        if self.username_exists(&req.username).await? {
            return Err(AppError::Conflict(format!(
                "Username {} already taken",
                req.username
            )));
        }

        let password_hash = self.hasher.hash(&req.password).await?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO users (id, username, email, full_name, password_hash, session_token, avatar_url, cover_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?7, ?8, ?9)",
        )
        .bind(&id)
        .bind(&req.username)
        .bind(&req.email)
        .bind(&req.full_name)
        .bind(&password_hash)
        .bind(DEFAULT_AVATAR_URL)
        .bind(DEFAULT_COVER_URL)
        .bind(now)
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(|e| AppError::from_db_write(e, "Username or email already registered"))?;

        tracing::info!(username = %req.username, "account created");

        Ok(PublicUser {
            id,
            username: req.username,
            email: req.email,
            full_name: req.full_name,
            avatar_url: DEFAULT_AVATAR_URL.to_string(),
            cover_url: DEFAULT_COVER_URL.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Authenticate and populate the session slot
    ///
    /// A successful login overwrites any previous session token, so at most
    /// one session per account is ever valid.
    pub async fn login(&self, req: &LoginRequest) -> AppResult<(User, TokenPair)> {
        if req.username.is_none() && req.email.is_none() {
            return Err(AppError::Validation(
                "Username or email is required".to_string(),
            ));
        }
        if req.password.is_empty() {
            return Err(AppError::Validation("Password is required".to_string()));
        }

        let user = self
            .find_by_identifier(req.username.as_deref(), req.email.as_deref())
            .await?
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

        let valid = self.hasher.verify(&req.password, &user.password_hash).await?;
        if !valid {
            return Err(AppError::Authentication("Invalid credentials".to_string()));
        }

        let pair = self.issue_pair(&user)?;

        sqlx::query("UPDATE users SET session_token = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(&pair.refresh_token)
            .bind(Utc::now())
            .bind(&user.id)
            .execute(&self.db)
            .await
            .map_err(AppError::Database)?;

        tracing::info!(username = %user.username, "login succeeded");

        Ok((user, pair))
    }

    /// Clear the session slot (logout)
    ///
    /// Already-issued access tokens remain valid until their own expiry;
    /// clearing the slot only prevents further rotation.
    pub async fn logout(&self, user_id: &str) -> AppResult<()> {
        sqlx::query("UPDATE users SET session_token = NULL, updated_at = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.db)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    /// Rotate the session: exchange a valid, current refresh token for a new pair
    ///
    /// The stored token is replaced with a single conditional update, so of
    /// two concurrent requests presenting the same token exactly one wins;
    /// the other sees a stale slot and must re-authenticate.
    pub async fn refresh_session(&self, presented: &str) -> AppResult<TokenPair> {
        let claims = self.tokens.verify_refresh(presented)?;

        let user = self
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid refresh token".to_string()))?;

        let pair = self.issue_pair(&user)?;

        let result = sqlx::query(
            "UPDATE users SET session_token = ?1, updated_at = ?2 WHERE id = ?3 AND session_token = ?4",
        )
        .bind(&pair.refresh_token)
        .bind(Utc::now())
        .bind(&user.id)
        .bind(presented)
        .execute(&self.db)
        .await
        .map_err(AppError::Database)?;

        // Zero rows means the presented token is not the current one: it was
        // already rotated, the account logged out, or a concurrent refresh won
        if result.rows_affected() == 0 {
            return Err(AppError::Authentication(
                "Session expired, please log in again".to_string(),
            ));
        }

        tracing::debug!(username = %user.username, "session rotated");

        Ok(pair)
    }

    /// Change the account password
    ///
    /// The only operation besides registration that writes `password_hash`.
    /// The session slot is left untouched.
    pub async fn change_password(&self, user: &User, req: &ChangePasswordRequest) -> AppResult<()> {
        req.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let valid = self
            .hasher
            .verify(&req.current_password, &user.password_hash)
            .await?;
        if !valid {
            return Err(AppError::Validation(
                "Invalid current password".to_string(),
            ));
        }

        let password_hash = self.hasher.hash(&req.new_password).await?;

        sqlx::query("UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(&password_hash)
            .bind(Utc::now())
            .bind(&user.id)
            .execute(&self.db)
            .await
            .map_err(AppError::Database)?;

        tracing::info!(username = %user.username, "password changed");

        Ok(())
    }

    /// Update profile fields - never touches the password hash
    pub async fn update_profile(
        &self,
        user: &User,
        req: &UpdateAccountRequest,
    ) -> AppResult<PublicUser> {
        if req.username.is_none() && req.full_name.is_none() {
            return Err(AppError::Validation(
                "Username or full name is required".to_string(),
            ));
        }

        let username = match &req.username {
            Some(candidate) => {
                let candidate = normalize(candidate);
                if candidate.is_empty() || candidate.len() > 50 {
                    return Err(AppError::Validation(
                        "username must be 1-50 characters".to_string(),
                    ));
                }
                if candidate != user.username && self.username_exists(&candidate).await? {
                    return Err(AppError::Conflict(format!(
                        "Username {} already taken",
                        candidate
                    )));
                }
                candidate
            }
            None => user.username.clone(),
        };

        let full_name = match &req.full_name {
            Some(name) => {
                let name = name.trim().to_string();
                if name.is_empty() || name.len() > 50 {
                    return Err(AppError::Validation(
                        "full name must be 1-50 characters".to_string(),
                    ));
                }
                name
            }
            None => user.full_name.clone(),
        };

        let now = Utc::now();
        sqlx::query("UPDATE users SET username = ?1, full_name = ?2, updated_at = ?3 WHERE id = ?4")
            .bind(&username)
            .bind(&full_name)
            .bind(now)
            .bind(&user.id)
            .execute(&self.db)
            .await
            .map_err(|e| {
                AppError::from_db_write(e, &format!("Username {} already taken", username))
            })?;

        let updated = self
            .find_by_id(&user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(PublicUser::from(updated))
    }

    /// Replace the avatar asset
    ///
    /// The new asset is stored and persisted before the previous
    /// non-placeholder asset is removed.
    pub async fn update_avatar(
        &self,
        user: &User,
        data: Vec<u8>,
        content_type: &str,
    ) -> AppResult<PublicUser> {
        let stored = self.media.store(data, content_type).await?;
        self.set_media_ref(user, "avatar_url", &stored.url, &user.avatar_url)
            .await
    }

    /// Replace the cover image asset
    pub async fn update_cover(
        &self,
        user: &User,
        data: Vec<u8>,
        content_type: &str,
    ) -> AppResult<PublicUser> {
        let stored = self.media.store(data, content_type).await?;
        self.set_media_ref(user, "cover_url", &stored.url, &user.cover_url)
            .await
    }

    async fn set_media_ref(
        &self,
        user: &User,
        column: &str,
        new_url: &str,
        old_url: &str,
    ) -> AppResult<PublicUser> {
        // column is one of two fixed names, never caller input
        let sql = format!("UPDATE users SET {} = ?1, updated_at = ?2 WHERE id = ?3", column);
        sqlx::query(&sql)
            .bind(new_url)
            .bind(Utc::now())
            .bind(&user.id)
            .execute(&self.db)
            .await
            .map_err(AppError::Database)?;

        // The new ref is already durable; a failed cleanup of the replaced
        // asset leaves an orphaned file, not an inconsistent record
        if let Err(e) = self.media.remove(old_url).await {
            tracing::warn!(url = %old_url, error = %e, "failed to remove replaced media asset");
        }

        let updated = self
            .find_by_id(&user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(PublicUser::from(updated))
    }

    /// Delete an account and its non-placeholder media
    ///
    /// All three credentials must be re-submitted and both identifiers must
    /// match the record that owns them. Media removal runs first and a
    /// failure there aborts the deletion - the record survives and the
    /// caller can retry.
    pub async fn delete_account(&self, req: &DeleteAccountRequest) -> AppResult<()> {
        if req.username.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty()
        {
            return Err(AppError::Validation("All fields are required".to_string()));
        }

        let username = normalize(&req.username);
        let email = normalize(&req.email);

        let user = self
            .find_by_identifier(Some(&username), Some(&email))
            .await?
            .filter(|u| u.username == username && u.email == email)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let valid = self.hasher.verify(&req.password, &user.password_hash).await?;
        if !valid {
            return Err(AppError::Validation("Invalid password".to_string()));
        }

        self.media.remove(&user.avatar_url).await?;
        self.media.remove(&user.cover_url).await?;

        sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(&user.id)
            .execute(&self.db)
            .await
            .map_err(AppError::Database)?;

        tracing::info!(username = %user.username, "account deleted");

        Ok(())
    }

    /// Get a user by id
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, email, full_name, password_hash, session_token,
                    avatar_url, cover_url, created_at, updated_at
             FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(AppError::Database)?;

        Ok(row.map(Self::map_user))
    }

    /// Find a user by username or email (logical OR match)
    async fn find_by_identifier(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> AppResult<Option<User>> {
        let username = username.map(normalize);
        let email = email.map(normalize);

        let row = sqlx::query(
            "SELECT id, username, email, full_name, password_hash, session_token,
                    avatar_url, cover_url, created_at, updated_at
             FROM users WHERE username = ?1 OR email = ?2",
        )
        .bind(username)
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(AppError::Database)?;

        Ok(row.map(Self::map_user))
    }

    async fn username_exists(&self, username: &str) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?1")
            .bind(username)
            .fetch_one(&self.db)
            .await
            .map_err(AppError::Database)?;

        Ok(count > 0)
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?1")
            .bind(email)
            .fetch_one(&self.db)
            .await
            .map_err(AppError::Database)?;

        Ok(count > 0)
    }

    fn issue_pair(&self, user: &User) -> AppResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.tokens.issue_access(user)?,
            refresh_token: self.tokens.issue_refresh(user)?,
        })
    }

    fn map_user(row: sqlx::sqlite::SqliteRow) -> User {
        User {
            id: row.get("id"),
            username: row.get("username"),
            email: row.get("email"),
            full_name: row.get("full_name"),
            password_hash: row.get("password_hash"),
            session_token: row.get("session_token"),
            avatar_url: row.get("avatar_url"),
            cover_url: row.get("cover_url"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    /// Token issuer, exposed for the auth extractor
    pub fn token_issuer(&self) -> &TokenIssuer {
        &self.tokens
    }
}
