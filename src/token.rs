/// Access and refresh token issuance and verification
///
/// Both token classes are HS256 JWTs over distinct server-held secrets. The
/// access token carries the public identity claims; the refresh token carries
/// the account id only. Issuance is pure with respect to storage - persisting
/// the refresh token into the account's session slot is the caller's job.
use crate::{
    config::TokenConfig,
    db::user::User,
    error::{AppError, AppResult},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims embedded in an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Account id
    pub sub: String,
    pub email: String,
    pub username: String,
    pub full_name: String,
    /// Unique token id
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims embedded in a refresh token - minimal claim surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Account id
    pub sub: String,
    /// Unique token id; two tokens for the same account issued within the
    /// same second must still differ
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Token issuer and verifier
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    config: TokenConfig,
}

impl TokenIssuer {
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    /// Issue a short-lived access token for an account snapshot
    pub fn issue_access(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: user.id.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + self.config.access_expiry_secs,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.access_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
    }

    /// Issue a long-lived refresh token for an account snapshot
    pub fn issue_refresh(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = RefreshClaims {
            sub: user.id.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + self.config.refresh_expiry_secs,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.refresh_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
    }

    /// Verify an access token's signature and expiry
    pub fn verify_access(&self, token: &str) -> AppResult<AccessClaims> {
        Self::verify::<AccessClaims>(token, &self.config.access_secret)
    }

    /// Verify a refresh token's signature and expiry
    pub fn verify_refresh(&self, token: &str) -> AppResult<RefreshClaims> {
        Self::verify::<RefreshClaims>(token, &self.config.refresh_secret)
    }

    fn verify<C: for<'de> Deserialize<'de>>(token: &str, secret: &str) -> AppResult<C> {
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<C>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token verification failed: {}", e);
                // Normalized messages only; never echo token contents
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::Authentication("Token has expired".to_string())
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::Authentication("Invalid token signature".to_string())
                    }
                    _ => AppError::Authentication("Invalid token".to_string()),
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_user() -> User {
        User {
            id: Uuid::new_v4().to_string(),
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            full_name: "Alice A".to_string(),
            password_hash: "unused".to_string(),
            session_token: None,
            avatar_url: "/media/defaults/avatar.png".to_string(),
            cover_url: "/media/defaults/cover.png".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn test_issuer() -> TokenIssuer {
        TokenIssuer::new(TokenConfig {
            access_secret: "access-secret-0123456789-0123456789".to_string(),
            access_expiry_secs: 900,
            refresh_secret: "refresh-secret-0123456789-0123456789".to_string(),
            refresh_expiry_secs: 604800,
        })
    }

    #[test]
    fn test_access_token_round_trip() {
        let issuer = test_issuer();
        let user = test_user();

        let token = issuer.issue_access(&user).unwrap();
        let claims = issuer.verify_access(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.username, user.username);
        assert_eq!(claims.full_name, user.full_name);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_refresh_token_carries_id_only() {
        let issuer = test_issuer();
        let user = test_user();

        let token = issuer.issue_refresh(&user).unwrap();
        let claims = issuer.verify_refresh(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        // The refresh payload should not embed the identity claims
        assert!(!token.contains("alice"));
    }

    #[test]
    fn test_secrets_are_not_interchangeable() {
        let issuer = test_issuer();
        let user = test_user();

        let access = issuer.issue_access(&user).unwrap();
        let refresh = issuer.issue_refresh(&user).unwrap();

        assert!(issuer.verify_refresh(&access).is_err());
        assert!(issuer.verify_access(&refresh).is_err());
    }

    #[test]
    fn test_same_second_tokens_differ() {
        let issuer = test_issuer();
        let user = test_user();

        let a = issuer.issue_refresh(&user).unwrap();
        let b = issuer.issue_refresh(&user).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = TokenIssuer::new(TokenConfig {
            access_secret: "access-secret-0123456789-0123456789".to_string(),
            access_expiry_secs: -3600,
            refresh_secret: "refresh-secret-0123456789-0123456789".to_string(),
            refresh_expiry_secs: -3600,
        });
        let user = test_user();

        let token = issuer.issue_access(&user).unwrap();
        let err = issuer.verify_access(&token).unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let issuer = test_issuer();
        assert!(issuer.verify_access("not.a.jwt").is_err());
        assert!(issuer.verify_refresh("").is_err());
    }
}
