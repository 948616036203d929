/// Authentication extractor consumed by every protected route
use crate::{context::AppContext, db::user::User, error::AppError};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use axum_extra::extract::cookie::CookieJar;

/// Cookie names used for the token pair
pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Extract a bearer token from the Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

/// Extract an access token from the cookie or the Authorization header
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(ACCESS_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| extract_bearer_token(headers))
}

/// Authenticated user - extracts and verifies the access token, then
/// resolves the embedded id to a live account. Performs no mutation.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
}

#[async_trait]
impl FromRequestParts<AppContext> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_access_token(&parts.headers)
            .ok_or_else(|| AppError::Authentication("Missing access token".to_string()))?;

        let claims = state.account_manager.token_issuer().verify_access(&token)?;

        let user = state
            .account_manager
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| AppError::Authentication("Account no longer exists".to_string()))?;

        Ok(AuthUser { user })
    }
}
