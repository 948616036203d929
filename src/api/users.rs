/// /api/v1/users/* endpoints
use crate::{
    account::{
        ChangePasswordRequest, DeleteAccountRequest, LoginRequest, LoginResponse, RefreshRequest,
        RegisterRequest, TokenPair, UpdateAccountRequest,
    },
    api::{response::ApiResponse, AppJson},
    auth::{AuthUser, ACCESS_COOKIE, REFRESH_COOKIE},
    context::AppContext,
    db::user::PublicUser,
    error::{AppError, AppResult},
};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::{json, Value};

/// Build user routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh-token", post(refresh_token))
        .route("/change-password", post(change_password))
        .route("/current-user", get(current_user))
        .route("/update-account", patch(update_account))
        .route("/update-avatar", patch(update_avatar))
        .route("/update-cover-image", patch(update_cover_image))
        .route("/delete-account", delete(delete_account))
}

/// Build an httpOnly + secure session cookie
fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .path("/")
        .build()
}

fn set_session_cookies(jar: CookieJar, pair: &TokenPair) -> CookieJar {
    jar.add(session_cookie(ACCESS_COOKIE, pair.access_token.clone()))
        .add(session_cookie(REFRESH_COOKIE, pair.refresh_token.clone()))
}

fn clear_session_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(session_cookie(ACCESS_COOKIE, String::new()))
        .remove(session_cookie(REFRESH_COOKIE, String::new()))
}

/// Register a new account
async fn register(
    State(ctx): State<AppContext>,
    AppJson(req): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<PublicUser>>)> {
    let created = ctx.account_manager.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created(created, "User created successfully")),
    ))
}

/// Login: populate the session slot and set the cookie pair
async fn login(
    State(ctx): State<AppContext>,
    jar: CookieJar,
    AppJson(req): AppJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<ApiResponse<LoginResponse>>)> {
    let (user, pair) = ctx.account_manager.login(&req).await?;

    let jar = set_session_cookies(jar, &pair);

    // Tokens are also returned in the body for non-cookie clients
    let body = LoginResponse {
        user: PublicUser::from(&user),
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    };

    Ok((
        jar,
        Json(ApiResponse::ok(body, "User logged in successfully")),
    ))
}

/// Logout: clear the session slot and the cookies
async fn logout(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<ApiResponse<Value>>)> {
    ctx.account_manager.logout(&auth.user.id).await?;

    Ok((
        clear_session_cookies(jar),
        Json(ApiResponse::ok(json!({}), "User logged out successfully")),
    ))
}

/// Exchange a refresh token for a new pair (rotation)
async fn refresh_token(
    State(ctx): State<AppContext>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> AppResult<(CookieJar, Json<ApiResponse<TokenPair>>)> {
    let presented = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| body.and_then(|Json(req)| req.refresh_token))
        .ok_or_else(|| {
            AppError::Authentication("Unauthorized request, please log in".to_string())
        })?;

    let pair = ctx.account_manager.refresh_session(&presented).await?;

    let jar = set_session_cookies(jar, &pair);

    Ok((
        jar,
        Json(ApiResponse::ok(pair, "Tokens refreshed successfully")),
    ))
}

/// Change the account password
async fn change_password(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    AppJson(req): AppJson<ChangePasswordRequest>,
) -> AppResult<Json<ApiResponse<Value>>> {
    ctx.account_manager
        .change_password(&auth.user, &req)
        .await?;

    Ok(Json(ApiResponse::ok(
        json!({}),
        "Password changed successfully",
    )))
}

/// Public projection of the authenticated account
async fn current_user(auth: AuthUser) -> Json<ApiResponse<PublicUser>> {
    Json(ApiResponse::ok(
        PublicUser::from(&auth.user),
        "Current user fetched successfully",
    ))
}

/// Update profile fields
async fn update_account(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    AppJson(req): AppJson<UpdateAccountRequest>,
) -> AppResult<Json<ApiResponse<PublicUser>>> {
    let updated = ctx.account_manager.update_profile(&auth.user, &req).await?;

    Ok(Json(ApiResponse::ok(
        updated,
        "User details updated successfully",
    )))
}

/// Pull a named file out of a multipart body
async fn read_upload(mut multipart: Multipart, field_name: &str) -> AppResult<(Vec<u8>, String)> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::Validation(format!("Malformed multipart body: {}", e))
    })? {
        if field.name() == Some(field_name) {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?
                .to_vec();
            return Ok((data, content_type));
        }
    }

    Err(AppError::Validation(format!(
        "{} image file is required",
        field_name
    )))
}

/// Replace the avatar image
async fn update_avatar(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<PublicUser>>> {
    let (data, content_type) = read_upload(multipart, "avatar").await?;

    let updated = ctx
        .account_manager
        .update_avatar(&auth.user, data, &content_type)
        .await?;

    Ok(Json(ApiResponse::ok(updated, "Avatar updated successfully")))
}

/// Replace the cover image
async fn update_cover_image(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<PublicUser>>> {
    let (data, content_type) = read_upload(multipart, "coverImage").await?;

    let updated = ctx
        .account_manager
        .update_cover(&auth.user, data, &content_type)
        .await?;

    Ok(Json(ApiResponse::ok(
        updated,
        "Cover image updated successfully",
    )))
}

/// Delete the account after full credential re-submission
async fn delete_account(
    State(ctx): State<AppContext>,
    _auth: AuthUser,
    jar: CookieJar,
    AppJson(req): AppJson<DeleteAccountRequest>,
) -> AppResult<(CookieJar, Json<ApiResponse<Value>>)> {
    ctx.account_manager.delete_account(&req).await?;

    Ok((
        clear_session_cookies(jar),
        Json(ApiResponse::ok(
            json!({}),
            "User account deleted successfully",
        )),
    ))
}
