/// API routes and handlers
pub mod response;
pub mod users;

use crate::{context::AppContext, error::AppError};
use axum::{
    async_trait,
    extract::{FromRequest, Request},
    routing::get,
    Json, Router,
};
use serde_json::json;

/// JSON body extractor whose rejection carries the standard 400 envelope
///
/// Missing or malformed request bodies are a validation failure of this
/// API's contract, not a bare framework rejection.
pub struct AppJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        Ok(AppJson(value))
    }
}

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/v1/healthcheck", get(healthcheck))
        .nest("/api/v1/users", users::routes())
}

/// Health check handler
async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
