use std::sync::Arc;

use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AuthTuple;
use crate::error::ErrorResponse;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthorizedResponse {
    pub user_id: String,
    pub username: String,
}

/// Resolve the caller's identity
#[utoipa::path(
    post,
    path = "/authorized",
    tag = "Auth",
    responses(
        (status = 200, description = "Caller identity", body = AuthorizedResponse),
        (status = 401, description = "Missing credentials", body = ErrorResponse)
    )
)]
pub async fn authorized(auth: AuthTuple) -> Json<AuthorizedResponse> {
    Json(AuthorizedResponse {
        user_id: auth.user_id,
        username: auth.username,
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/authorized", post(authorized))
}
