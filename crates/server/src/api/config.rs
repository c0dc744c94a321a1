use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

/// Active configuration with secrets redacted
#[utoipa::path(
    get,
    path = "/v1/config",
    tag = "Config",
    responses(
        (status = 200, description = "Redacted configuration", body = Object)
    )
)]
pub async fn config(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(state.config.redacted_summary())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/config", get(config))
}
