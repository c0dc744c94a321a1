use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct InfoResponse {
    pub name: String,
    pub version: &'static str,
}

/// Service name and version
#[utoipa::path(
    get,
    path = "/v1/info",
    tag = "Info",
    responses(
        (status = 200, description = "Service name and version", body = InfoResponse)
    )
)]
pub async fn info(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    Json(InfoResponse {
        name: state.config.name.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/info", get(info))
}
