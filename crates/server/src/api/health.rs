//! Liveness and readiness probes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LivenessResponse {
    pub alive: bool,
}

/// Ready when the upstream answers a model listing
#[utoipa::path(
    get,
    path = "/readiness",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadinessResponse),
        (status = 503, description = "Upstream unreachable", body = ReadinessResponse)
    )
)]
pub async fn readiness(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ReadinessResponse>) {
    match state.client.list_models().await {
        Ok(_) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                ready: true,
                reason: "service is ready".to_string(),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    ready: false,
                    reason: e.to_string(),
                }),
            )
        }
    }
}

#[utoipa::path(
    get,
    path = "/liveness",
    tag = "Health",
    responses(
        (status = 200, description = "Process is alive", body = LivenessResponse)
    )
)]
pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { alive: true })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/readiness", get(readiness))
        .route("/liveness", get(liveness))
}
