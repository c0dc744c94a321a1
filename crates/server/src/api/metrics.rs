use std::sync::Arc;

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::error::{ApiError, ErrorResponse};
use crate::state::AppState;

const OPENMETRICS_CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Prometheus scrape endpoint
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Metrics",
    responses(
        (status = 200, description = "OpenMetrics text", content_type = "application/openmetrics-text"),
        (status = 500, description = "Encoding failed", body = ErrorResponse)
    )
)]
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let body = state
        .metrics
        .render()
        .map_err(|e| ApiError::Internal(format!("failed to encode metrics: {}", e)))?;
    Ok(([(CONTENT_TYPE, OPENMETRICS_CONTENT_TYPE)], body))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/metrics", get(metrics))
}
