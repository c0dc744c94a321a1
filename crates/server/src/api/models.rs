use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use agentgate_llm::types::Model;

use crate::error::{ApiError, ErrorResponse};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct ModelsResponse {
    #[schema(value_type = Vec<Object>)]
    pub models: Vec<Model>,
}

/// Models registered with the upstream service
#[utoipa::path(
    get,
    path = "/v1/models",
    tag = "Models",
    responses(
        (status = 200, description = "Upstream model list", body = ModelsResponse),
        (status = 500, description = "Upstream unreachable", body = ErrorResponse)
    )
)]
pub async fn models(State(state): State<Arc<AppState>>) -> Result<Json<ModelsResponse>, ApiError> {
    let models = state.client.list_models().await?;
    tracing::info!(count = models.len(), "listed upstream models");
    Ok(Json(ModelsResponse { models }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/models", get(models))
}
