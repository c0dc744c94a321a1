//! User feedback on answers, stored as JSON files when enabled.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use agentgate_core::FeedbackRequest;

use crate::auth::AuthTuple;
use crate::error::{ApiError, ErrorResponse};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct FeedbackResponse {
    pub response: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FeedbackStatus {
    pub enabled: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub functionality: String,
    pub status: FeedbackStatus,
}

/// Store feedback on an answer
#[utoipa::path(
    post,
    path = "/v1/feedback",
    tag = "Feedback",
    request_body = FeedbackRequest,
    responses(
        (status = 200, description = "Feedback stored", body = FeedbackResponse),
        (status = 403, description = "Feedback collection disabled", body = ErrorResponse),
        (status = 422, description = "Invalid feedback", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn feedback(
    State(state): State<Arc<AppState>>,
    auth: AuthTuple,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    let store = state
        .feedback
        .as_ref()
        .ok_or_else(|| ApiError::Forbidden("Storing feedback is disabled".to_string()))?;

    request.validate()?;
    let path = store.store(&auth.user_id, &request).await?;
    tracing::info!(
        conversation_id = %request.conversation_id,
        path = %path.display(),
        "feedback stored"
    );

    Ok(Json(FeedbackResponse {
        response: "feedback received".to_string(),
    }))
}

/// Whether feedback collection is enabled
#[utoipa::path(
    get,
    path = "/v1/feedback/status",
    tag = "Feedback",
    responses(
        (status = 200, description = "Feedback status", body = StatusResponse)
    )
)]
pub async fn feedback_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        functionality: "feedback".to_string(),
        status: FeedbackStatus {
            enabled: state.feedback.is_some(),
        },
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/feedback", post(feedback))
        .route("/feedback/status", get(feedback_status))
}
