//! HTTP error type shared by every handler.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use agentgate_agent::AgentError;
use agentgate_core::CoreError;
use agentgate_llm::LlmError;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorDetail {
    /// Short summary of what went wrong.
    pub response: String,
    pub cause: String,
}

/// `{"detail": {"response": ..., "cause": ...}}`
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub detail: ErrorDetail,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unprocessable: {0}")]
    Unprocessable(String),

    #[error("upstream: {0}")]
    Upstream(#[from] LlmError),

    #[error("internal: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Upstream(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn detail(&self) -> ErrorDetail {
        let (response, cause) = match self {
            ApiError::BadRequest(cause) => ("Bad request", cause.clone()),
            ApiError::Unauthorized(cause) => {
                ("Missing or invalid credentials provided by client", cause.clone())
            }
            ApiError::Forbidden(cause) => ("Forbidden", cause.clone()),
            ApiError::NotFound(cause) => ("Not found", cause.clone()),
            ApiError::Unprocessable(cause) => ("Unprocessable Entity", cause.clone()),
            ApiError::Upstream(e) => ("Unable to connect to Llama Stack", e.to_string()),
            ApiError::Internal(cause) => ("Internal server error", cause.clone()),
        };
        ErrorDetail {
            response: response.to_string(),
            cause,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidAttachmentType(_)
            | CoreError::InvalidAttachmentContentType(_)
            | CoreError::InvalidRequest(_) => ApiError::Unprocessable(e.to_string()),
            CoreError::Disabled(_) => ApiError::Forbidden(e.to_string()),
            CoreError::Io(_) | CoreError::Serialize(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<AgentError> for ApiError {
    fn from(e: AgentError) -> Self {
        match e {
            AgentError::Llm(e) => ApiError::Upstream(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }
        (status, Json(ErrorResponse { detail: self.detail() })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_errors_are_unprocessable() {
        let err: ApiError = CoreError::InvalidAttachmentType("bogus".into()).into();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.detail().response, "Unprocessable Entity");
        assert_eq!(
            err.detail().cause,
            "Attachment with improper type bogus detected"
        );
    }

    #[test]
    fn test_upstream_errors_name_the_service() {
        let err = ApiError::from(LlmError::StreamError("connection refused".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let detail = err.detail();
        assert_eq!(detail.response, "Unable to connect to Llama Stack");
        assert!(detail.cause.contains("connection refused"));
    }

    #[test]
    fn test_io_errors_are_internal() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ApiError = CoreError::Io(io).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
