//! Conversation history lookup and deletion.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use agentgate_agent::{AgentError, AgentSession, SessionIds};
use agentgate_llm::types::{content_to_string, Session};

use crate::auth::AuthTuple;
use crate::error::{ApiError, ErrorResponse};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatMessage {
    pub content: String,
    /// `user` or `assistant`.
    #[serde(rename = "type")]
    pub message_type: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatTurn {
    pub messages: Vec<ChatMessage>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationResponse {
    pub conversation_id: String,
    pub chat_history: Vec<ChatTurn>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationDeleteResponse {
    pub conversation_id: String,
    pub success: bool,
    pub response: String,
}

/// Flatten an upstream session into user/assistant message pairs.
fn chat_history(session: &Session) -> Vec<ChatTurn> {
    session
        .turns
        .iter()
        .map(|turn| {
            let mut messages: Vec<ChatMessage> = turn
                .input_messages
                .iter()
                .map(|m| ChatMessage {
                    content: content_to_string(&m.content),
                    message_type: "user".to_string(),
                })
                .collect();
            messages.push(ChatMessage {
                content: content_to_string(&turn.output_message.content),
                message_type: "assistant".to_string(),
            });
            ChatTurn {
                messages,
                started_at: turn.started_at.clone(),
                completed_at: turn.completed_at.clone(),
            }
        })
        .collect()
}

fn lookup(state: &AppState, conversation_id: &str) -> Result<SessionIds, ApiError> {
    state.conversations.get(conversation_id).ok_or_else(|| {
        ApiError::NotFound(format!("Conversation {} could not be found", conversation_id))
    })
}

/// Map an upstream "session gone" to 404 and forget the stale entry.
fn session_error(state: &AppState, conversation_id: &str, e: AgentError) -> ApiError {
    match e {
        AgentError::Llm(e) if e.is_not_found() => {
            state.conversations.remove(conversation_id);
            ApiError::NotFound(format!("Conversation {} could not be found", conversation_id))
        }
        other => other.into(),
    }
}

/// Chat history of a conversation
#[utoipa::path(
    get,
    path = "/v1/conversations/{conversation_id}",
    tag = "Conversations",
    params(
        ("conversation_id" = String, Path, description = "Conversation ID")
    ),
    responses(
        (status = 200, description = "Conversation history", body = ConversationResponse),
        (status = 404, description = "Unknown conversation", body = ErrorResponse),
        (status = 500, description = "Upstream unreachable", body = ErrorResponse)
    )
)]
pub async fn get_conversation(
    State(state): State<Arc<AppState>>,
    _auth: AuthTuple,
    Path(conversation_id): Path<String>,
) -> Result<Json<ConversationResponse>, ApiError> {
    let ids = lookup(&state, &conversation_id)?;
    let session = AgentSession::resume(state.client.clone(), ids.agent_id, ids.session_id);
    let upstream = session
        .fetch()
        .await
        .map_err(|e| session_error(&state, &conversation_id, e))?;

    tracing::debug!(
        conversation_id = %conversation_id,
        turns = upstream.turns.len(),
        "conversation retrieved"
    );
    Ok(Json(ConversationResponse {
        chat_history: chat_history(&upstream),
        conversation_id,
    }))
}

/// Delete a conversation and its upstream session
#[utoipa::path(
    delete,
    path = "/v1/conversations/{conversation_id}",
    tag = "Conversations",
    params(
        ("conversation_id" = String, Path, description = "Conversation ID")
    ),
    responses(
        (status = 200, description = "Conversation deleted", body = ConversationDeleteResponse),
        (status = 404, description = "Unknown conversation", body = ErrorResponse),
        (status = 500, description = "Upstream unreachable", body = ErrorResponse)
    )
)]
pub async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    _auth: AuthTuple,
    Path(conversation_id): Path<String>,
) -> Result<Json<ConversationDeleteResponse>, ApiError> {
    let ids = lookup(&state, &conversation_id)?;
    let session = AgentSession::resume(state.client.clone(), ids.agent_id, ids.session_id);
    session
        .delete()
        .await
        .map_err(|e| session_error(&state, &conversation_id, e))?;
    state.conversations.remove(&conversation_id);

    tracing::info!(conversation_id = %conversation_id, "conversation deleted");
    Ok(Json(ConversationDeleteResponse {
        conversation_id,
        success: true,
        response: "Conversation deleted successfully".to_string(),
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/conversations/{conversation_id}",
        get(get_conversation).delete(delete_conversation),
    )
}
