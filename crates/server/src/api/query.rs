//! Non-streamed query endpoint and the helpers both query endpoints share.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

use agentgate_agent::{Agent, AgentSession};
use agentgate_core::{
    validate_attachments_metadata, Config, CoreError, QueryRequest, TranscriptRecord, TurnSummary,
};
use agentgate_llm::types::{content_to_string, Model, Turn};

use crate::auth::AuthTuple;
use crate::error::{ApiError, ErrorResponse};
use crate::state::AppState;

/// Name given to every upstream session opened for a conversation.
pub const SESSION_NAME: &str = "chat_session";

#[derive(Debug, Serialize, ToSchema)]
pub struct QueryResponse {
    pub conversation_id: String,
    pub response: String,
}

/// Pick the model that will serve the query.
///
/// Without hints the first LLM the upstream lists wins. With a model and
/// provider given, that exact pair must be registered upstream.
pub fn select_model_id(models: &[Model], request: &QueryRequest) -> Result<(String, String), ApiError> {
    match (&request.model, &request.provider) {
        (Some(model), Some(provider)) => {
            if models
                .iter()
                .any(|m| &m.identifier == model && &m.provider_id == provider)
            {
                Ok((model.clone(), provider.clone()))
            } else {
                Err(ApiError::BadRequest(format!(
                    "Model {} from provider {} not found in available models",
                    model, provider
                )))
            }
        }
        _ => models
            .iter()
            .find(|m| m.is_llm())
            .map(|m| (m.identifier.clone(), m.provider_id.clone()))
            .ok_or_else(|| {
                ApiError::BadRequest("No LLM model found in available models".to_string())
            }),
    }
}

pub fn retrieve_conversation_id(request: &QueryRequest) -> String {
    request
        .conversation_id
        .clone()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

pub fn is_transcripts_enabled(config: &Config) -> bool {
    config.user_data.transcripts_enabled()
}

/// Persist a finished turn if transcript collection is on.
///
/// Returns the written file, or `None` when collection is disabled.
pub async fn store_transcript(
    state: &AppState,
    turn: &TurnSummary<'_>,
) -> Result<Option<PathBuf>, CoreError> {
    let store = match (&state.transcripts, is_transcripts_enabled(&state.config)) {
        (Some(store), true) => store,
        _ => {
            debug!("Transcript collection is disabled in the configuration");
            return Ok(None);
        }
    };
    let record = TranscriptRecord::from_turn(turn);
    store.store(&record).await.map(Some)
}

/// Open the upstream session a query runs in.
///
/// A conversation id seen before continues its session. Otherwise a fresh
/// agent is registered with every available input shield and the system
/// prompt, and a new session is opened on it.
pub async fn open_session(
    state: &AppState,
    model_id: &str,
    request: &QueryRequest,
    conversation_id: &str,
) -> Result<AgentSession, ApiError> {
    if let Some(ids) = state.conversations.get(conversation_id) {
        validate_attachments_metadata(request.attachments())?;
        debug!(
            conversation_id = %conversation_id,
            session_id = %ids.session_id,
            "continuing conversation"
        );
        return Ok(AgentSession::resume(
            state.client.clone(),
            ids.agent_id,
            ids.session_id,
        ));
    }

    let shields: Vec<String> = state
        .client
        .list_shields()
        .await?
        .into_iter()
        .map(|s| s.identifier)
        .collect();
    if shields.is_empty() {
        info!("No available shields. Disabling safety");
    } else {
        info!("Available shields found: {:?}", shields);
    }

    let system_prompt = request
        .system_prompt
        .as_deref()
        .filter(|p| !p.is_empty())
        .unwrap_or(state.config.customization.default_system_prompt.as_str());
    debug!("Using system prompt: {}", system_prompt);

    validate_attachments_metadata(request.attachments())?;

    let mut agent =
        Agent::new(state.client.clone(), model_id, system_prompt).with_input_shields(shields);
    let session = agent.create_session(SESSION_NAME).await?;
    state.conversations.insert(conversation_id, session.ids().clone());
    Ok(session)
}

async fn run_turn(
    state: &AppState,
    model_id: &str,
    request: &QueryRequest,
    conversation_id: &str,
) -> Result<Turn, ApiError> {
    let session = open_session(state, model_id, request, conversation_id).await?;
    let turn = session
        .create_turn(&request.query, request.get_documents())
        .await?;
    Ok(turn)
}

/// Answer a query with a single, non-streamed turn
#[utoipa::path(
    post,
    path = "/v1/query",
    tag = "Query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Model answer", body = QueryResponse),
        (status = 400, description = "Model selection failed", body = ErrorResponse),
        (status = 422, description = "Invalid request or attachment", body = ErrorResponse),
        (status = 500, description = "Upstream unreachable", body = ErrorResponse)
    )
)]
pub async fn query(
    State(state): State<Arc<AppState>>,
    auth: AuthTuple,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    request.validate()?;

    let models = state.client.list_models().await?;
    let (model_id, provider_id) = select_model_id(&models, &request)?;
    let conversation_id = retrieve_conversation_id(&request);

    state.metrics.record_llm_call(&provider_id, &model_id);
    let turn = match run_turn(&state, &model_id, &request, &conversation_id).await {
        Ok(turn) => turn,
        Err(e) => {
            if matches!(e, ApiError::Upstream(_)) {
                state.metrics.record_llm_failure(&provider_id, &model_id);
            }
            return Err(e);
        }
    };
    let response = content_to_string(&turn.output_message.content);

    store_transcript(
        &state,
        &TurnSummary {
            user_id: &auth.user_id,
            conversation_id: &conversation_id,
            model_id: &model_id,
            provider_id: Some(&provider_id),
            query_is_valid: true,
            query: &request.query,
            query_request: &request,
            response: &response,
            rag_chunks: Vec::new(),
            truncated: false,
        },
    )
    .await?;

    Ok(Json(QueryResponse {
        conversation_id,
        response,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/query", post(query))
}
