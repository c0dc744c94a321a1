//! Streaming query endpoint: relays an upstream agent turn as SSE.
//!
//! Every frame is one JSON object `{"event": ..., "data": ...}`. The stream
//! opens with `start`, carries one `token` per text delta and closes with
//! `end`. An upstream failure mid-turn closes the stream without `end`.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::routing::post;
use axum::{Json, Router};
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use agentgate_core::{QueryRequest, TurnSummary};
use agentgate_llm::TurnStream;

use crate::auth::AuthTuple;
use crate::error::{ApiError, ErrorResponse};
use crate::state::AppState;

use super::query::{open_session, retrieve_conversation_id, select_model_id, store_transcript};

/// Frames buffered between the relay task and the response body.
const CHANNEL_CAPACITY: usize = 64;

pub fn format_stream_data(value: &Value) -> Event {
    Event::default().data(value.to_string())
}

pub fn stream_start_event(conversation_id: &str) -> Event {
    format_stream_data(&json!({
        "event": "start",
        "data": { "conversation_id": conversation_id },
    }))
}

pub fn stream_token_event(id: u64, token: &str) -> Event {
    format_stream_data(&json!({
        "event": "token",
        "data": { "id": id, "token": token },
    }))
}

/// Closing frame. Document references, truncation and token counts are not
/// tracked yet and are reported as placeholders.
pub fn stream_end_event() -> Event {
    format_stream_data(&json!({
        "event": "end",
        "data": {
            "referenced_documents": null,
            "truncated": null,
            "input_tokens": 0,
            "output_tokens": 0,
        },
        "available_quotas": {},
    }))
}

/// Open the upstream session and start a streamed turn for the query.
pub async fn retrieve_response(
    state: &AppState,
    model_id: &str,
    request: &QueryRequest,
    conversation_id: &str,
) -> Result<TurnStream, ApiError> {
    let session = open_session(state, model_id, request, conversation_id).await?;
    let turn = session
        .create_turn_stream(&request.query, request.get_documents())
        .await?;
    Ok(turn)
}

/// Everything the relay task needs once the handler has returned.
struct RelayContext {
    auth: AuthTuple,
    request: QueryRequest,
    conversation_id: String,
    model_id: String,
    provider_id: String,
}

/// Forward upstream text deltas to the client, then write the transcript.
///
/// The sender is held until the transcript is written, so the response body
/// ends only after that.
async fn relay_turn(state: Arc<AppState>, mut turn: TurnStream, tx: mpsc::Sender<Event>, ctx: RelayContext) {
    if tx.send(stream_start_event(&ctx.conversation_id)).await.is_err() {
        debug!(conversation_id = %ctx.conversation_id, "client went away before start");
        return;
    }

    let mut next_id: u64 = 0;
    let mut complete_response = String::new();

    while let Some(chunk) = turn.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(
                    conversation_id = %ctx.conversation_id,
                    error = %e,
                    "upstream turn failed mid-stream"
                );
                state
                    .metrics
                    .record_llm_failure(&ctx.provider_id, &ctx.model_id);
                return;
            }
        };
        let Some(text) = chunk.text_delta() else {
            continue;
        };
        if tx.send(stream_token_event(next_id, text)).await.is_err() {
            info!(
                conversation_id = %ctx.conversation_id,
                tokens = next_id,
                "client disconnected, abandoning turn"
            );
            return;
        }
        next_id += 1;
        complete_response.push_str(text);
    }

    if tx.send(stream_end_event()).await.is_err() {
        debug!(conversation_id = %ctx.conversation_id, "client went away before end");
        return;
    }

    let summary = TurnSummary {
        user_id: &ctx.auth.user_id,
        conversation_id: &ctx.conversation_id,
        model_id: &ctx.model_id,
        provider_id: Some(&ctx.provider_id),
        query_is_valid: true,
        query: &ctx.request.query,
        query_request: &ctx.request,
        response: &complete_response,
        rag_chunks: Vec::new(),
        truncated: false,
    };
    if let Err(e) = store_transcript(&state, &summary).await {
        warn!(conversation_id = %ctx.conversation_id, error = %e, "failed to store transcript");
    }
    drop(tx);
}

/// Answer a query as a stream of server-sent events
///
/// Frames: `start` with the conversation id, one `token` per text delta
/// (ids count up from 0), then `end` with placeholder statistics.
#[utoipa::path(
    post,
    path = "/v1/streaming_query",
    tag = "Query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "SSE stream of start, token and end events", content_type = "text/event-stream"),
        (status = 400, description = "Model selection failed", body = ErrorResponse),
        (status = 422, description = "Invalid request or attachment", body = ErrorResponse),
        (status = 500, description = "Upstream unreachable", body = ErrorResponse)
    )
)]
pub async fn streaming_query_endpoint_handler(
    State(state): State<Arc<AppState>>,
    auth: AuthTuple,
    Json(request): Json<QueryRequest>,
) -> Result<Sse<impl futures::Stream<Item = Result<Event, Infallible>>>, ApiError> {
    request.validate()?;

    let models = state.client.list_models().await?;
    let (model_id, provider_id) = select_model_id(&models, &request)?;
    let conversation_id = retrieve_conversation_id(&request);
    info!(
        conversation_id = %conversation_id,
        model = %model_id,
        provider = %provider_id,
        "streaming query"
    );

    state.metrics.record_llm_call(&provider_id, &model_id);
    let turn = match retrieve_response(&state, &model_id, &request, &conversation_id).await {
        Ok(turn) => turn,
        Err(e) => {
            if matches!(e, ApiError::Upstream(_)) {
                state.metrics.record_llm_failure(&provider_id, &model_id);
            }
            return Err(e);
        }
    };

    let (tx, rx) = mpsc::channel::<Event>(CHANNEL_CAPACITY);
    let ctx = RelayContext {
        auth,
        request,
        conversation_id,
        model_id,
        provider_id,
    };
    tokio::spawn(relay_turn(state.clone(), turn, tx, ctx));

    Ok(Sse::new(ReceiverStream::new(rx).map(Ok)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/streaming_query", post(streaming_query_endpoint_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentgate_core::Config;
    use agentgate_llm::mock::{text_progress, MockAgentClient};
    use agentgate_llm::types::TurnResponseStreamChunk;
    use agentgate_llm::{AgentClient, LlmError};

    use crate::auth::DEFAULT_USER_ID;
    use crate::startup::build_app_state;

    fn text_chunk(text: &str) -> TurnResponseStreamChunk {
        serde_json::from_value(text_progress(text)).unwrap()
    }

    fn relay_context(conversation_id: &str) -> RelayContext {
        RelayContext {
            auth: AuthTuple {
                user_id: DEFAULT_USER_ID.to_string(),
                username: "tester".to_string(),
            },
            request: QueryRequest {
                query: "hi".to_string(),
                ..Default::default()
            },
            conversation_id: conversation_id.to_string(),
            model_id: "llama3".to_string(),
            provider_id: "ollama".to_string(),
        }
    }

    #[tokio::test]
    async fn test_relay_stops_when_client_disconnects() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.user_data.transcripts_disabled = false;
        config.user_data.transcripts_storage = Some(dir.path().to_path_buf());
        let client: Arc<dyn AgentClient> = Arc::new(MockAgentClient::new());
        let state = build_app_state(config, client).unwrap();

        let (upstream_tx, upstream_rx) = mpsc::channel::<Result<TurnResponseStreamChunk, LlmError>>(4);
        let turn: TurnStream = Box::pin(ReceiverStream::new(upstream_rx));
        let (tx, mut rx) = mpsc::channel::<Event>(CHANNEL_CAPACITY);

        let relay = tokio::spawn(relay_turn(state, turn, tx, relay_context("c-gone")));

        // Only the start frame can be out before upstream produces anything.
        assert!(rx.recv().await.is_some());
        drop(rx);

        upstream_tx.send(Ok(text_chunk("Hello"))).await.unwrap();
        relay.await.unwrap();

        // The relay returned while upstream was still open: it stopped
        // reading the turn, never reached the end frame and wrote nothing.
        assert!(upstream_tx.is_closed());
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_relay_sends_end_and_transcript_when_client_stays() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.user_data.transcripts_disabled = false;
        config.user_data.transcripts_storage = Some(dir.path().to_path_buf());
        let client: Arc<dyn AgentClient> = Arc::new(MockAgentClient::new());
        let state = build_app_state(config, client).unwrap();

        let (upstream_tx, upstream_rx) = mpsc::channel::<Result<TurnResponseStreamChunk, LlmError>>(4);
        let turn: TurnStream = Box::pin(ReceiverStream::new(upstream_rx));
        let (tx, mut rx) = mpsc::channel::<Event>(CHANNEL_CAPACITY);

        let relay = tokio::spawn(relay_turn(state, turn, tx, relay_context("c-here")));
        upstream_tx.send(Ok(text_chunk("Hello"))).await.unwrap();
        drop(upstream_tx);

        let mut frames = 0;
        while rx.recv().await.is_some() {
            frames += 1;
        }
        relay.await.unwrap();

        // start, one token, end
        assert_eq!(frames, 3);
        let conversation_dir = dir.path().join(DEFAULT_USER_ID).join("c-here");
        assert_eq!(std::fs::read_dir(conversation_dir).unwrap().count(), 1);
    }
}
