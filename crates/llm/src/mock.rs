//! In-process [`AgentClient`] with scripted answers, for tests of dependent crates.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::provider::{AgentClient, LlmError, TurnStream};
use crate::types::{
    AgentConfig, CompletionMessage, InputMessage, Model, Session, Shield, Turn, TurnRequest,
    TurnResponseStreamChunk,
};

/// Scripted upstream: fixed models and shields, a canned streamed turn, and
/// a record of every agent, session and turn it was asked to create.
#[derive(Default)]
pub struct MockAgentClient {
    pub models: Vec<Model>,
    pub shields: Vec<Shield>,
    /// Raw chunk payloads replayed by `create_turn_stream`; `Err` entries become stream errors.
    pub stream: Vec<Result<Value, String>>,
    /// Output text of non-streamed turns.
    pub answer: String,
    /// Make `list_models` fail with a connection-style error.
    pub unreachable: bool,
    /// Make `list_shields` fail with a server error.
    pub shields_failing: bool,
    pub agents: Mutex<Vec<AgentConfig>>,
    pub turns: Mutex<Vec<(String, String, TurnRequest)>>,
    sessions: Mutex<HashMap<(String, String), Session>>,
}

impl MockAgentClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, identifier: &str, provider_id: &str, model_type: &str) -> Self {
        self.models.push(Model {
            identifier: identifier.to_string(),
            provider_id: provider_id.to_string(),
            provider_resource_id: None,
            model_type: model_type.to_string(),
            metadata: Value::Null,
        });
        self
    }

    pub fn with_shield(mut self, identifier: &str) -> Self {
        self.shields.push(Shield {
            identifier: identifier.to_string(),
            provider_id: "llama-guard".to_string(),
            params: Value::Null,
        });
        self
    }

    /// Stream these text deltas, each wrapped in a `step_progress` event.
    pub fn with_tokens(mut self, tokens: &[&str]) -> Self {
        self.stream.extend(tokens.iter().map(|t| Ok(text_progress(t))));
        self
    }

    pub fn with_chunk(mut self, chunk: Value) -> Self {
        self.stream.push(Ok(chunk));
        self
    }

    pub fn with_stream_error(mut self, message: &str) -> Self {
        self.stream.push(Err(message.to_string()));
        self
    }

    pub fn with_answer(mut self, answer: &str) -> Self {
        self.answer = answer.to_string();
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn failing_shields(mut self) -> Self {
        self.shields_failing = true;
        self
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    fn record_turn(&self, agent_id: &str, session_id: &str, request: &TurnRequest, answer: String) {
        self.turns
            .lock()
            .unwrap()
            .push((agent_id.to_string(), session_id.to_string(), request.clone()));

        let mut sessions = self.sessions.lock().unwrap();
        if let Some(session) = sessions.get_mut(&(agent_id.to_string(), session_id.to_string())) {
            session.turns.push(Turn {
                turn_id: format!("turn-{}", session.turns.len()),
                session_id: session_id.to_string(),
                input_messages: request
                    .messages
                    .iter()
                    .map(|m| InputMessage {
                        role: m.role.clone(),
                        content: Value::String(m.content.clone()),
                    })
                    .collect(),
                output_message: CompletionMessage {
                    role: "assistant".to_string(),
                    content: Value::String(answer),
                    stop_reason: Some("end_of_turn".to_string()),
                },
                started_at: Some("2025-01-01T00:00:00Z".to_string()),
                completed_at: Some("2025-01-01T00:00:01Z".to_string()),
            });
        }
    }
}

/// A `step_progress` chunk carrying one text delta.
pub fn text_progress(text: &str) -> Value {
    json!({
        "event": {"payload": {
            "event_type": "step_progress",
            "step_type": "inference",
            "step_id": "step-0",
            "delta": {"type": "text", "text": text}
        }}
    })
}

fn not_found(what: &str) -> LlmError {
    LlmError::ApiError {
        status: 404,
        body: format!("{} not found", what),
    }
}

#[async_trait]
impl AgentClient for MockAgentClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn list_models(&self) -> Result<Vec<Model>, LlmError> {
        if self.unreachable {
            return Err(LlmError::StreamError("connection refused".into()));
        }
        Ok(self.models.clone())
    }

    async fn list_shields(&self) -> Result<Vec<Shield>, LlmError> {
        if self.shields_failing {
            return Err(LlmError::ApiError {
                status: 500,
                body: "shield registry unavailable".into(),
            });
        }
        Ok(self.shields.clone())
    }

    async fn create_agent(&self, config: &AgentConfig) -> Result<String, LlmError> {
        let mut agents = self.agents.lock().unwrap();
        agents.push(config.clone());
        Ok(format!("agent-{}", agents.len()))
    }

    async fn create_session(&self, agent_id: &str, session_name: &str) -> Result<String, LlmError> {
        let mut sessions = self.sessions.lock().unwrap();
        let session_id = format!("session-{}", sessions.len() + 1);
        sessions.insert(
            (agent_id.to_string(), session_id.clone()),
            Session {
                session_id: session_id.clone(),
                session_name: session_name.to_string(),
                turns: Vec::new(),
                started_at: Some("2025-01-01T00:00:00Z".to_string()),
            },
        );
        Ok(session_id)
    }

    async fn create_turn(
        &self,
        agent_id: &str,
        session_id: &str,
        request: &TurnRequest,
    ) -> Result<Turn, LlmError> {
        self.record_turn(agent_id, session_id, request, self.answer.clone());
        let sessions = self.sessions.lock().unwrap();
        sessions
            .get(&(agent_id.to_string(), session_id.to_string()))
            .and_then(|s| s.turns.last().cloned())
            .ok_or_else(|| not_found("session"))
    }

    async fn create_turn_stream(
        &self,
        agent_id: &str,
        session_id: &str,
        request: &TurnRequest,
    ) -> Result<TurnStream, LlmError> {
        let items: Vec<Result<TurnResponseStreamChunk, LlmError>> = self
            .stream
            .iter()
            .map(|item| match item {
                Ok(value) => serde_json::from_value(value.clone())
                    .map_err(|e| LlmError::ParseError(e.to_string())),
                Err(message) => Err(LlmError::StreamError(message.clone())),
            })
            .collect();

        let answer: String = items
            .iter()
            .filter_map(|c| c.as_ref().ok().and_then(|c| c.text_delta()))
            .collect();
        self.record_turn(agent_id, session_id, request, answer);

        Ok(Box::pin(futures::stream::iter(items)))
    }

    async fn get_session(&self, agent_id: &str, session_id: &str) -> Result<Session, LlmError> {
        self.sessions
            .lock()
            .unwrap()
            .get(&(agent_id.to_string(), session_id.to_string()))
            .cloned()
            .ok_or_else(|| not_found("session"))
    }

    async fn delete_session(&self, agent_id: &str, session_id: &str) -> Result<(), LlmError> {
        self.sessions
            .lock()
            .unwrap()
            .remove(&(agent_id.to_string(), session_id.to_string()))
            .map(|_| ())
            .ok_or_else(|| not_found("session"))
    }
}
