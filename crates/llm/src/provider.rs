use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::types::{AgentConfig, Model, Session, Shield, Turn, TurnRequest, TurnResponseStreamChunk};

/// Chunks of a streamed turn, in upstream order.
pub type TurnStream = Pin<Box<dyn Stream<Item = Result<TurnResponseStreamChunk, LlmError>> + Send>>;

/// Client of the remote agent service. Each backend implements this.
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Short backend name used in logs and metrics.
    fn provider_name(&self) -> &str;

    async fn list_models(&self) -> Result<Vec<Model>, LlmError>;

    async fn list_shields(&self) -> Result<Vec<Shield>, LlmError>;

    /// Register an agent and return its id.
    async fn create_agent(&self, config: &AgentConfig) -> Result<String, LlmError>;

    /// Open a session on an agent and return its id.
    async fn create_session(&self, agent_id: &str, session_name: &str) -> Result<String, LlmError>;

    /// Run a turn to completion.
    async fn create_turn(
        &self,
        agent_id: &str,
        session_id: &str,
        request: &TurnRequest,
    ) -> Result<Turn, LlmError>;

    /// Run a turn and stream its events as they are produced.
    async fn create_turn_stream(
        &self,
        agent_id: &str,
        session_id: &str,
        request: &TurnRequest,
    ) -> Result<TurnStream, LlmError>;

    async fn get_session(&self, agent_id: &str, session_id: &str) -> Result<Session, LlmError>;

    async fn delete_session(&self, agent_id: &str, session_id: &str) -> Result<(), LlmError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error {status}: {body}")]
    ApiError { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    ParseError(String),
    #[error("stream error: {0}")]
    StreamError(String),
    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

impl LlmError {
    /// True when the upstream reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LlmError::ApiError { status: 404, .. })
    }
}
