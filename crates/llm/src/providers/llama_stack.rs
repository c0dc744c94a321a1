//! HTTP implementation of [`AgentClient`] for Llama-Stack-compatible agent services.
//!
//! Turns are requested with `stream: true` and arrive as SSE `data:` lines,
//! each holding one [`TurnResponseStreamChunk`](crate::types::TurnResponseStreamChunk).

mod sse;
mod streaming;

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use crate::provider::{AgentClient, LlmError, TurnStream};
use crate::types::{AgentConfig, ListResponse, Model, Session, Shield, Turn, TurnRequest};

pub struct LlamaStackClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl LlamaStackClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - service root, e.g. `"http://localhost:8321"`
    /// * `api_key` - optional bearer token
    /// * `timeout` - limit for non-streaming calls and for connecting
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, LlmError> {
        let response = builder.send().await?;
        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, body });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, LlmError> {
        debug!(url = %self.url(path), "upstream GET");
        let response = self
            .send(self.request(reqwest::Method::GET, path).timeout(self.timeout))
            .await?;
        response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, LlmError> {
        debug!(url = %self.url(path), "upstream POST");
        let response = self
            .send(
                self.request(reqwest::Method::POST, path)
                    .timeout(self.timeout)
                    .json(body),
            )
            .await?;
        response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))
    }
}

fn turn_body(request: &TurnRequest, stream: bool) -> Value {
    json!({
        "messages": request.messages,
        "documents": request.documents,
        "stream": stream,
    })
}

fn turn_path(agent_id: &str, session_id: &str) -> String {
    format!("/agents/{}/session/{}/turn", agent_id, session_id)
}

fn field(value: &Value, name: &str) -> Result<String, LlmError> {
    value[name]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| LlmError::ParseError(format!("missing {}", name)))
}

#[async_trait]
impl AgentClient for LlamaStackClient {
    fn provider_name(&self) -> &str {
        "llama-stack"
    }

    async fn list_models(&self) -> Result<Vec<Model>, LlmError> {
        let list: ListResponse<Model> = self.get_json("/models").await?;
        Ok(list.data)
    }

    async fn list_shields(&self) -> Result<Vec<Shield>, LlmError> {
        let list: ListResponse<Shield> = self.get_json("/shields").await?;
        Ok(list.data)
    }

    async fn create_agent(&self, config: &AgentConfig) -> Result<String, LlmError> {
        let resp: Value = self
            .post_json("/agents", &json!({ "agent_config": config }))
            .await?;
        field(&resp, "agent_id")
    }

    async fn create_session(&self, agent_id: &str, session_name: &str) -> Result<String, LlmError> {
        let resp: Value = self
            .post_json(
                &format!("/agents/{}/session", agent_id),
                &json!({ "session_name": session_name }),
            )
            .await?;
        field(&resp, "session_id")
    }

    async fn create_turn(
        &self,
        agent_id: &str,
        session_id: &str,
        request: &TurnRequest,
    ) -> Result<Turn, LlmError> {
        self.post_json(&turn_path(agent_id, session_id), &turn_body(request, false))
            .await
    }

    async fn create_turn_stream(
        &self,
        agent_id: &str,
        session_id: &str,
        request: &TurnRequest,
    ) -> Result<TurnStream, LlmError> {
        let path = turn_path(agent_id, session_id);
        debug!(url = %self.url(&path), "starting streamed turn");

        let response = self
            .send(
                self.request(reqwest::Method::POST, &path)
                    .header("Accept", "text/event-stream")
                    .json(&turn_body(request, true)),
            )
            .await?;

        Ok(streaming::turn_stream(response.bytes_stream()))
    }

    async fn get_session(&self, agent_id: &str, session_id: &str) -> Result<Session, LlmError> {
        self.get_json(&format!("/agents/{}/session/{}", agent_id, session_id))
            .await
    }

    async fn delete_session(&self, agent_id: &str, session_id: &str) -> Result<(), LlmError> {
        let path = format!("/agents/{}/session/{}", agent_id, session_id);
        debug!(url = %self.url(&path), "upstream DELETE");
        self.send(
            self.request(reqwest::Method::DELETE, &path)
                .timeout(self.timeout),
        )
        .await?;
        Ok(())
    }
}
