//! Wire types of the upstream agent API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use agentgate_core::Document;

/// `{"data": [...]}` envelope used by the list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub identifier: String,
    pub provider_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_resource_id: Option<String>,
    /// `"llm"` or `"embedding"`.
    #[serde(default = "default_model_type")]
    pub model_type: String,
    #[serde(default)]
    pub metadata: Value,
}

fn default_model_type() -> String {
    "llm".to_string()
}

impl Model {
    pub fn is_llm(&self) -> bool {
        self.model_type == "llm"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shield {
    pub identifier: String,
    #[serde(default)]
    pub provider_id: String,
    #[serde(default)]
    pub params: Value,
}

/// Agent definition sent on creation.
#[derive(Debug, Clone, Serialize)]
pub struct AgentConfig {
    pub model: String,
    pub instructions: String,
    pub input_shields: Vec<String>,
    pub output_shields: Vec<String>,
    pub toolgroups: Vec<Value>,
    pub client_tools: Vec<Value>,
    pub enable_session_persistence: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMessage {
    pub role: String,
    pub content: String,
}

impl UserMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Input of one turn; the client decides whether it is streamed.
#[derive(Debug, Clone, Default)]
pub struct TurnRequest {
    pub messages: Vec<UserMessage>,
    pub documents: Vec<Document>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Turn {
    #[serde(default)]
    pub turn_id: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub input_messages: Vec<InputMessage>,
    #[serde(default)]
    pub output_message: CompletionMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    #[serde(default)]
    pub session_name: String,
    #[serde(default)]
    pub turns: Vec<Turn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
}

// ── Streaming ─────────────────────────────────────────────────

/// One `data:` payload of a streamed turn.
#[derive(Debug, Clone, Deserialize)]
pub struct TurnResponseStreamChunk {
    pub event: TurnResponseEvent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TurnResponseEvent {
    #[serde(default)]
    pub payload: Option<TurnEventPayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum TurnEventPayload {
    TurnStart {
        #[serde(default)]
        turn_id: String,
    },
    StepStart {
        #[serde(default)]
        step_type: String,
        #[serde(default)]
        step_id: String,
    },
    StepProgress {
        #[serde(default)]
        step_type: String,
        #[serde(default)]
        step_id: String,
        delta: ContentDelta,
    },
    StepComplete {
        #[serde(default)]
        step_type: String,
        #[serde(default)]
        step_id: String,
    },
    TurnComplete {
        #[serde(default)]
        turn: Option<Turn>,
    },
    TurnAwaitingInput {
        #[serde(default)]
        turn: Option<Turn>,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentDelta {
    Text {
        #[serde(default)]
        text: Option<String>,
    },
    ToolCall {
        #[serde(default)]
        tool_call: Value,
        #[serde(default)]
        parse_status: Option<String>,
    },
    Image {
        #[serde(default)]
        image: Value,
    },
    #[serde(other)]
    Unknown,
}

impl TurnResponseStreamChunk {
    /// Text of a `step_progress` text delta; `None` for every other event.
    pub fn text_delta(&self) -> Option<&str> {
        match &self.event.payload {
            Some(TurnEventPayload::StepProgress {
                delta: ContentDelta::Text { text: Some(text) },
                ..
            }) => Some(text),
            _ => None,
        }
    }
}

/// Flatten interleaved message content (string, text item, or list of items).
pub fn content_to_string(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(content_to_string).collect(),
        Value::Object(obj) => obj
            .get("text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default(),
        _ => String::new(),
    }
}
